// src/ingest/providers/openweather.rs
use async_trait::async_trait;
use reqwest::Client;

use crate::error::{UpstreamError, UpstreamStatus};
use crate::ingest::http::send_json;
use crate::ingest::types::{RawRecord, SourceAdapter, SourceKind, SourceQuery};

const NAME: &str = "openweather";

/// Current weather at a point (metric units). One record per call.
pub struct OpenWeatherProvider {
    api_key: String,
    client: Client,
    base: String,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, client: Client) -> Self {
        Self {
            api_key,
            client,
            base: "https://api.openweathermap.org".to_string(),
        }
    }

    pub fn with_base_url(mut self, base: &str) -> Self {
        self.base = base.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl SourceAdapter for OpenWeatherProvider {
    async fn fetch(&self, query: &SourceQuery) -> Result<Vec<RawRecord>, UpstreamError> {
        let Some(loc) = query.location else {
            return Err(UpstreamError::new(
                NAME,
                UpstreamStatus::InvalidRequest,
                "weather lookup needs a location",
            ));
        };
        if query.max_results == 0 {
            return Ok(Vec::new());
        }

        let lat = loc.lat.to_string();
        let lon = loc.lon.to_string();
        let req = self
            .client
            .get(format!("{}/data/2.5/weather", self.base))
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ]);
        let body = send_json(NAME, req).await?;
        Ok(vec![RawRecord::new(SourceKind::WeatherSnapshot, body)])
    }

    fn name(&self) -> &'static str {
        NAME
    }

    fn kind(&self) -> SourceKind {
        SourceKind::WeatherSnapshot
    }
}
