// src/ingest/providers/astronomy.rs
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde_json::Value;

use crate::error::{UpstreamError, UpstreamStatus};
use crate::ingest::http::{array_at, send_json};
use crate::ingest::types::{RawRecord, SourceAdapter, SourceKind, SourceQuery};

const NAME: &str = "astronomy";

#[derive(Debug, Clone)]
pub struct AstronomyCredentials {
    pub application_id: String,
    pub application_secret: String,
}

/// AstronomyAPI body positions for the moon at a point.
pub struct AstronomyProvider {
    creds: AstronomyCredentials,
    client: Client,
    base: String,
}

impl AstronomyProvider {
    pub fn new(creds: AstronomyCredentials, client: Client) -> Self {
        Self {
            creds,
            client,
            base: "https://api.astronomyapi.com".to_string(),
        }
    }

    pub fn with_base_url(mut self, base: &str) -> Self {
        self.base = base.trim_end_matches('/').to_string();
        self
    }
}

/// Every cell of every table row (one per body and date).
pub fn parse_positions(body: &Value) -> Vec<Value> {
    array_at(body, "data.table.rows")
        .into_iter()
        .flat_map(|row| array_at(&row, "cells"))
        .collect()
}

#[async_trait]
impl SourceAdapter for AstronomyProvider {
    async fn fetch(&self, query: &SourceQuery) -> Result<Vec<RawRecord>, UpstreamError> {
        let Some(loc) = query.location else {
            return Err(UpstreamError::new(
                NAME,
                UpstreamStatus::InvalidRequest,
                "moon position lookup needs a location",
            ));
        };

        // Ask for the position at the current UTC time on the current UTC date.
        let now = Utc::now();
        let date = now.format("%Y-%m-%d").to_string();
        let time = now.format("%H:%M:%S").to_string();
        let lat = loc.lat.to_string();
        let lon = loc.lon.to_string();

        let req = self
            .client
            .get(format!("{}/api/v2/bodies/positions/moon", self.base))
            .basic_auth(&self.creds.application_id, Some(&self.creds.application_secret))
            .query(&[
                ("latitude", lat.as_str()),
                ("longitude", lon.as_str()),
                ("elevation", "0"),
                ("from_date", date.as_str()),
                ("to_date", date.as_str()),
                ("time", time.as_str()),
            ]);
        let body = send_json(NAME, req).await?;

        Ok(parse_positions(&body)
            .into_iter()
            .take(query.max_results)
            .map(|cell| RawRecord::new(SourceKind::MoonSnapshot, cell))
            .collect())
    }

    fn name(&self) -> &'static str {
        NAME
    }

    fn kind(&self) -> SourceKind {
        SourceKind::MoonSnapshot
    }
}
