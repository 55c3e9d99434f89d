// src/ingest/providers/x.rs
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, SecondsFormat, Utc};
use reqwest::Client;
use serde_json::Value;

use crate::error::UpstreamError;
use crate::ingest::http::{array_at, send_json};
use crate::ingest::normalize::lookup;
use crate::ingest::types::{RawRecord, SourceAdapter, SourceKind, SourceQuery};

const NAME: &str = "x";
const MIN_PAGE: usize = 10;
const MAX_PAGE: usize = 100;

/// X (Twitter) v2 recent search.
pub struct XProvider {
    bearer_token: String,
    client: Client,
    base: String,
}

impl XProvider {
    pub fn new(bearer_token: String, client: Client) -> Self {
        Self {
            bearer_token,
            client,
            base: "https://api.twitter.com".to_string(),
        }
    }

    pub fn with_base_url(mut self, base: &str) -> Self {
        self.base = base.trim_end_matches('/').to_string();
        self
    }
}

/// Tweets on the page and the `meta.next_token` cursor.
pub fn parse_search_page(body: &Value) -> (Vec<Value>, Option<String>) {
    let tweets = array_at(body, "data");
    let next = lookup(body, "meta.next_token")
        .and_then(Value::as_str)
        .map(str::to_string);
    (tweets, next)
}

fn rfc3339(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[async_trait]
impl SourceAdapter for XProvider {
    async fn fetch(&self, query: &SourceQuery) -> Result<Vec<RawRecord>, UpstreamError> {
        let mut out = Vec::new();

        // Recent search rejects an end_time closer than 10s to now.
        let latest_end = Utc::now() - ChronoDuration::seconds(10);
        let (start_time, end_time) = match query.window {
            Some(w) => (Some(rfc3339(w.start())), Some(rfc3339(w.end().min(latest_end)))),
            None => (None, None),
        };

        'keywords: for keyword in &query.keywords {
            let mut next_token: Option<String> = None;
            loop {
                let remaining = query.max_results.saturating_sub(out.len());
                if remaining == 0 {
                    break 'keywords;
                }
                let page = remaining.clamp(MIN_PAGE, MAX_PAGE).to_string();
                let mut params: Vec<(&str, &str)> = vec![
                    ("query", keyword.as_str()),
                    ("max_results", page.as_str()),
                    ("tweet.fields", "created_at,author_id,text,lang"),
                ];
                if let Some(s) = start_time.as_deref() {
                    params.push(("start_time", s));
                }
                if let Some(e) = end_time.as_deref() {
                    params.push(("end_time", e));
                }
                if let Some(t) = next_token.as_deref() {
                    params.push(("next_token", t));
                }

                let req = self
                    .client
                    .get(format!("{}/2/tweets/search/recent", self.base))
                    .bearer_auth(&self.bearer_token)
                    .query(&params);
                let body = send_json(NAME, req).await?;
                let (tweets, next) = parse_search_page(&body);
                tracing::debug!(keyword = %keyword, page = tweets.len(), "x page");

                let page_len = tweets.len();
                out.extend(
                    tweets
                        .into_iter()
                        .take(remaining)
                        .map(|t| RawRecord::new(SourceKind::Social, t)),
                );

                match next {
                    Some(t) if page_len > 0 => next_token = Some(t),
                    _ => break,
                }
            }
        }

        Ok(out)
    }

    fn name(&self) -> &'static str {
        NAME
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Social
    }
}
