// src/ingest/providers/tumblr.rs
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::error::UpstreamError;
use crate::ingest::http::{array_at, send_json};
use crate::ingest::types::{RawRecord, SourceAdapter, SourceKind, SourceQuery};

const NAME: &str = "tumblr";
const PAGE_LIMIT: usize = 20;

/// Tumblr tag search (`/v2/tagged`), paged backwards with `before`.
pub struct TumblrProvider {
    api_key: String,
    client: Client,
    base: String,
}

impl TumblrProvider {
    pub fn new(api_key: String, client: Client) -> Self {
        Self {
            api_key,
            client,
            base: "https://api.tumblr.com".to_string(),
        }
    }

    pub fn with_base_url(mut self, base: &str) -> Self {
        self.base = base.trim_end_matches('/').to_string();
        self
    }
}

/// Posts on the page and the oldest `timestamp` among them.
pub fn parse_tagged_page(body: &Value) -> (Vec<Value>, Option<i64>) {
    let posts = array_at(body, "response");
    let oldest = posts
        .iter()
        .filter_map(|p| p.get("timestamp").and_then(Value::as_i64))
        .min();
    (posts, oldest)
}

#[async_trait]
impl SourceAdapter for TumblrProvider {
    async fn fetch(&self, query: &SourceQuery) -> Result<Vec<RawRecord>, UpstreamError> {
        let mut out = Vec::new();
        let start_hint = query.window.map(|w| w.start().timestamp());

        'keywords: for keyword in &query.keywords {
            let mut before = query.window.map(|w| w.end().timestamp());
            loop {
                let remaining = query.max_results.saturating_sub(out.len());
                if remaining == 0 {
                    break 'keywords;
                }
                let limit = remaining.min(PAGE_LIMIT).to_string();
                let before_s = before.map(|b| b.to_string());
                let mut params: Vec<(&str, &str)> = vec![
                    ("tag", keyword.as_str()),
                    ("api_key", self.api_key.as_str()),
                    ("limit", limit.as_str()),
                ];
                if let Some(b) = before_s.as_deref() {
                    params.push(("before", b));
                }

                let req = self
                    .client
                    .get(format!("{}/v2/tagged", self.base))
                    .query(&params);
                let body = send_json(NAME, req).await?;
                let (posts, oldest) = parse_tagged_page(&body);
                tracing::debug!(keyword = %keyword, page = posts.len(), "tumblr page");

                if posts.is_empty() {
                    break;
                }
                out.extend(
                    posts
                        .into_iter()
                        .take(remaining)
                        .map(|p| RawRecord::new(SourceKind::TaggedBlog, p)),
                );

                // Stop when the cursor cannot move back or the page already
                // reaches past the start of the window.
                match (oldest, before) {
                    (Some(o), Some(b)) if o >= b => break,
                    (None, _) => break,
                    _ => {}
                }
                if let (Some(o), Some(s)) = (oldest, start_hint) {
                    if o < s {
                        break;
                    }
                }
                before = oldest;
            }
        }

        Ok(out)
    }

    fn name(&self) -> &'static str {
        NAME
    }

    fn kind(&self) -> SourceKind {
        SourceKind::TaggedBlog
    }
}
