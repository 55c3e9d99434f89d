// src/ingest/providers/cinii.rs
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::error::UpstreamError;
use crate::ingest::http::{array_at, send_json};
use crate::ingest::types::{RawRecord, SourceAdapter, SourceKind, SourceQuery};

const NAME: &str = "cinii";
const PAGE_LIMIT: usize = 100;

/// CiNii OpenSearch (JSON format), paged with 1-based `start` + `count`.
pub struct CiniiProvider {
    app_id: String,
    client: Client,
    base: String,
}

impl CiniiProvider {
    pub fn new(app_id: String, client: Client) -> Self {
        Self {
            app_id,
            client,
            base: "https://ci.nii.ac.jp".to_string(),
        }
    }

    pub fn with_base_url(mut self, base: &str) -> Self {
        self.base = base.trim_end_matches('/').to_string();
        self
    }
}

fn as_count(v: &Value) -> Option<u64> {
    v.as_u64()
        .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
}

/// Items and `opensearch:totalResults`. Accepts both the flat shape and the
/// JSON-LD shape that wraps everything in `@graph[0]`.
pub fn parse_search_page(body: &Value) -> (Vec<Value>, Option<u64>) {
    let root = match body.get("@graph").and_then(|g| g.get(0)) {
        Some(inner) => inner,
        None => body,
    };
    let items = array_at(root, "items");
    let total = root.get("opensearch:totalResults").and_then(as_count);
    (items, total)
}

#[async_trait]
impl SourceAdapter for CiniiProvider {
    async fn fetch(&self, query: &SourceQuery) -> Result<Vec<RawRecord>, UpstreamError> {
        let mut out = Vec::new();

        'keywords: for keyword in &query.keywords {
            let mut start: u64 = 1;
            loop {
                let remaining = query.max_results.saturating_sub(out.len());
                if remaining == 0 {
                    break 'keywords;
                }
                let count = remaining.min(PAGE_LIMIT);
                let count_s = count.to_string();
                let start_s = start.to_string();
                let params: [(&str, &str); 6] = [
                    ("q", keyword.as_str()),
                    ("appid", self.app_id.as_str()),
                    ("format", "json"),
                    ("count", count_s.as_str()),
                    ("start", start_s.as_str()),
                    ("sortorder", "1"),
                ];

                let req = self
                    .client
                    .get(format!("{}/opensearch/search", self.base))
                    .query(&params);
                let body = send_json(NAME, req).await?;
                let (items, total) = parse_search_page(&body);
                tracing::debug!(keyword = %keyword, start, page = items.len(), "cinii page");

                let page_len = items.len() as u64;
                out.extend(
                    items
                        .into_iter()
                        .take(remaining)
                        .map(|i| RawRecord::new(SourceKind::AcademicPaper, i)),
                );

                start += page_len;
                let exhausted = match total {
                    Some(t) => start > t,
                    None => page_len < count as u64,
                };
                if page_len == 0 || exhausted {
                    break;
                }
            }
        }

        Ok(out)
    }

    fn name(&self) -> &'static str {
        NAME
    }

    fn kind(&self) -> SourceKind {
        SourceKind::AcademicPaper
    }
}
