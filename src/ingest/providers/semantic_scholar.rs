// src/ingest/providers/semantic_scholar.rs
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::error::UpstreamError;
use crate::ingest::http::{array_at, send_json};
use crate::ingest::types::{RawRecord, SourceAdapter, SourceKind, SourceQuery};

const NAME: &str = "semantic-scholar";
const PAGE_LIMIT: usize = 100;
const FIELDS: &str = "paperId,title,authors,abstract,year,venue,url,publicationDate,citationCount";

/// Semantic Scholar Graph API paper search.
pub struct SemanticScholarProvider {
    api_key: Option<String>,
    client: Client,
    base: String,
}

impl SemanticScholarProvider {
    /// The API works without a key at a lower rate limit.
    pub fn new(api_key: Option<String>, client: Client) -> Self {
        Self {
            api_key,
            client,
            base: "https://api.semanticscholar.org".to_string(),
        }
    }

    pub fn with_base_url(mut self, base: &str) -> Self {
        self.base = base.trim_end_matches('/').to_string();
        self
    }
}

/// Papers on the page and the `next` offset, if the API reports one.
pub fn parse_search_page(body: &Value) -> (Vec<Value>, Option<u64>) {
    let papers = array_at(body, "data");
    let next = body.get("next").and_then(Value::as_u64);
    (papers, next)
}

#[async_trait]
impl SourceAdapter for SemanticScholarProvider {
    async fn fetch(&self, query: &SourceQuery) -> Result<Vec<RawRecord>, UpstreamError> {
        let mut out = Vec::new();
        let date_range = query.window.map(|w| {
            format!(
                "{}:{}",
                w.start().format("%Y-%m-%d"),
                w.end().format("%Y-%m-%d")
            )
        });

        'keywords: for keyword in &query.keywords {
            let mut offset: u64 = 0;
            loop {
                let remaining = query.max_results.saturating_sub(out.len());
                if remaining == 0 {
                    break 'keywords;
                }
                let limit = remaining.min(PAGE_LIMIT).to_string();
                let offset_s = offset.to_string();
                let mut params: Vec<(&str, &str)> = vec![
                    ("query", keyword.as_str()),
                    ("fields", FIELDS),
                    ("offset", offset_s.as_str()),
                    ("limit", limit.as_str()),
                ];
                if let Some(range) = date_range.as_deref() {
                    params.push(("publicationDateOrYear", range));
                }

                let mut req = self
                    .client
                    .get(format!("{}/graph/v1/paper/search", self.base))
                    .query(&params);
                if let Some(key) = &self.api_key {
                    req = req.header("x-api-key", key);
                }
                let body = send_json(NAME, req).await?;
                let (papers, next) = parse_search_page(&body);
                tracing::debug!(keyword = %keyword, offset, page = papers.len(), "semantic scholar page");

                let page_len = papers.len();
                out.extend(
                    papers
                        .into_iter()
                        .take(remaining)
                        .map(|p| RawRecord::new(SourceKind::AcademicPaper, p)),
                );

                match next {
                    Some(n) if page_len > 0 && n > offset => offset = n,
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
        SourceKind::AcademicPaper
    }
}
