// src/ingest/providers/reddit.rs
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::error::{UpstreamError, UpstreamStatus};
use crate::ingest::http::{array_at, send_json};
use crate::ingest::normalize::lookup;
use crate::ingest::types::{RawRecord, SourceAdapter, SourceKind, SourceQuery};

const NAME: &str = "reddit";
/// Reddit refuses page sizes above 100.
const PAGE_LIMIT: usize = 100;

#[derive(Debug, Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
}

/// Searches r/all through the OAuth API with an app-only token. Each post
/// carries its full comment thread as `comments: [{body, created_utc}]`.
pub struct RedditProvider {
    creds: RedditCredentials,
    client: Client,
    auth_base: String,
    api_base: String,
}

impl RedditProvider {
    pub fn new(creds: RedditCredentials, client: Client) -> Self {
        Self {
            creds,
            client,
            auth_base: "https://www.reddit.com".to_string(),
            api_base: "https://oauth.reddit.com".to_string(),
        }
    }

    /// Point both the token and the search endpoint at `base` (tests, proxies).
    pub fn with_base_url(mut self, base: &str) -> Self {
        let base = base.trim_end_matches('/').to_string();
        self.auth_base = base.clone();
        self.api_base = base;
        self
    }

    async fn access_token(&self) -> Result<String, UpstreamError> {
        let req = self
            .client
            .post(format!("{}/api/v1/access_token", self.auth_base))
            .basic_auth(&self.creds.client_id, Some(&self.creds.client_secret))
            .header(reqwest::header::USER_AGENT, &self.creds.user_agent)
            .form(&[("grant_type", "client_credentials")]);
        let body = send_json(NAME, req).await?;
        body.get("access_token")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                UpstreamError::new(NAME, UpstreamStatus::Decode, "token response without access_token")
            })
    }

    async fn comments_for(&self, token: &str, post_id: &str) -> Result<Vec<Value>, UpstreamError> {
        let req = self
            .client
            .get(format!("{}/comments/{post_id}", self.api_base))
            .bearer_auth(token)
            .header(reqwest::header::USER_AGENT, &self.creds.user_agent)
            .query(&[("raw_json", "1"), ("limit", "500")]);
        let body = send_json(NAME, req).await?;
        Ok(parse_comments(&body))
    }
}

/// Base36 post id for the comments endpoint: `id`, else `name` without `t3_`.
fn post_id(post: &Value) -> Option<String> {
    post.get("id")
        .and_then(Value::as_str)
        .or_else(|| {
            post.get("name")
                .and_then(Value::as_str)
                .map(|n| n.strip_prefix("t3_").unwrap_or(n))
        })
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// Every comment of a `/comments/{id}` response, depth first. The second
/// element of the response array is the comment listing; `more` stubs are skipped.
pub fn parse_comments(body: &Value) -> Vec<Value> {
    let mut out = Vec::new();
    if let Some(listing) = body.get(1) {
        collect_comments(listing, &mut out);
    }
    out
}

fn collect_comments(listing: &Value, out: &mut Vec<Value>) {
    for child in array_at(listing, "data.children") {
        if child.get("kind").and_then(Value::as_str) != Some("t1") {
            continue;
        }
        let Some(data) = child.get("data") else {
            continue;
        };
        out.push(json!({
            "body": data.get("body").cloned().unwrap_or(Value::Null),
            "created_utc": data.get("created_utc").cloned().unwrap_or(Value::Null),
        }));
        // empty reply sets come back as ""
        if let Some(replies) = data.get("replies").filter(|r| r.is_object()) {
            collect_comments(replies, out);
        }
    }
}

/// One listing page: the `data` objects of each child and the `after` cursor.
pub fn parse_listing(body: &Value) -> (Vec<Value>, Option<String>) {
    let posts = array_at(body, "data.children")
        .into_iter()
        .filter_map(|child| child.get("data").cloned())
        .collect();
    let after = lookup(body, "data.after")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    (posts, after)
}

#[async_trait]
impl SourceAdapter for RedditProvider {
    async fn fetch(&self, query: &SourceQuery) -> Result<Vec<RawRecord>, UpstreamError> {
        let token = self.access_token().await?;
        let mut out = Vec::new();

        'keywords: for keyword in &query.keywords {
            let mut after: Option<String> = None;
            loop {
                let remaining = query.max_results.saturating_sub(out.len());
                if remaining == 0 {
                    break 'keywords;
                }
                let limit = remaining.min(PAGE_LIMIT).to_string();
                let mut params: Vec<(&str, &str)> = vec![
                    ("q", keyword.as_str()),
                    ("limit", limit.as_str()),
                    ("sort", "new"),
                    ("t", "week"),
                    ("raw_json", "1"),
                ];
                if let Some(cursor) = after.as_deref() {
                    params.push(("after", cursor));
                }

                let req = self
                    .client
                    .get(format!("{}/r/all/search", self.api_base))
                    .bearer_auth(&token)
                    .header(reqwest::header::USER_AGENT, &self.creds.user_agent)
                    .query(&params);
                let body = send_json(NAME, req).await?;
                let (posts, next) = parse_listing(&body);
                tracing::debug!(keyword = %keyword, page = posts.len(), "reddit page");

                let page_len = posts.len();
                for mut post in posts.into_iter().take(remaining) {
                    if let Some(id) = post_id(&post) {
                        let comments = self.comments_for(&token, &id).await?;
                        if let Some(obj) = post.as_object_mut() {
                            obj.insert("comments".to_string(), Value::Array(comments));
                        }
                    }
                    out.push(RawRecord::new(SourceKind::Social, post));
                }

                match next {
                    Some(cursor) if page_len > 0 => after = Some(cursor),
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
