// src/ingest/http.rs
//! Shared HTTP plumbing for source adapters.

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde_json::Value;

use crate::error::{ConfigError, UpstreamError, UpstreamStatus};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const USER_AGENT: &str = concat!("daily-relay/", env!("CARGO_PKG_VERSION"));

/// Longest upstream body kept in an error.
const MAX_ERROR_BODY: usize = 512;

/// Build the client every adapter and sink shares. Every request inherits `timeout`.
pub fn build_client(timeout: Duration) -> Result<Client, ConfigError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .timeout(timeout)
        .build()
        .map_err(|e| ConfigError::invalid("RELAY_HTTP_TIMEOUT_SECS", e.to_string()))
}

pub(crate) fn truncate_body(body: &str) -> String {
    if body.chars().count() <= MAX_ERROR_BODY {
        body.to_string()
    } else {
        let mut out: String = body.chars().take(MAX_ERROR_BODY).collect();
        out.push('…');
        out
    }
}

/// Send `req` and decode a JSON body. Any non-2xx status becomes
/// `UpstreamError { status, body }`; a timed out call becomes `status: timeout`.
pub async fn send_json(adapter: &str, req: RequestBuilder) -> Result<Value, UpstreamError> {
    let resp = req
        .send()
        .await
        .map_err(|e| UpstreamError::from_reqwest(adapter, &e))?;
    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|e| UpstreamError::from_reqwest(adapter, &e))?;

    if !status.is_success() {
        return Err(UpstreamError::new(
            adapter,
            UpstreamStatus::Http(status.as_u16()),
            truncate_body(&body),
        ));
    }

    serde_json::from_str(&body).map_err(|e| {
        UpstreamError::new(
            adapter,
            UpstreamStatus::Decode,
            format!("{e}: {}", truncate_body(&body)),
        )
    })
}

/// Take the array at `key` (or an empty list when absent).
pub(crate) fn array_at(value: &Value, key: &str) -> Vec<Value> {
    crate::ingest::normalize::lookup(value, key)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(2_000);
        let t = truncate_body(&body);
        assert_eq!(t.chars().count(), MAX_ERROR_BODY + 1);
        assert!(t.ends_with('…'));
        assert_eq!(truncate_body("short"), "short");
    }
}
