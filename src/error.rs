// src/error.rs
//! Error taxonomy shared by adapters, sinks and the orchestrator.

use std::fmt;

use thiserror::Error;

use crate::ingest::types::SourceKind;

/// Missing or invalid configuration. Always fatal and raised before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing required configuration: {option}")]
    Missing { option: String },

    #[error("invalid configuration for {option}: {reason}")]
    Invalid { option: String, reason: String },
}

impl ConfigError {
    pub fn missing(option: impl Into<String>) -> Self {
        Self::Missing {
            option: option.into(),
        }
    }

    pub fn invalid(option: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            option: option.into(),
            reason: reason.into(),
        }
    }
}

/// What went wrong talking to an upstream API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamStatus {
    /// Non-success HTTP status code.
    Http(u16),
    /// The call exceeded the configured timeout.
    Timeout,
    /// Connection, TLS or body read failure.
    Transport,
    /// 2xx response whose body was not the expected JSON.
    Decode,
    /// The adapter could not build a request (e.g. no location given).
    InvalidRequest,
}

impl fmt::Display for UpstreamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamStatus::Http(code) => write!(f, "{code}"),
            UpstreamStatus::Timeout => f.write_str("timeout"),
            UpstreamStatus::Transport => f.write_str("transport"),
            UpstreamStatus::Decode => f.write_str("decode"),
            UpstreamStatus::InvalidRequest => f.write_str("invalid-request"),
        }
    }
}

/// Failure of a source adapter. Recoverable per source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{adapter} upstream error: status={status}, body={body}")]
pub struct UpstreamError {
    pub adapter: String,
    pub status: UpstreamStatus,
    pub body: String,
}

impl UpstreamError {
    pub fn new(adapter: &str, status: UpstreamStatus, body: impl Into<String>) -> Self {
        Self {
            adapter: adapter.to_string(),
            status,
            body: body.into(),
        }
    }

    pub fn from_reqwest(adapter: &str, err: &reqwest::Error) -> Self {
        let status = if err.is_timeout() {
            UpstreamStatus::Timeout
        } else if let Some(code) = err.status() {
            UpstreamStatus::Http(code.as_u16())
        } else {
            UpstreamStatus::Transport
        };
        Self::new(adapter, status, err.to_string())
    }

    pub fn is_timeout(&self) -> bool {
        self.status == UpstreamStatus::Timeout
    }
}

/// A raw record that lacks a derivable id or timestamp. Skipped and counted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed {kind} record: {reason}")]
pub struct MalformedRecordError {
    pub kind: SourceKind,
    pub reason: String,
}

/// Notification or upload failure. Reported, never retried.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("authentication failed: {0}")]
    Auth(String),
}

impl From<reqwest::Error> for DeliveryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DeliveryError::Transport("timeout".to_string())
        } else {
            DeliveryError::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_status_renders_as_word() {
        let e = UpstreamError::new("reddit", UpstreamStatus::Timeout, "");
        assert!(e.is_timeout());
        assert_eq!(e.to_string(), "reddit upstream error: status=timeout, body=");
    }

    #[test]
    fn config_error_names_option() {
        let e = ConfigError::missing("TUMBLR_API_KEY");
        assert!(e.to_string().contains("TUMBLR_API_KEY"));
    }
}
