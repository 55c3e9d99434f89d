// src/notify/mod.rs
pub mod discord;

use std::fmt;

use serde::Serialize;

use crate::batch::Batch;

pub use discord::DiscordNotifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Ok,
    Failed,
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryStatus::Ok => f.write_str("ok"),
            DeliveryStatus::Failed => f.write_str("failed"),
        }
    }
}

/// Per-sink outcome. A failure is terminal for the run; nothing retries it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryResult {
    pub status: DeliveryStatus,
    pub detail: String,
    pub target: String,
}

impl DeliveryResult {
    pub fn ok(target: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            status: DeliveryStatus::Ok,
            detail: detail.into(),
            target: target.into(),
        }
    }

    pub fn failed(target: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            status: DeliveryStatus::Failed,
            detail: detail.into(),
            target: target.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == DeliveryStatus::Ok
    }
}

/// Chat notification sink: one network call per batch, no retries.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, batch: &Batch) -> DeliveryResult;

    /// Identifier safe to log.
    fn target(&self) -> String;
}
