// src/notify/discord.rs
use reqwest::{Client, StatusCode};
use serde::Serialize;

use super::{DeliveryResult, Notifier};
use crate::batch::Batch;
use crate::ingest::http::truncate_body;

/// Posts `{"content": <text>}` to a Discord webhook. Only `204 No Content` counts as delivered.
#[derive(Clone)]
pub struct DiscordNotifier {
    webhook: String,
    client: Client,
}

#[derive(Serialize)]
struct DiscordWebhookPayload<'a> {
    content: &'a str,
}

impl DiscordNotifier {
    /// `client` carries the run's timeout.
    pub fn new(webhook: String, client: Client) -> Self {
        Self { webhook, client }
    }

    pub async fn send_text(&self, text: &str) -> DeliveryResult {
        let target = self.target();
        let res = self
            .client
            .post(&self.webhook)
            .json(&DiscordWebhookPayload { content: text })
            .send()
            .await;

        match res {
            Ok(rsp) if rsp.status() == StatusCode::NO_CONTENT => {
                DeliveryResult::ok(target, "204 No Content")
            }
            Ok(rsp) => {
                let status = rsp.status();
                let body = rsp.text().await.unwrap_or_default();
                tracing::warn!(%target, status = status.as_u16(), "discord webhook rejected message");
                DeliveryResult::failed(
                    target,
                    format!("HTTP {}: {}", status.as_u16(), truncate_body(&body)),
                )
            }
            Err(e) => {
                let detail = if e.is_timeout() {
                    "timeout".to_string()
                } else {
                    format!("request failed: {e}")
                };
                tracing::warn!(%target, %detail, "discord webhook request failed");
                DeliveryResult::failed(target, detail)
            }
        }
    }
}

/// `discord:<webhook id>`; the token part of the URL is never exposed.
pub fn redact_webhook(url: &str) -> String {
    let mut segments = url.trim_end_matches('/').rsplit('/');
    let _token = segments.next();
    match segments.next() {
        Some(id) if !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) => {
            format!("discord:{id}")
        }
        _ => "discord".to_string(),
    }
}

#[async_trait::async_trait]
impl Notifier for DiscordNotifier {
    async fn notify(&self, batch: &Batch) -> DeliveryResult {
        self.send_text(batch.text()).await
    }

    fn target(&self) -> String {
        redact_webhook(&self.webhook)
    }
}
