// src/store/drive.rs
use std::path::Path;

use reqwest::{header, Client};
use serde::Deserialize;
use serde_json::json;

use super::google_auth::DriveAuth;
use crate::error::DeliveryError;
use crate::ingest::http::truncate_body;
use crate::notify::DeliveryResult;

const DRIVE_BASE_URL: &str = "https://www.googleapis.com";
const BOUNDARY: &str = "daily_relay_upload_boundary";

/// Cloud upload sink. Reads the persisted file and sends it as one blob.
#[async_trait::async_trait]
pub trait Uploader: Send + Sync {
    async fn upload(&self, path: &Path, folder_id: &str) -> DeliveryResult;

    fn target(&self) -> String;
}

#[derive(Deserialize)]
struct CreatedFile {
    id: String,
}

/// Google Drive v3 multipart create.
#[derive(Debug, Clone)]
pub struct DriveUploader {
    auth: DriveAuth,
    client: Client,
    base_url: String,
}

impl DriveUploader {
    pub fn new(auth: DriveAuth, client: Client) -> Self {
        Self {
            auth,
            client,
            base_url: DRIVE_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    async fn try_upload(&self, path: &Path, folder_id: &str) -> Result<String, DeliveryError> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "records.json".to_string());
        let token = self.auth.access_token(&self.client).await?;

        let metadata = json!({ "name": name, "parents": [folder_id] });
        let body = multipart_related(&serde_json::to_vec(&metadata)?, &bytes);

        let resp = self
            .client
            .post(format!("{}/upload/drive/v3/files", self.base_url))
            .query(&[("uploadType", "multipart"), ("fields", "id")])
            .bearer_auth(token)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/related; boundary={BOUNDARY}"),
            )
            .body(body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(DeliveryError::Http {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }
        let created: CreatedFile = resp.json().await?;
        Ok(created.id)
    }
}

/// Metadata part, then the file as `application/json`.
fn multipart_related(metadata: &[u8], media: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(metadata.len() + media.len() + 256);
    out.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    out.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    out.extend_from_slice(metadata);
    out.extend_from_slice(format!("\r\n--{BOUNDARY}\r\n").as_bytes());
    out.extend_from_slice(b"Content-Type: application/json\r\n\r\n");
    out.extend_from_slice(media);
    out.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    out
}

#[async_trait::async_trait]
impl Uploader for DriveUploader {
    async fn upload(&self, path: &Path, folder_id: &str) -> DeliveryResult {
        let target = self.target();
        match self.try_upload(path, folder_id).await {
            Ok(id) => {
                tracing::info!(file = %path.display(), remote_id = %id, "uploaded to drive");
                DeliveryResult::ok(target, id)
            }
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "drive upload failed");
                DeliveryResult::failed(target, e.to_string())
            }
        }
    }

    fn target(&self) -> String {
        "google-drive".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multipart_body_has_both_parts_and_closing_boundary() {
        let body = multipart_related(br#"{"name":"a.json"}"#, b"[1]");
        let s = String::from_utf8(body).unwrap();
        assert!(s.starts_with(&format!("--{BOUNDARY}\r\n")));
        assert!(s.contains("{\"name\":\"a.json\"}\r\n"));
        assert!(s.contains("Content-Type: application/json\r\n\r\n[1]\r\n"));
        assert!(s.ends_with(&format!("--{BOUNDARY}--\r\n")));
    }
}
