// src/store/google_auth.rs
//! Access tokens for the Drive API: a service-account JWT grant or a token issued elsewhere.

use std::fmt;
use std::path::Path;

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::DeliveryError;
use crate::ingest::http::truncate_body;

pub const DRIVE_FILE_SCOPE: &str = "https://www.googleapis.com/auth/drive.file";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
/// Google caps assertion lifetime at one hour.
const ASSERTION_TTL_SECS: i64 = 3600;

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// The fields of a downloaded service-account key file that the grant needs.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading service account key from {}", path.display()))?;
        Ok(Self::from_json(&data)?)
    }

    pub fn with_token_uri(mut self, uri: &str) -> Self {
        self.token_uri = uri.to_string();
        self
    }
}

#[derive(Serialize)]
struct GrantClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Clone)]
pub enum DriveAuth {
    ServiceAccount(ServiceAccountKey),
    StaticToken(String),
}

impl fmt::Debug for DriveAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriveAuth::ServiceAccount(key) => f.debug_tuple("ServiceAccount").field(key).finish(),
            DriveAuth::StaticToken(_) => f.write_str("StaticToken(..)"),
        }
    }
}

impl DriveAuth {
    pub async fn access_token(&self, client: &Client) -> Result<String, DeliveryError> {
        match self {
            DriveAuth::StaticToken(token) => Ok(token.clone()),
            DriveAuth::ServiceAccount(key) => exchange_assertion(key, client).await,
        }
    }
}

/// RS256-signed assertion for the `drive.file` scope.
pub fn signed_assertion(key: &ServiceAccountKey, now: i64) -> Result<String, DeliveryError> {
    let claims = GrantClaims {
        iss: &key.client_email,
        scope: DRIVE_FILE_SCOPE,
        aud: &key.token_uri,
        iat: now,
        exp: now + ASSERTION_TTL_SECS,
    };
    let enc = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|e| DeliveryError::Auth(format!("invalid private key: {e}")))?;
    encode(&Header::new(Algorithm::RS256), &claims, &enc)
        .map_err(|e| DeliveryError::Auth(format!("signing assertion: {e}")))
}

async fn exchange_assertion(
    key: &ServiceAccountKey,
    client: &Client,
) -> Result<String, DeliveryError> {
    let assertion = signed_assertion(key, Utc::now().timestamp())?;
    let resp = client
        .post(&key.token_uri)
        .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
        .send()
        .await?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(DeliveryError::Auth(format!(
            "token endpoint returned {}: {}",
            status.as_u16(),
            truncate_body(&body)
        )));
    }
    let token: TokenResponse = resp
        .json()
        .await
        .map_err(|e| DeliveryError::Auth(format!("token response: {e}")))?;
    Ok(token.access_token)
}
