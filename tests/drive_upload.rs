// tests/drive_upload.rs
mod common;

use axum::{
    body::Bytes,
    extract::Query,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use common::{client, spawn};
use daily_relay::store::{DriveAuth, DriveUploader, Uploader};
use serde_json::json;
use std::collections::HashMap;
use std::fs;

async fn create_file(
    Query(q): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let ctype = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let text = String::from_utf8_lossy(&body);

    let ok = q.get("uploadType").map(String::as_str) == Some("multipart")
        && q.get("fields").map(String::as_str) == Some("id")
        && auth == "Bearer static-token"
        && ctype.starts_with("multipart/related; boundary=")
        && text.contains(r#""parents":["folder-1"]"#)
        && text.contains(r#""name":"reddit_20240102.json""#)
        && text.contains(r#"[{"id":"a"}]"#);
    if ok {
        Json(json!({"id": "remote-123"})).into_response()
    } else {
        (StatusCode::BAD_REQUEST, "unexpected request").into_response()
    }
}

#[tokio::test]
async fn uploads_file_and_returns_remote_id() {
    let app = Router::new().route("/upload/drive/v3/files", post(create_file));
    let base = spawn(app).await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reddit_20240102.json");
    fs::write(&path, r#"[{"id":"a"}]"#).unwrap();

    let up = DriveUploader::new(DriveAuth::StaticToken("static-token".into()), client())
        .with_base_url(&base);
    let res = up.upload(&path, "folder-1").await;

    assert!(res.is_ok(), "{res:?}");
    assert_eq!(res.detail, "remote-123");
    assert_eq!(res.target, "google-drive");
    // the sink never deletes; cleanup is the orchestrator's call
    assert!(path.exists());
}

#[tokio::test]
async fn rejected_upload_is_reported() {
    let app = Router::new().route(
        "/upload/drive/v3/files",
        post(|| async { (StatusCode::FORBIDDEN, "insufficientFilePermissions") }),
    );
    let base = spawn(app).await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("x.json");
    fs::write(&path, "[]").unwrap();

    let res = DriveUploader::new(DriveAuth::StaticToken("t".into()), client())
        .with_base_url(&base)
        .upload(&path, "folder-1")
        .await;
    assert!(!res.is_ok());
    assert!(res.detail.contains("HTTP 403"));
    assert!(res.detail.contains("insufficientFilePermissions"));
}

#[tokio::test]
async fn missing_local_file_fails_before_any_request() {
    let dir = tempfile::tempdir().unwrap();
    let res = DriveUploader::new(DriveAuth::StaticToken("t".into()), client())
        .with_base_url("http://127.0.0.1:9")
        .upload(&dir.path().join("gone.json"), "folder-1")
        .await;
    assert!(!res.is_ok());
    assert!(res.detail.starts_with("IO error"));
}
