// tests/common/mod.rs
#![allow(dead_code)]

use axum::Router;
use chrono::{DateTime, TimeZone, Utc};
use daily_relay::ingest::http::build_client;
use std::time::Duration;

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind local port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("mock server");
    });
    format!("http://{addr}")
}

pub fn client() -> reqwest::Client {
    build_client(Duration::from_secs(5)).expect("client")
}

pub fn client_with_timeout(ms: u64) -> reqwest::Client {
    build_client(Duration::from_millis(ms)).expect("client")
}

pub fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
}
