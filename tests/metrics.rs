// tests/metrics.rs
#![cfg(feature = "strict-metrics")]
mod common;

use async_trait::async_trait;
use common::utc;
use daily_relay::{
    Batcher, Orchestrator, RawRecord, SourceAdapter, SourceJob, SourceKind, SourceQuery,
    UpstreamError,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use serde_json::json;
use std::sync::Arc;

struct TwoPosts;

#[async_trait]
impl SourceAdapter for TwoPosts {
    async fn fetch(&self, _query: &SourceQuery) -> Result<Vec<RawRecord>, UpstreamError> {
        Ok(vec![
            RawRecord::new(SourceKind::Social, json!({"id": "a", "created_utc": 1_704_196_800})),
            RawRecord::new(SourceKind::Social, json!({"id": "b", "created_utc": 1_600_000_000})),
        ])
    }
    fn name(&self) -> &'static str {
        "x"
    }
    fn kind(&self) -> SourceKind {
        SourceKind::Social
    }
}

#[tokio::test]
async fn metrics_exposed_after_run() {
    // Install a local recorder for the test
    let handle = PrometheusBuilder::new().install_recorder().expect("recorder");

    let report = Orchestrator::new(Batcher::default())
        .with_job(SourceJob::new(Arc::new(TwoPosts), SourceQuery::new(vec!["rust".into()])))
        .run(utc(2024, 1, 3, 6, 0))
        .await;
    assert!(!report.any_failed());

    // Scrape metrics text and check series presence by substring
    let out = handle.render();
    assert!(out.contains("relay_records_fetched_total"));
    assert!(out.contains("relay_records_kept_total"));
    assert!(out.contains("relay_records_dropped_total"));
    assert!(out.contains(r#"reason="outside_window""#));
    assert!(out.contains("relay_last_run_ts"));
}
