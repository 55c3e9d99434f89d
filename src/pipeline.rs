// src/pipeline.rs
//! One run: every source goes Fetching → Filtering → Normalizing → Batching →
//! Delivering → Done, one after the other. A failing source ends in `Failed`
//! and the others continue. Persisted files are named by the run date, so a
//! rerun on the same day replaces that day's file.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::{counter, gauge};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::batch::Batcher;
use crate::config::default_window;
use crate::error::UpstreamError;
use crate::format::format_record;
use crate::ingest::types::{SourceAdapter, SourceKind, SourceQuery};
use crate::ingest::window::{TimeWindow, WindowSpec};
use crate::ingest::{ensure_metrics_described, filter_and_normalize};
use crate::notify::{DeliveryResult, Notifier};
use crate::store::{JsonFileStore, Uploader};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Fetching,
    Filtering,
    Normalizing,
    Batching,
    Delivering,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Fetching => "fetching",
            Stage::Filtering => "filtering",
            Stage::Normalizing => "normalizing",
            Stage::Batching => "batching",
            Stage::Delivering => "delivering",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RecordCounts {
    pub fetched: usize,
    pub kept: usize,
    pub outside_window: usize,
    pub untimed: usize,
    pub malformed: usize,
    pub duplicate: usize,
}

/// What happened to one source during a run.
#[derive(Debug, Clone, Serialize)]
pub struct SourceOutcome {
    pub source: String,
    pub kind: SourceKind,
    pub window: TimeWindow,
    pub stage: Stage,
    pub counts: RecordCounts,
    pub batches: usize,
    pub saved: Option<PathBuf>,
    pub deliveries: Vec<DeliveryResult>,
    #[serde(serialize_with = "error_as_text")]
    pub error: Option<UpstreamError>,
}

fn error_as_text<S: serde::Serializer>(e: &Option<UpstreamError>, s: S) -> Result<S::Ok, S::Error> {
    match e {
        Some(e) => s.serialize_some(&e.to_string()),
        None => s.serialize_none(),
    }
}

impl SourceOutcome {
    fn new(source: &str, kind: SourceKind, window: TimeWindow) -> Self {
        Self {
            source: source.to_string(),
            kind,
            window,
            stage: Stage::Fetching,
            counts: RecordCounts::default(),
            batches: 0,
            saved: None,
            deliveries: Vec::new(),
            error: None,
        }
    }

    pub fn failed(&self) -> bool {
        self.stage == Stage::Failed || self.deliveries.iter().any(|d| !d.is_ok())
    }

    /// One human-readable line for the run summary.
    pub fn summary(&self) -> String {
        if let Some(e) = &self.error {
            return format!("{}: failed at fetching: {e}", self.source);
        }
        let c = &self.counts;
        let ok = self.deliveries.iter().filter(|d| d.is_ok()).count();
        let mut line = format!(
            "{}: {} fetched, {} kept (outside_window={}, untimed={}, malformed={}, duplicate={}), {} batches, deliveries {}/{} ok",
            self.source,
            c.fetched,
            c.kept,
            c.outside_window,
            c.untimed,
            c.malformed,
            c.duplicate,
            self.batches,
            ok,
            self.deliveries.len()
        );
        for d in self.deliveries.iter().filter(|d| !d.is_ok()) {
            line.push_str(&format!("; {} failed: {}", d.target, d.detail));
        }
        line
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub outcomes: Vec<SourceOutcome>,
}

impl RunReport {
    /// True when any source failed or any delivery failed.
    pub fn any_failed(&self) -> bool {
        self.outcomes.iter().any(SourceOutcome::failed)
    }

    pub fn outcome(&self, source: &str) -> Option<&SourceOutcome> {
        self.outcomes.iter().find(|o| o.source == source)
    }

    pub fn log_summary(&self) {
        for o in &self.outcomes {
            if o.failed() {
                warn!("{}", o.summary());
            } else {
                info!("{}", o.summary());
            }
        }
    }
}

/// An adapter plus the query it runs with. The window is resolved per run.
pub struct SourceJob {
    pub adapter: Arc<dyn SourceAdapter>,
    pub query: SourceQuery,
    pub window: WindowSpec,
}

impl SourceJob {
    /// Uses the kind's default window.
    pub fn new(adapter: Arc<dyn SourceAdapter>, query: SourceQuery) -> Self {
        let window = default_window(adapter.kind());
        Self {
            adapter,
            query,
            window,
        }
    }

    pub fn with_window(mut self, window: WindowSpec) -> Self {
        self.window = window;
        self
    }
}

struct UploadSink {
    uploader: Arc<dyn Uploader>,
    folder_id: String,
}

pub struct Orchestrator {
    jobs: Vec<SourceJob>,
    batcher: Batcher,
    store: Option<JsonFileStore>,
    notifier: Option<Arc<dyn Notifier>>,
    upload: Option<UploadSink>,
    delete_after_upload: bool,
}

impl Orchestrator {
    pub fn new(batcher: Batcher) -> Self {
        Self {
            jobs: Vec::new(),
            batcher,
            store: None,
            notifier: None,
            upload: None,
            delete_after_upload: false,
        }
    }

    pub fn with_job(mut self, job: SourceJob) -> Self {
        self.jobs.push(job);
        self
    }

    pub fn with_store(mut self, store: JsonFileStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Uploads only happen for files the store wrote.
    pub fn with_uploader(mut self, uploader: Arc<dyn Uploader>, folder_id: impl Into<String>) -> Self {
        self.upload = Some(UploadSink {
            uploader,
            folder_id: folder_id.into(),
        });
        self
    }

    pub fn delete_after_upload(mut self, on: bool) -> Self {
        self.delete_after_upload = on;
        self
    }

    pub fn jobs(&self) -> &[SourceJob] {
        &self.jobs
    }

    pub async fn run(&self, now: DateTime<Utc>) -> RunReport {
        ensure_metrics_described();
        info!(sources = self.jobs.len(), %now, "relay run started");

        let mut outcomes = Vec::with_capacity(self.jobs.len());
        for job in &self.jobs {
            outcomes.push(self.run_source(job, now).await);
        }

        gauge!("relay_last_run_ts").set(now.timestamp() as f64);
        RunReport {
            started_at: now,
            outcomes,
        }
    }

    async fn run_source(&self, job: &SourceJob, now: DateTime<Utc>) -> SourceOutcome {
        let name = job.adapter.name();
        let window = job.window.resolve(now);
        let mut out = SourceOutcome::new(name, job.adapter.kind(), window);

        info!(source = name, stage = %Stage::Fetching, %window, "stage");
        let query = job.query.clone().with_window(window);
        let raw = match job.adapter.fetch(&query).await {
            Ok(raw) => raw,
            Err(e) => {
                counter!("relay_source_errors_total", "source" => name).increment(1);
                warn!(source = name, stage = %Stage::Fetching, error = %e, "source failed, skipping");
                out.stage = Stage::Failed;
                out.error = Some(e);
                return out;
            }
        };
        out.counts.fetched = raw.len();
        counter!("relay_records_fetched_total", "source" => name).increment(raw.len() as u64);

        out.stage = Stage::Filtering;
        debug!(source = name, stage = %out.stage, fetched = raw.len(), "stage");
        let prepared = filter_and_normalize(name, raw, &window);
        out.stage = Stage::Normalizing;
        out.counts.outside_window = prepared.outside_window;
        out.counts.untimed = prepared.untimed;
        out.counts.malformed = prepared.normalized.malformed;
        out.counts.duplicate = prepared.normalized.duplicates;
        let records = prepared.normalized.records;
        out.counts.kept = records.len();
        info!(
            source = name,
            stage = %out.stage,
            kept = out.counts.kept,
            outside_window = out.counts.outside_window,
            untimed = out.counts.untimed,
            malformed = out.counts.malformed,
            duplicate = out.counts.duplicate,
            "stage"
        );

        out.stage = Stage::Batching;
        let batches = self.batcher.pack(&records, format_record);
        out.batches = batches.len();
        debug!(source = name, stage = %out.stage, batches = batches.len(), "stage");

        out.stage = Stage::Delivering;
        if let Some(store) = &self.store {
            match store.save(&records, name, now.date_naive()).await {
                Ok(path) => out.saved = path,
                Err(e) => {
                    warn!(source = name, error = %e, "persisting records failed");
                    out.deliveries
                        .push(DeliveryResult::failed(store.template().as_str(), e.to_string()));
                }
            }
        }

        if let Some(notifier) = &self.notifier {
            for batch in &batches {
                out.deliveries.push(notifier.notify(batch).await);
            }
        }

        if let (Some(sink), Some(path)) = (&self.upload, &out.saved) {
            let res = sink.uploader.upload(path, &sink.folder_id).await;
            let uploaded = res.is_ok();
            out.deliveries.push(res);
            if uploaded && self.delete_after_upload {
                match tokio::fs::remove_file(path).await {
                    Ok(()) => debug!(source = name, file = %path.display(), "removed local copy"),
                    Err(e) => warn!(source = name, file = %path.display(), error = %e, "could not remove uploaded file"),
                }
            }
        }

        for d in &out.deliveries {
            counter!("relay_deliveries_total", "source" => name, "status" => d.status.to_string())
                .increment(1);
        }

        out.stage = Stage::Done;
        info!(source = name, stage = %out.stage, deliveries = out.deliveries.len(), "stage");
        out
    }
}
