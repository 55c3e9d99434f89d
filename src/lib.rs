// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod batch;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod format;
pub mod ingest;
pub mod notify;
pub mod pipeline;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::batch::{Batch, Batcher};
pub use crate::bootstrap::build_orchestrator;
pub use crate::config::RelayConfig;
pub use crate::error::{ConfigError, DeliveryError, MalformedRecordError, UpstreamError, UpstreamStatus};
pub use crate::ingest::normalize::{normalize, Record, Scalar};
pub use crate::ingest::types::{RawRecord, SourceAdapter, SourceKind, SourceQuery};
pub use crate::ingest::window::{filter_window, TimeWindow, WindowSpec};
pub use crate::notify::{DeliveryResult, DeliveryStatus, Notifier};
pub use crate::pipeline::{Orchestrator, RunReport, SourceJob, SourceOutcome, Stage};
pub use crate::store::{JsonFileStore, PathTemplate, Uploader};
