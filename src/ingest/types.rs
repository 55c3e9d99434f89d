// src/ingest/types.rs
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::UpstreamError;
use crate::ingest::window::TimeWindow;

/// Which canonical shape a source produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    Social,
    TaggedBlog,
    AcademicPaper,
    WeatherSnapshot,
    MoonSnapshot,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Social => "social",
            SourceKind::TaggedBlog => "tagged-blog",
            SourceKind::AcademicPaper => "academic-paper",
            SourceKind::WeatherSnapshot => "weather-snapshot",
            SourceKind::MoonSnapshot => "moon-snapshot",
        }
    }

    /// Snapshots describe "now" rather than published content.
    pub fn is_snapshot(&self) -> bool {
        matches!(self, SourceKind::WeatherSnapshot | SourceKind::MoonSnapshot)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "social" => Ok(SourceKind::Social),
            "tagged-blog" => Ok(SourceKind::TaggedBlog),
            "academic-paper" => Ok(SourceKind::AcademicPaper),
            "weather-snapshot" => Ok(SourceKind::WeatherSnapshot),
            "moon-snapshot" => Ok(SourceKind::MoonSnapshot),
            other => Err(format!("unknown source kind: {other}")),
        }
    }
}

/// One upstream object, untouched. The normalizer decides what it means.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub kind: SourceKind,
    pub fields: serde_json::Value,
}

impl RawRecord {
    pub fn new(kind: SourceKind, fields: serde_json::Value) -> Self {
        Self { kind, fields }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// Parameters of one adapter call.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceQuery {
    pub keywords: Vec<String>,
    pub location: Option<GeoPoint>,
    /// Passed to upstreams that accept a time hint. Adapters never filter on it.
    pub window: Option<TimeWindow>,
    /// Pagination cap across all keywords.
    pub max_results: usize,
}

pub const DEFAULT_MAX_RESULTS: usize = 100;

impl SourceQuery {
    pub fn new(keywords: Vec<String>) -> Self {
        Self {
            keywords,
            location: None,
            window: None,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    pub fn with_location(mut self, location: GeoPoint) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_window(mut self, window: TimeWindow) -> Self {
        self.window = Some(window);
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }
}

/// One upstream API. Implementations issue the HTTP calls and return raw objects;
/// they must not filter or reshape them.
#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    async fn fetch(&self, query: &SourceQuery) -> Result<Vec<RawRecord>, UpstreamError>;

    /// Short stable name, used in file names and logs ("reddit", "tumblr", ...).
    fn name(&self) -> &'static str;

    fn kind(&self) -> SourceKind;
}
