// src/store/json_file.rs
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::DeliveryError;
use crate::ingest::normalize::Record;

pub const DEFAULT_TEMPLATE: &str = "{source}/{source}_{date}.json";

/// File path with `{source}` and `{date}` (`YYYYMMDD`) placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate(String);

impl PathTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    /// `<root>/{source}/{source}_{date}.json`
    pub fn under(root: impl AsRef<Path>) -> Self {
        Self::new(root.as_ref().join(DEFAULT_TEMPLATE).to_string_lossy().into_owned())
    }

    pub fn render(&self, source: &str, date: NaiveDate) -> PathBuf {
        PathBuf::from(
            self.0
                .replace("{source}", source)
                .replace("{date}", &date.format("%Y%m%d").to_string()),
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Persistence sink: one JSON array per source and day.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    template: PathTemplate,
}

impl JsonFileStore {
    pub fn new(template: PathTemplate) -> Self {
        Self { template }
    }

    pub fn template(&self) -> &PathTemplate {
        &self.template
    }

    /// Write `records` to the dated path, replacing any earlier file of the
    /// same day. Empty input writes nothing and returns `None`.
    pub async fn save(
        &self,
        records: &[Record],
        source: &str,
        date: NaiveDate,
    ) -> Result<Option<PathBuf>, DeliveryError> {
        if records.is_empty() {
            tracing::debug!(source, "nothing to persist");
            return Ok(None);
        }

        let path = self.template.render(source, date);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let bytes = to_pretty_json(records)?;
        tokio::fs::write(&path, bytes).await?;
        tracing::info!(source, path = %path.display(), records = records.len(), "persisted records");
        Ok(Some(path))
    }
}

/// Four-space indent; serde_json leaves non-ASCII unescaped.
fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let fmt = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, fmt);
    value.serialize(&mut ser)?;
    buf.push(b'\n');
    Ok(buf)
}
