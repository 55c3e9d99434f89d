// src/ingest/mod.rs
pub mod http;
pub mod normalize;
pub mod providers;
pub mod types;
pub mod window;

use metrics::{counter, describe_counter, describe_gauge};
use once_cell::sync::OnceCell;

use crate::ingest::normalize::{normalize_all, Normalized};
use crate::ingest::types::RawRecord;
use crate::ingest::window::{filter_window, TimeWindow};

/// One-time metrics registration (so series show up in any installed exporter).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "relay_records_fetched_total",
            "Raw records returned by source adapters."
        );
        describe_counter!(
            "relay_records_kept_total",
            "Records kept after window filtering and normalization."
        );
        describe_counter!(
            "relay_records_dropped_total",
            "Records dropped, labelled by reason."
        );
        describe_counter!(
            "relay_source_errors_total",
            "Source adapter failures (HTTP status, timeout, decode)."
        );
        describe_counter!(
            "relay_deliveries_total",
            "Sink deliveries, labelled by status."
        );
        describe_gauge!("relay_last_run_ts", "Unix ts when the relay last ran.");
    });
}

/// Window-filter then normalize one source's raw records, keeping every count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Prepared {
    pub normalized: Normalized,
    pub outside_window: usize,
    pub untimed: usize,
}

pub fn filter_and_normalize(source: &str, raw: Vec<RawRecord>, window: &TimeWindow) -> Prepared {
    let filtered = filter_window(raw, window);
    let normalized = normalize_all(filtered.kept);

    let src = source.to_string();
    counter!("relay_records_kept_total", "source" => src.clone())
        .increment(normalized.records.len() as u64);
    for (reason, n) in [
        ("outside_window", filtered.outside_window),
        ("untimed", filtered.untimed),
        ("malformed", normalized.malformed),
        ("duplicate", normalized.duplicates),
    ] {
        if n > 0 {
            counter!("relay_records_dropped_total", "source" => src.clone(), "reason" => reason)
                .increment(n as u64);
        }
    }

    Prepared {
        normalized,
        outside_window: filtered.outside_window,
        untimed: filtered.untimed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::SourceKind;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn counts_every_drop_reason() {
        let now = Utc.with_ymd_and_hms(2024, 1, 3, 6, 0, 0).unwrap();
        let window = TimeWindow::previous_day(now);
        let raw = vec![
            RawRecord::new(SourceKind::TaggedBlog, json!({"id": 1, "timestamp": 1_704_200_000})),
            RawRecord::new(SourceKind::TaggedBlog, json!({"id": 1, "timestamp": 1_704_200_100})),
            RawRecord::new(SourceKind::TaggedBlog, json!({"timestamp": 1_704_200_200})),
            RawRecord::new(SourceKind::TaggedBlog, json!({"id": 4, "timestamp": 1_600_000_000})),
            RawRecord::new(SourceKind::TaggedBlog, json!({"id": 5})),
        ];
        let p = filter_and_normalize("tumblr", raw, &window);
        assert_eq!(p.normalized.records.len(), 1);
        assert_eq!(p.normalized.duplicates, 1);
        assert_eq!(p.normalized.malformed, 1);
        assert_eq!(p.outside_window, 1);
        assert_eq!(p.untimed, 1);
    }
}
