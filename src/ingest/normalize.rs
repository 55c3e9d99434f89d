// src/ingest/normalize.rs
//! Canonical records and the per-source field tables that produce them.
//!
//! Each source kind has one fixed table. Candidates are tried in order and the
//! first present, non-empty value wins. Paths are dotted (`main.temp`,
//! `weather.0.description`); a key that itself contains a dot or a colon is
//! matched verbatim first.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::MalformedRecordError;
use crate::ingest::types::{RawRecord, SourceKind};
use crate::ingest::window::Timestamped;

/// Source-specific scalar kept next to the canonical fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Int(i) => write!(f, "{i}"),
            Scalar::Float(x) => write!(f, "{x}"),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

/// Canonical unit of content. `extra` is flattened next to the fixed keys when serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub source: SourceKind,
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Scalar>,
}

impl Record {
    pub fn extra_text(&self, key: &str) -> Option<String> {
        self.extra.get(key).map(|s| s.to_string())
    }
}

impl Timestamped for Record {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        Some(self.timestamp)
    }
}

impl Timestamped for RawRecord {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        extract_timestamp(&self.fields, field_map(self.kind))
    }
}

// --- field tables ---

#[derive(Debug, Clone, Copy)]
enum TimeField {
    /// Epoch seconds, RFC 3339 or a (partial) calendar date.
    Instant(&'static str),
    /// A bare year, as a number or string.
    Year(&'static str),
}

struct FieldMap {
    id: &'static [&'static str],
    timestamp: &'static [TimeField],
    title: &'static [&'static str],
    body: &'static [&'static str],
    url: &'static [&'static str],
    /// (output key, path). A later entry for the same key wins when both resolve.
    extra: &'static [(&'static str, &'static str)],
    /// Lists of objects reduced to one text value: (output key, list path, item path, separator).
    joined: &'static [(&'static str, &'static str, &'static str, &'static str)],
    /// Snapshots share an upstream id across runs; suffix it with the instant.
    snapshot_id: bool,
}

const SOCIAL: FieldMap = FieldMap {
    id: &["name", "id"],
    timestamp: &[TimeField::Instant("created_utc"), TimeField::Instant("created_at")],
    title: &["title"],
    body: &["selftext", "text"],
    url: &["url"],
    extra: &[
        ("subreddit", "subreddit"),
        ("author", "author"),
        ("author_id", "author_id"),
        ("score", "score"),
        ("num_comments", "num_comments"),
        ("permalink", "permalink"),
        ("lang", "lang"),
    ],
    joined: &[("comments", "comments", "body", "\n")],
    snapshot_id: false,
};

const TAGGED_BLOG: FieldMap = FieldMap {
    id: &["id_string", "id"],
    timestamp: &[TimeField::Instant("timestamp")],
    title: &["title"],
    body: &["summary", "body", "caption"],
    url: &["post_url"],
    extra: &[
        ("blog_name", "blog_name"),
        ("post_type", "type"),
        ("tags", "tags"),
        ("note_count", "note_count"),
        ("audio_url", "audio_url"),
        // video posts list one embed per width, audio posts a single string
        ("player", "player.0.embed_code"),
        ("player", "player"),
    ],
    joined: &[("photos", "photos", "original_size.url", " ")],
    snapshot_id: false,
};

const ACADEMIC_PAPER: FieldMap = FieldMap {
    id: &["paperId", "@id", "link.@id"],
    timestamp: &[
        TimeField::Instant("publicationDate"),
        TimeField::Instant("prism:publicationDate"),
        TimeField::Instant("dc:date"),
        TimeField::Year("year"),
    ],
    title: &["title"],
    body: &["abstract", "description"],
    url: &["url", "link.@id"],
    extra: &[
        ("authors", "authors"),
        ("venue", "venue"),
        ("year", "year"),
        ("publisher", "dc:publisher"),
        ("citation_count", "citationCount"),
    ],
    joined: &[],
    snapshot_id: false,
};

const WEATHER_SNAPSHOT: FieldMap = FieldMap {
    id: &["id", "name"],
    timestamp: &[TimeField::Instant("dt")],
    title: &["name"],
    body: &["weather.0.description"],
    url: &[],
    extra: &[
        ("condition", "weather.0.main"),
        ("temp_c", "main.temp"),
        ("feels_like_c", "main.feels_like"),
        ("humidity", "main.humidity"),
        ("cloudiness", "clouds.all"),
        ("wind_speed", "wind.speed"),
        ("lat", "coord.lat"),
        ("lon", "coord.lon"),
        ("sunrise", "sys.sunrise"),
        ("sunset", "sys.sunset"),
    ],
    joined: &[],
    snapshot_id: true,
};

const MOON_SNAPSHOT: FieldMap = FieldMap {
    id: &["id"],
    timestamp: &[TimeField::Instant("date")],
    title: &["name"],
    body: &["extraInfo.phase.string"],
    url: &[],
    extra: &[
        ("phase_fraction", "extraInfo.phase.fraction"),
        ("phase_angle", "extraInfo.phase.angle"),
        ("magnitude", "extraInfo.magnitude"),
        ("elongation", "extraInfo.elongation"),
        ("altitude_deg", "position.horizontal.altitude.degrees"),
        ("azimuth_deg", "position.horizontal.azimuth.degrees"),
        ("distance_km", "distance.fromEarth.km"),
        ("constellation", "position.constellation.name"),
    ],
    joined: &[],
    snapshot_id: true,
};

fn field_map(kind: SourceKind) -> &'static FieldMap {
    match kind {
        SourceKind::Social => &SOCIAL,
        SourceKind::TaggedBlog => &TAGGED_BLOG,
        SourceKind::AcademicPaper => &ACADEMIC_PAPER,
        SourceKind::WeatherSnapshot => &WEATHER_SNAPSHOT,
        SourceKind::MoonSnapshot => &MOON_SNAPSHOT,
    }
}

// --- JSON helpers ---

/// Resolve a dotted path; an exact key match takes precedence.
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if let Some(found) = value.get(path) {
        return Some(found);
    }
    let mut cur = value;
    for seg in path.split('.') {
        cur = match cur {
            Value::Object(m) => m.get(seg)?,
            Value::Array(a) => a.get(seg.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(cur)
}

fn is_blank(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(a) => a.is_empty(),
        _ => false,
    }
}

fn first_present<'a>(value: &'a Value, paths: &[&str]) -> Option<&'a Value> {
    paths
        .iter()
        .filter_map(|p| lookup(value, p))
        .find(|v| !is_blank(v))
}

fn as_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn as_id(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn list_item_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(m) => m.get("name").and_then(as_text),
        _ => None,
    }
}

fn to_scalar(v: &Value) -> Option<Scalar> {
    match v {
        Value::Bool(b) => Some(Scalar::Bool(*b)),
        Value::Number(n) => n
            .as_i64()
            .map(Scalar::Int)
            .or_else(|| n.as_f64().map(Scalar::Float)),
        Value::String(s) if !s.trim().is_empty() => Some(Scalar::Text(s.clone())),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(list_item_text).collect();
            if parts.is_empty() {
                None
            } else {
                Some(Scalar::Text(parts.join(", ")))
            }
        }
        Value::Object(m) => m.get("name").and_then(as_text).map(Scalar::Text),
        _ => None,
    }
}

fn join_items(list: &Value, item: &str, sep: &str) -> Option<Scalar> {
    let parts: Vec<&str> = list
        .as_array()?
        .iter()
        .filter_map(|it| lookup(it, item).and_then(Value::as_str))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(Scalar::Text(parts.join(sep)))
    }
}

// --- timestamps ---

fn epoch_secs(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9).round() as u32;
    DateTime::from_timestamp(whole as i64, nanos.min(999_999_999))
}

fn year_start(year: i32) -> Option<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(year, 1, 1).map(|d| d.and_time(NaiveTime::MIN).and_utc())
}

/// Parse epoch seconds, RFC 3339, `YYYY-MM-DD[ HH:MM:SS]`, `YYYY-MM` or `YYYY`.
pub fn parse_instant(v: &Value) -> Option<DateTime<Utc>> {
    match v {
        Value::Number(n) => n.as_f64().and_then(epoch_secs),
        Value::String(s) => parse_instant_str(s.trim()),
        _ => None,
    }
}

fn parse_instant_str(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc());
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d.and_time(NaiveTime::MIN).and_utc());
    }
    if let Some((y, m)) = s.split_once('-') {
        if y.len() == 4 && (1..=2).contains(&m.len()) {
            let year = y.parse::<i32>().ok()?;
            let month = m.parse::<u32>().ok()?;
            return NaiveDate::from_ymd_opt(year, month, 1)
                .map(|d| d.and_time(NaiveTime::MIN).and_utc());
        }
    }
    if s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit()) {
        return s.parse::<i32>().ok().and_then(year_start);
    }
    s.parse::<f64>().ok().and_then(epoch_secs)
}

fn parse_year(v: &Value) -> Option<DateTime<Utc>> {
    let year = match v {
        Value::Number(n) => i32::try_from(n.as_i64()?).ok()?,
        Value::String(s) => s.trim().parse::<i32>().ok()?,
        _ => return None,
    };
    year_start(year)
}

fn extract_timestamp(fields: &Value, map: &FieldMap) -> Option<DateTime<Utc>> {
    map.timestamp.iter().find_map(|tf| match tf {
        TimeField::Instant(p) => lookup(fields, p).and_then(parse_instant),
        TimeField::Year(p) => lookup(fields, p).and_then(parse_year),
    })
}

// --- normalization ---

fn malformed(kind: SourceKind, reason: &str) -> MalformedRecordError {
    MalformedRecordError {
        kind,
        reason: reason.to_string(),
    }
}

/// Map one raw record through its kind's field table.
///
/// Fails only when the id or timestamp cannot be derived. Missing optional
/// fields stay `None`; no placeholder text is produced here.
pub fn normalize(raw: &RawRecord) -> Result<Record, MalformedRecordError> {
    let kind = raw.kind;
    let fields = &raw.fields;
    if !fields.is_object() {
        return Err(malformed(kind, "not a JSON object"));
    }
    let map = field_map(kind);

    let timestamp =
        extract_timestamp(fields, map).ok_or_else(|| malformed(kind, "no usable timestamp"))?;
    let base_id = first_present(fields, map.id)
        .and_then(as_id)
        .ok_or_else(|| malformed(kind, "no id"))?;
    let id = if map.snapshot_id {
        format!(
            "{base_id}@{}",
            timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
        )
    } else {
        base_id
    };

    let mut extra: BTreeMap<String, Scalar> = map
        .extra
        .iter()
        .filter_map(|(key, path)| {
            lookup(fields, path)
                .and_then(to_scalar)
                .map(|s| (key.to_string(), s))
        })
        .collect();
    for (key, path, item, sep) in map.joined {
        if let Some(text) = lookup(fields, path).and_then(|v| join_items(v, item, sep)) {
            extra.insert(key.to_string(), text);
        }
    }

    Ok(Record {
        source: kind,
        id,
        timestamp,
        title: first_present(fields, map.title).and_then(as_text),
        body: first_present(fields, map.body).and_then(as_text),
        url: first_present(fields, map.url).and_then(as_text),
        extra,
    })
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    pub records: Vec<Record>,
    pub malformed: usize,
    pub duplicates: usize,
}

/// Normalize in order, skipping malformed records and repeated `(source, id)` pairs.
pub fn normalize_all(raws: Vec<RawRecord>) -> Normalized {
    let mut out = Normalized {
        records: Vec::with_capacity(raws.len()),
        ..Normalized::default()
    };
    let mut seen: HashSet<(SourceKind, String)> = HashSet::new();

    for raw in &raws {
        match normalize(raw) {
            Ok(rec) => {
                if seen.insert((rec.source, rec.id.clone())) {
                    out.records.push(rec);
                } else {
                    out.duplicates += 1;
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed record");
                out.malformed += 1;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lookup_prefers_exact_key_then_walks_path() {
        let v = json!({"a.b": 1, "a": {"b": 2}, "w": [{"d": "x"}]});
        assert_eq!(lookup(&v, "a.b"), Some(&json!(1)));
        assert_eq!(lookup(&v, "w.0.d"), Some(&json!("x")));
        assert_eq!(lookup(&v, "w.1.d"), None);
    }

    #[test]
    fn partial_dates_mean_first_instant() {
        let y = parse_instant(&json!("2020")).unwrap();
        assert_eq!(y.to_rfc3339(), "2020-01-01T00:00:00+00:00");
        let ym = parse_instant(&json!("2020-05")).unwrap();
        assert_eq!(ym.to_rfc3339(), "2020-05-01T00:00:00+00:00");
        let epoch = parse_instant(&json!(1704153600.0)).unwrap();
        assert_eq!(epoch.to_rfc3339(), "2024-01-02T00:00:00+00:00");
        assert!(parse_instant(&json!("not a date")).is_none());
    }

    #[test]
    fn year_only_papers_still_get_a_timestamp() {
        let raw = RawRecord::new(
            SourceKind::AcademicPaper,
            json!({"paperId": "p1", "year": 2021, "title": "T"}),
        );
        let r = normalize(&raw).unwrap();
        assert_eq!(r.timestamp.to_rfc3339(), "2021-01-01T00:00:00+00:00");
        assert_eq!(r.extra.get("year"), Some(&Scalar::Int(2021)));
    }
}
