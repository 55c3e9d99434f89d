// src/format.rs
//! Display formatting for notification batches.
//!
//! All presentation defaults ("No title", "No abstract", ...) live here; canonical
//! records never carry placeholder text.

use chrono::SecondsFormat;

use crate::ingest::normalize::Record;
use crate::ingest::types::SourceKind;

/// Longest body excerpt shown in a message.
pub const BODY_EXCERPT_CHARS: usize = 1500;

/// Turn HTML-ish upstream text into one plain line.
pub fn plain_text(s: &str) -> String {
    // 1) Strip HTML tags
    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").expect("valid regex"));
    let stripped = re_tags.replace_all(s, " ");

    // 2) HTML entity decode (after stripping so decoded `<` survives)
    let decoded = html_escape::decode_html_entities(&stripped).to_string();

    // 3) Collapse whitespace (incl. NBSP)
    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"[\s\u{00A0}]+").expect("valid regex"));
    re_ws.replace_all(&decoded, " ").trim().to_string()
}

/// Cap at `max` characters, marking the cut with an ellipsis.
pub fn excerpt(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn body_or(rec: &Record, fallback: &str) -> String {
    rec.body
        .as_deref()
        .map(plain_text)
        .filter(|b| !b.is_empty())
        .map(|b| excerpt(&b, BODY_EXCERPT_CHARS))
        .unwrap_or_else(|| fallback.to_string())
}

fn title_or(rec: &Record, fallback: &str) -> String {
    rec.title
        .as_deref()
        .map(plain_text)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

fn when(rec: &Record) -> String {
    rec.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn extra_or(rec: &Record, key: &str, fallback: &str) -> String {
    rec.extra_text(key).unwrap_or_else(|| fallback.to_string())
}

/// Render one record as Discord markdown.
pub fn format_record(rec: &Record) -> String {
    match rec.source {
        SourceKind::Social => format_social(rec),
        SourceKind::TaggedBlog => format_tagged(rec),
        SourceKind::AcademicPaper => format_paper(rec),
        SourceKind::WeatherSnapshot => format_weather(rec),
        SourceKind::MoonSnapshot => format_moon(rec),
    }
}

fn format_social(rec: &Record) -> String {
    let mut out = format!("**{}**\n{}", title_or(rec, "No title"), body_or(rec, "No text"));
    if let Some(sub) = rec.extra_text("subreddit") {
        out.push_str(&format!("\nr/{sub}"));
    }
    if let Some(url) = &rec.url {
        out.push_str(&format!("\n{url}"));
    }
    out.push_str(&format!("\nPosted: {}", when(rec)));
    out
}

fn format_tagged(rec: &Record) -> String {
    let mut out = format!(
        "**{}** ({})\n{}",
        title_or(rec, "Untitled post"),
        extra_or(rec, "post_type", "post"),
        body_or(rec, "No summary")
    );
    if let Some(tags) = rec.extra_text("tags") {
        out.push_str(&format!("\nTags: {tags}"));
    }
    if let Some(url) = &rec.url {
        out.push_str(&format!("\n{url}"));
    }
    out
}

fn format_paper(rec: &Record) -> String {
    format!(
        "**Title:** {}\n**Authors:** {}\n**Venue:** {}\n**Published:** {}\n**Link:** {}\n**Abstract:** {}",
        title_or(rec, "No title"),
        extra_or(rec, "authors", "Unknown"),
        rec.extra_text("venue")
            .or_else(|| rec.extra_text("publisher"))
            .unwrap_or_else(|| "Unknown".to_string()),
        rec.timestamp.format("%Y-%m-%d"),
        rec.url.as_deref().unwrap_or("No link"),
        body_or(rec, "No abstract")
    )
}

fn format_weather(rec: &Record) -> String {
    format!(
        "**Weather in {}** ({})\n{}, {}°C (feels {}°C), humidity {}%, cloudiness {}%, wind {} m/s",
        title_or(rec, "unknown location"),
        when(rec),
        body_or(rec, "no description"),
        extra_or(rec, "temp_c", "?"),
        extra_or(rec, "feels_like_c", "?"),
        extra_or(rec, "humidity", "?"),
        extra_or(rec, "cloudiness", "?"),
        extra_or(rec, "wind_speed", "?"),
    )
}

fn format_moon(rec: &Record) -> String {
    format!(
        "**{}** ({})\nPhase: {} (fraction {}), altitude {}°, constellation {}",
        title_or(rec, "Moon"),
        when(rec),
        body_or(rec, "unknown"),
        extra_or(rec, "phase_fraction", "?"),
        extra_or(rec, "altitude_deg", "?"),
        extra_or(rec, "constellation", "?"),
    )
}
