// tests/normalize.rs
mod common;

use common::utc;
use daily_relay::ingest::normalize::{normalize, normalize_all, Scalar};
use daily_relay::{RawRecord, SourceKind};
use serde_json::json;

#[test]
fn reddit_post_maps_core_and_extra_fields() {
    let raw = RawRecord::new(
        SourceKind::Social,
        json!({
            "name": "t3_abc",
            "id": "abc",
            "created_utc": 1_704_196_800.0,
            "title": "Show: a tiny relay",
            "selftext": "",
            "url": "https://example.org/post",
            "subreddit": "rust",
            "num_comments": 12,
            "score": 340
        }),
    );
    let r = normalize(&raw).unwrap();
    assert_eq!(r.id, "t3_abc");
    assert_eq!(r.timestamp, utc(2024, 1, 2, 12, 0));
    assert_eq!(r.title.as_deref(), Some("Show: a tiny relay"));
    // empty selftext is absent, not a placeholder
    assert_eq!(r.body, None);
    assert_eq!(r.url.as_deref(), Some("https://example.org/post"));
    assert_eq!(r.extra.get("subreddit"), Some(&Scalar::Text("rust".into())));
    assert_eq!(r.extra.get("num_comments"), Some(&Scalar::Int(12)));
}

#[test]
fn reddit_comment_bodies_are_kept_as_one_text() {
    let raw = RawRecord::new(
        SourceKind::Social,
        json!({
            "name": "t3_abc",
            "created_utc": 1_704_196_800,
            "title": "thread",
            "num_comments": 3,
            "comments": [
                {"body": "first!", "created_utc": 1_704_197_000},
                {"body": "  ", "created_utc": 1_704_197_050},
                {"body": "agreed, with caveats", "created_utc": 1_704_197_100}
            ]
        }),
    );
    let r = normalize(&raw).unwrap();
    assert_eq!(
        r.extra_text("comments").as_deref(),
        Some("first!\nagreed, with caveats")
    );
    assert_eq!(r.extra.get("num_comments"), Some(&Scalar::Int(3)));

    let quiet = RawRecord::new(
        SourceKind::Social,
        json!({"name": "t3_q", "created_utc": 1_704_196_800, "comments": []}),
    );
    assert!(!normalize(&quiet).unwrap().extra.contains_key("comments"));
}

#[test]
fn tweet_uses_text_as_body() {
    let raw = RawRecord::new(
        SourceKind::Social,
        json!({"id": "1742", "text": "hello", "created_at": "2024-01-02T08:00:00.000Z", "lang": "en"}),
    );
    let r = normalize(&raw).unwrap();
    assert_eq!(r.id, "1742");
    assert_eq!(r.body.as_deref(), Some("hello"));
    assert_eq!(r.title, None);
    assert_eq!(r.extra_text("lang").as_deref(), Some("en"));
}

#[test]
fn tumblr_post_joins_tags_and_renames_type() {
    let raw = RawRecord::new(
        SourceKind::TaggedBlog,
        json!({
            "id": 7_321_000_000_u64,
            "id_string": "7321000000",
            "timestamp": 1_704_196_800,
            "type": "text",
            "summary": "a summary",
            "post_url": "https://blog.example/post/7321000000",
            "tags": ["rust", "async"],
            "note_count": 4
        }),
    );
    let r = normalize(&raw).unwrap();
    assert_eq!(r.id, "7321000000");
    assert_eq!(r.body.as_deref(), Some("a summary"));
    assert_eq!(r.extra_text("post_type").as_deref(), Some("text"));
    assert_eq!(r.extra_text("tags").as_deref(), Some("rust, async"));
}

#[test]
fn tumblr_photos_and_player_embeds_are_kept() {
    let photo = RawRecord::new(
        SourceKind::TaggedBlog,
        json!({
            "id_string": "1",
            "timestamp": 1_704_196_800,
            "type": "photo",
            "photos": [
                {"caption": "", "original_size": {"url": "https://64.media.example/a.jpg", "width": 1280}},
                {"caption": "", "original_size": {"url": "https://64.media.example/b.jpg", "width": 1280}}
            ]
        }),
    );
    let r = normalize(&photo).unwrap();
    assert_eq!(
        r.extra_text("photos").as_deref(),
        Some("https://64.media.example/a.jpg https://64.media.example/b.jpg")
    );

    let video = RawRecord::new(
        SourceKind::TaggedBlog,
        json!({
            "id_string": "2",
            "timestamp": 1_704_196_800,
            "type": "video",
            "player": [
                {"width": 250, "embed_code": "<iframe width=\"250\"></iframe>"},
                {"width": 500, "embed_code": "<iframe width=\"500\"></iframe>"}
            ]
        }),
    );
    assert_eq!(
        normalize(&video).unwrap().extra_text("player").as_deref(),
        Some("<iframe width=\"250\"></iframe>")
    );

    let audio = RawRecord::new(
        SourceKind::TaggedBlog,
        json!({
            "id_string": "3",
            "timestamp": 1_704_196_800,
            "type": "audio",
            "player": "<embed src=\"https://audio.example/x\"/>"
        }),
    );
    let r = normalize(&audio).unwrap();
    assert_eq!(
        r.extra_text("player").as_deref(),
        Some("<embed src=\"https://audio.example/x\"/>")
    );
    assert!(!r.extra.contains_key("photos"));
}

#[test]
fn paper_authors_are_joined_and_year_is_a_fallback() {
    let raw = RawRecord::new(
        SourceKind::AcademicPaper,
        json!({
            "paperId": "p-1",
            "title": "On Windows",
            "authors": [{"authorId": "1", "name": "Ada"}, {"authorId": "2", "name": "Grace"}],
            "abstract": null,
            "year": 2023,
            "publicationDate": null,
            "venue": "",
            "citationCount": 3
        }),
    );
    let r = normalize(&raw).unwrap();
    assert_eq!(r.timestamp, utc(2023, 1, 1, 0, 0));
    assert_eq!(r.extra_text("authors").as_deref(), Some("Ada, Grace"));
    assert_eq!(r.body, None);
    assert!(!r.extra.contains_key("venue"));
    assert_eq!(r.extra.get("citation_count"), Some(&Scalar::Int(3)));
}

#[test]
fn cinii_item_uses_prefixed_keys() {
    let raw = RawRecord::new(
        SourceKind::AcademicPaper,
        json!({
            "@id": "https://cir.nii.ac.jp/crid/1390000000000000001",
            "title": "月の観測",
            "dc:publisher": "学会",
            "prism:publicationDate": "2024-01"
        }),
    );
    let r = normalize(&raw).unwrap();
    assert_eq!(r.id, "https://cir.nii.ac.jp/crid/1390000000000000001");
    assert_eq!(r.timestamp, utc(2024, 1, 1, 0, 0));
    assert_eq!(r.extra_text("publisher").as_deref(), Some("学会"));
}

#[test]
fn weather_snapshot_reads_nested_paths() {
    let raw = RawRecord::new(
        SourceKind::WeatherSnapshot,
        json!({
            "id": 1863967,
            "name": "Fukuoka",
            "dt": 1_704_196_800,
            "weather": [{"main": "Clouds", "description": "broken clouds"}],
            "main": {"temp": 9.5, "feels_like": 7.25, "humidity": 60},
            "clouds": {"all": 75},
            "wind": {"speed": 3.1},
            "coord": {"lat": 33.6, "lon": 130.4}
        }),
    );
    let r = normalize(&raw).unwrap();
    assert_eq!(r.id, "1863967@2024-01-02T12:00:00Z");
    assert_eq!(r.title.as_deref(), Some("Fukuoka"));
    assert_eq!(r.body.as_deref(), Some("broken clouds"));
    assert_eq!(r.extra.get("cloudiness"), Some(&Scalar::Int(75)));
    assert_eq!(r.extra.get("temp_c"), Some(&Scalar::Float(9.5)));
    assert_eq!(r.extra_text("condition").as_deref(), Some("Clouds"));
}

#[test]
fn moon_cell_maps_phase_and_position() {
    let raw = RawRecord::new(
        SourceKind::MoonSnapshot,
        json!({
            "id": "moon",
            "name": "Moon",
            "date": "2024-01-02T12:00:00.000+00:00",
            "distance": {"fromEarth": {"km": "384400.12"}},
            "position": {
                "horizontal": {"altitude": {"degrees": "42.10"}, "azimuth": {"degrees": "130.00"}},
                "constellation": {"id": "leo", "name": "Leo"}
            },
            "extraInfo": {"elongation": 120.5, "magnitude": -12.1,
                          "phase": {"angle": "60.1", "fraction": "0.75", "string": "Waning Gibbous"}}
        }),
    );
    let r = normalize(&raw).unwrap();
    assert_eq!(r.id, "moon@2024-01-02T12:00:00Z");
    assert_eq!(r.body.as_deref(), Some("Waning Gibbous"));
    assert_eq!(r.extra_text("constellation").as_deref(), Some("Leo"));
    assert_eq!(r.extra_text("altitude_deg").as_deref(), Some("42.10"));
}

#[test]
fn missing_id_or_timestamp_is_malformed() {
    let no_id = RawRecord::new(SourceKind::Social, json!({"created_utc": 1_704_196_800}));
    let no_ts = RawRecord::new(SourceKind::Social, json!({"id": "a"}));
    let not_obj = RawRecord::new(SourceKind::Social, json!(["a"]));
    for raw in [no_id, no_ts, not_obj] {
        let err = normalize(&raw).unwrap_err();
        assert_eq!(err.kind, SourceKind::Social);
    }
}

#[test]
fn normalize_all_skips_malformed_and_repeats() {
    let raws = vec![
        RawRecord::new(SourceKind::Social, json!({"id": "a", "created_utc": 1_704_196_800})),
        RawRecord::new(SourceKind::Social, json!({"title": "no id", "created_utc": 1_704_196_800})),
        RawRecord::new(SourceKind::Social, json!({"id": "b", "created_utc": 1_704_196_900})),
        // same post found by a second keyword
        RawRecord::new(SourceKind::Social, json!({"id": "a", "created_utc": 1_704_196_800})),
    ];
    let out = normalize_all(raws);
    let ids: Vec<&str> = out.records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
    assert_eq!(out.malformed, 1);
    assert_eq!(out.duplicates, 1);
}
