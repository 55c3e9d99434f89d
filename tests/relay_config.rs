// tests/relay_config.rs
use daily_relay::config::{RelayConfig, SourceSettings};
use daily_relay::ingest::providers::ProviderId;
use daily_relay::store::DriveAuth;
use daily_relay::{ConfigError, WindowSpec};
use std::collections::HashMap;
use std::{env, fs};

fn from_pairs(pairs: &[(&str, &str)]) -> Result<RelayConfig, ConfigError> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    RelayConfig::from_lookup(|k| map.get(k).cloned())
}

fn missing_option(err: ConfigError) -> String {
    match err {
        ConfigError::Missing { option } => option,
        other => panic!("expected Missing, got {other:?}"),
    }
}

#[test]
fn sources_are_required() {
    let err = from_pairs(&[]).unwrap_err();
    assert_eq!(missing_option(err), "RELAY_SOURCES");

    let err = from_pairs(&[("RELAY_SOURCES", " , ")]).unwrap_err();
    assert_eq!(missing_option(err), "RELAY_SOURCES");
}

#[test]
fn unknown_source_is_invalid() {
    let err = from_pairs(&[("RELAY_SOURCES", "reddit,myspace")]).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { ref option, .. } if option == "RELAY_SOURCES"));
}

#[test]
fn missing_credential_is_named() {
    let err = from_pairs(&[
        ("RELAY_SOURCES", "reddit"),
        ("RELAY_KEYWORDS", "rust"),
        ("REDDIT_CLIENT_ID", "id"),
        ("REDDIT_USER_AGENT", "relay/0.1"),
    ])
    .unwrap_err();
    assert_eq!(missing_option(err), "REDDIT_CLIENT_SECRET");
}

#[test]
fn keyword_sources_need_keywords_snapshots_need_location() {
    let err = from_pairs(&[("RELAY_SOURCES", "tumblr"), ("TUMBLR_API_KEY", "k")]).unwrap_err();
    assert_eq!(missing_option(err), "RELAY_KEYWORDS");

    let err = from_pairs(&[("RELAY_SOURCES", "weather"), ("OPENWEATHER_API_KEY", "k")]).unwrap_err();
    assert_eq!(missing_option(err), "LATITUDE");

    // snapshots alone need no keywords
    let cfg = from_pairs(&[
        ("RELAY_SOURCES", "weather"),
        ("OPENWEATHER_API_KEY", "k"),
        ("LATITUDE", "33.6"),
        ("LONGITUDE", "130.4"),
    ])
    .unwrap();
    assert!(cfg.keywords.is_empty());
}

#[test]
fn defaults_apply() {
    let cfg = from_pairs(&[
        ("RELAY_SOURCES", "semantic-scholar, semantic-scholar"),
        ("RELAY_KEYWORDS", "graph neural networks"),
    ])
    .unwrap();
    assert_eq!(cfg.sources.len(), 1);
    assert!(matches!(cfg.sources[0], SourceSettings::SemanticScholar { api_key: None }));
    assert_eq!(cfg.max_results, 100);
    assert_eq!(cfg.max_batch_chars, 2000);
    assert_eq!(cfg.http_timeout.as_secs(), 30);
    assert_eq!(cfg.data_dir, std::path::PathBuf::from("data"));
    assert!(cfg.persist);
    assert!(!cfg.delete_after_upload);
    assert!(cfg.discord_webhook.is_none());
    assert!(cfg.drive.is_none());
    assert!(cfg.window.is_none());
}

#[test]
fn numbers_and_window_are_validated() {
    let base = [("RELAY_SOURCES", "semantic-scholar"), ("RELAY_KEYWORDS", "x")];

    let mut pairs = base.to_vec();
    pairs.push(("RELAY_MAX_RESULTS", "lots"));
    assert!(matches!(from_pairs(&pairs), Err(ConfigError::Invalid { .. })));

    let mut pairs = base.to_vec();
    pairs.push(("RELAY_MAX_RESULTS", "0"));
    assert!(from_pairs(&pairs).is_err());

    let mut pairs = base.to_vec();
    pairs.push(("RELAY_WINDOW", "trailing:48"));
    assert_eq!(from_pairs(&pairs).unwrap().window, Some(WindowSpec::TrailingHours(48)));

    let mut pairs = base.to_vec();
    pairs.push(("LATITUDE", "95"));
    pairs.push(("LONGITUDE", "0"));
    assert!(matches!(from_pairs(&pairs), Err(ConfigError::Invalid { ref option, .. }) if option == "LATITUDE"));
}

#[test]
fn keywords_file_is_merged_after_env_list() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("keywords.toml");
    fs::write(&p, r#"keywords = ["tokio", " serde ", "rust"]"#).unwrap();
    let path = p.display().to_string();

    let cfg = from_pairs(&[
        ("RELAY_SOURCES", "x"),
        ("BEARER_TOKEN", "b"),
        ("RELAY_KEYWORDS", "rust, axum"),
        ("RELAY_KEYWORDS_PATH", path.as_str()),
    ])
    .unwrap();
    assert_eq!(cfg.keywords, vec!["rust", "axum", "tokio", "serde"]);

    let bad = from_pairs(&[
        ("RELAY_SOURCES", "x"),
        ("BEARER_TOKEN", "b"),
        ("RELAY_KEYWORDS_PATH", "/definitely/not/here.toml"),
    ])
    .unwrap_err();
    assert!(bad.to_string().contains("RELAY_KEYWORDS_PATH"));
}

#[test]
fn drive_needs_credentials_and_persistence() {
    let base = [
        ("RELAY_SOURCES", "semantic-scholar"),
        ("RELAY_KEYWORDS", "x"),
        ("GOOGLE_DRIVE_FOLDER_ID", "folder-1"),
    ];
    let err = from_pairs(&base).unwrap_err();
    assert_eq!(missing_option(err), "GOOGLE_APPLICATION_CREDENTIALS");

    let mut pairs = base.to_vec();
    pairs.push(("GOOGLE_DRIVE_ACCESS_TOKEN", "ya29.t"));
    let cfg = from_pairs(&pairs).unwrap();
    let drive = cfg.drive.expect("drive settings");
    assert_eq!(drive.folder_id, "folder-1");
    assert!(matches!(drive.auth, DriveAuth::StaticToken(_)));

    pairs.push(("RELAY_PERSIST", "false"));
    assert!(matches!(from_pairs(&pairs), Err(ConfigError::Invalid { ref option, .. }) if option == "RELAY_PERSIST"));

    let inline = [
        ("RELAY_SOURCES", "semantic-scholar"),
        ("RELAY_KEYWORDS", "x"),
        ("GOOGLE_DRIVE_FOLDER_ID", "folder-1"),
        (
            "GOOGLE_APPLICATION_CREDENTIALS_JSON",
            r#"{"client_email":"relay@p.iam.gserviceaccount.com","private_key":"pem"}"#,
        ),
    ];
    let cfg = from_pairs(&inline).unwrap();
    assert!(matches!(cfg.drive.unwrap().auth, DriveAuth::ServiceAccount(_)));
}

#[serial_test::serial]
#[test]
fn from_env_reads_process_environment() {
    let keys = [
        "RELAY_SOURCES",
        "RELAY_KEYWORDS",
        "CINII_API_KEY",
        "RELAY_MAX_BATCH_CHARS",
        "DISCORD_WEBHOOK_URL",
    ];
    for k in keys {
        env::remove_var(k);
    }

    env::set_var("RELAY_SOURCES", "cinii");
    env::set_var("RELAY_KEYWORDS", "天文");
    env::set_var("CINII_API_KEY", "app");
    env::set_var("RELAY_MAX_BATCH_CHARS", "0");
    env::set_var("DISCORD_WEBHOOK_URL", "https://discord.com/api/webhooks/1/abc");

    let cfg = RelayConfig::from_env().unwrap();
    assert_eq!(cfg.sources[0].id(), ProviderId::Cinii);
    assert_eq!(cfg.keywords, vec!["天文"]);
    assert_eq!(cfg.max_batch_chars, 0);
    assert!(cfg.discord_webhook.is_some());

    for k in keys {
        env::remove_var(k);
    }
}
