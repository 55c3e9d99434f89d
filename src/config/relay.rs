// src/config/relay.rs
//! Run configuration, read once from the environment and validated before any
//! network call.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::batch::DEFAULT_MAX_CHARS;
use crate::config::keywords::{clean_list, load_keywords_from, split_list};
use crate::error::ConfigError;
use crate::ingest::http::DEFAULT_TIMEOUT_SECS;
use crate::ingest::providers::{AstronomyCredentials, ProviderId, RedditCredentials};
use crate::ingest::types::{GeoPoint, SourceKind, DEFAULT_MAX_RESULTS};
use crate::ingest::window::WindowSpec;
use crate::store::google_auth::{DriveAuth, ServiceAccountKey};

pub const DEFAULT_DATA_DIR: &str = "data";

/// Credentials of one enabled source.
#[derive(Debug, Clone)]
pub enum SourceSettings {
    Reddit(RedditCredentials),
    X { bearer_token: String },
    Tumblr { api_key: String },
    SemanticScholar { api_key: Option<String> },
    Cinii { app_id: String },
    OpenWeather { api_key: String },
    Astronomy(AstronomyCredentials),
}

impl SourceSettings {
    pub fn id(&self) -> ProviderId {
        match self {
            SourceSettings::Reddit(_) => ProviderId::Reddit,
            SourceSettings::X { .. } => ProviderId::X,
            SourceSettings::Tumblr { .. } => ProviderId::Tumblr,
            SourceSettings::SemanticScholar { .. } => ProviderId::SemanticScholar,
            SourceSettings::Cinii { .. } => ProviderId::Cinii,
            SourceSettings::OpenWeather { .. } => ProviderId::OpenWeather,
            SourceSettings::Astronomy(_) => ProviderId::Astronomy,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DriveSettings {
    pub folder_id: String,
    pub auth: DriveAuth,
}

/// Immutable for the duration of a run.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub sources: Vec<SourceSettings>,
    pub keywords: Vec<String>,
    /// `None` picks the per-kind default.
    pub window: Option<WindowSpec>,
    pub max_results: usize,
    pub max_batch_chars: usize,
    pub http_timeout: Duration,
    pub data_dir: PathBuf,
    pub persist: bool,
    pub delete_after_upload: bool,
    pub location: Option<GeoPoint>,
    pub discord_webhook: Option<String>,
    pub drive: Option<DriveSettings>,
}

/// Previous UTC day for posts, current UTC day for snapshots. Papers often
/// carry only a year or month, so they get the last two calendar years.
pub fn default_window(kind: SourceKind) -> WindowSpec {
    match kind {
        SourceKind::WeatherSnapshot | SourceKind::MoonSnapshot => WindowSpec::CurrentDay,
        SourceKind::AcademicPaper => WindowSpec::RecentYears,
        SourceKind::Social | SourceKind::TaggedBlog => WindowSpec::PreviousDay,
    }
}

impl RelayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| -> Option<String> {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |key: &str| get(key).ok_or_else(|| ConfigError::missing(key));

        // --- sources ---
        let raw_sources = require("RELAY_SOURCES")?;
        let mut ids: Vec<ProviderId> = Vec::new();
        for name in split_list(&raw_sources) {
            let id: ProviderId = name.parse()?;
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        if ids.is_empty() {
            return Err(ConfigError::missing("RELAY_SOURCES"));
        }

        let mut sources = Vec::with_capacity(ids.len());
        for id in &ids {
            let settings = match id {
                ProviderId::Reddit => SourceSettings::Reddit(RedditCredentials {
                    client_id: require("REDDIT_CLIENT_ID")?,
                    client_secret: require("REDDIT_CLIENT_SECRET")?,
                    user_agent: require("REDDIT_USER_AGENT")?,
                }),
                ProviderId::X => SourceSettings::X {
                    bearer_token: require("BEARER_TOKEN")?,
                },
                ProviderId::Tumblr => SourceSettings::Tumblr {
                    api_key: require("TUMBLR_API_KEY")?,
                },
                ProviderId::SemanticScholar => SourceSettings::SemanticScholar {
                    api_key: get("SEMANTIC_SCHOLAR_API_KEY"),
                },
                ProviderId::Cinii => SourceSettings::Cinii {
                    app_id: require("CINII_API_KEY")?,
                },
                ProviderId::OpenWeather => SourceSettings::OpenWeather {
                    api_key: require("OPENWEATHER_API_KEY")?,
                },
                ProviderId::Astronomy => SourceSettings::Astronomy(AstronomyCredentials {
                    application_id: require("ASTRONOMY_APPLICATION_ID")?,
                    application_secret: get("ASTRONOMY_APPLICATION_SECRET")
                        .or_else(|| get("ASTRONOMY_APPLICATION_SEACRET"))
                        .ok_or_else(|| ConfigError::missing("ASTRONOMY_APPLICATION_SECRET"))?,
                }),
            };
            sources.push(settings);
        }

        // --- keywords ---
        let mut keywords = get("RELAY_KEYWORDS")
            .map(|v| split_list(&v))
            .unwrap_or_default();
        if let Some(path) = get("RELAY_KEYWORDS_PATH") {
            let from_file = load_keywords_from(Path::new(&path))
                .map_err(|e| ConfigError::invalid("RELAY_KEYWORDS_PATH", format!("{e:#}")))?;
            keywords = clean_list(keywords.into_iter().chain(from_file));
        }
        if keywords.is_empty() && ids.iter().any(ProviderId::needs_keywords) {
            return Err(ConfigError::missing("RELAY_KEYWORDS"));
        }

        // --- location ---
        let lat = get("LATITUDE");
        let lon = get("LONGITUDE").or_else(|| get("LONGTITUDE"));
        let location = match (lat, lon) {
            (Some(lat), Some(lon)) => Some(GeoPoint {
                lat: parse_coord("LATITUDE", &lat, 90.0)?,
                lon: parse_coord("LONGITUDE", &lon, 180.0)?,
            }),
            (Some(_), None) => return Err(ConfigError::missing("LONGITUDE")),
            (None, Some(_)) => return Err(ConfigError::missing("LATITUDE")),
            (None, None) => None,
        };
        if location.is_none() && ids.iter().any(|id| id.kind().is_snapshot()) {
            return Err(ConfigError::missing("LATITUDE"));
        }

        // --- run knobs ---
        let window: Option<WindowSpec> = get("RELAY_WINDOW").map(|v| v.parse()).transpose()?;
        let max_results = parse_num("RELAY_MAX_RESULTS", get("RELAY_MAX_RESULTS"), DEFAULT_MAX_RESULTS)?;
        if max_results == 0 {
            return Err(ConfigError::invalid("RELAY_MAX_RESULTS", "must be at least 1"));
        }
        let max_batch_chars =
            parse_num("RELAY_MAX_BATCH_CHARS", get("RELAY_MAX_BATCH_CHARS"), DEFAULT_MAX_CHARS)?;
        let timeout_secs = parse_num(
            "RELAY_HTTP_TIMEOUT_SECS",
            get("RELAY_HTTP_TIMEOUT_SECS"),
            DEFAULT_TIMEOUT_SECS,
        )?;
        if timeout_secs == 0 {
            return Err(ConfigError::invalid("RELAY_HTTP_TIMEOUT_SECS", "must be at least 1"));
        }
        let data_dir = PathBuf::from(get("RELAY_DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.into()));
        let persist = parse_bool("RELAY_PERSIST", get("RELAY_PERSIST"), true)?;
        let delete_after_upload =
            parse_bool("RELAY_DELETE_AFTER_UPLOAD", get("RELAY_DELETE_AFTER_UPLOAD"), false)?;

        // --- sinks ---
        let discord_webhook = get("DISCORD_WEBHOOK_URL");
        if let Some(url) = &discord_webhook {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(ConfigError::invalid("DISCORD_WEBHOOK_URL", "not an http(s) URL"));
            }
        }

        let drive = match get("GOOGLE_DRIVE_FOLDER_ID") {
            None => None,
            Some(folder_id) => {
                if !persist {
                    return Err(ConfigError::invalid(
                        "RELAY_PERSIST",
                        "uploads to GOOGLE_DRIVE_FOLDER_ID need persisted files",
                    ));
                }
                let auth = if let Some(inline) = get("GOOGLE_APPLICATION_CREDENTIALS_JSON") {
                    let key = ServiceAccountKey::from_json(&inline).map_err(|e| {
                        ConfigError::invalid("GOOGLE_APPLICATION_CREDENTIALS_JSON", e.to_string())
                    })?;
                    DriveAuth::ServiceAccount(key)
                } else if let Some(path) = get("GOOGLE_APPLICATION_CREDENTIALS") {
                    let key = ServiceAccountKey::from_file(Path::new(&path)).map_err(|e| {
                        ConfigError::invalid("GOOGLE_APPLICATION_CREDENTIALS", format!("{e:#}"))
                    })?;
                    DriveAuth::ServiceAccount(key)
                } else if let Some(token) = get("GOOGLE_DRIVE_ACCESS_TOKEN") {
                    DriveAuth::StaticToken(token)
                } else {
                    return Err(ConfigError::missing("GOOGLE_APPLICATION_CREDENTIALS"));
                };
                Some(DriveSettings { folder_id, auth })
            }
        };

        Ok(Self {
            sources,
            keywords,
            window,
            max_results,
            max_batch_chars,
            http_timeout: Duration::from_secs(timeout_secs),
            data_dir,
            persist,
            delete_after_upload,
            location,
            discord_webhook,
            drive,
        })
    }

    pub fn window_for(&self, kind: SourceKind) -> WindowSpec {
        self.window.unwrap_or_else(|| default_window(kind))
    }
}

fn parse_num<T: std::str::FromStr>(option: &str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(v) => v
            .parse()
            .map_err(|_| ConfigError::invalid(option, format!("expected a non-negative integer, got {v:?}"))),
    }
}

fn parse_bool(option: &str, raw: Option<String>, default: bool) -> Result<bool, ConfigError> {
    match raw.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None => Ok(default),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => Err(ConfigError::invalid(option, format!("expected true/false, got {other:?}"))),
    }
}

fn parse_coord(option: &str, raw: &str, limit: f64) -> Result<f64, ConfigError> {
    let v: f64 = raw
        .parse()
        .map_err(|_| ConfigError::invalid(option, format!("not a number: {raw:?}")))?;
    if !v.is_finite() || v.abs() > limit {
        return Err(ConfigError::invalid(option, format!("{v} is outside ±{limit}")));
    }
    Ok(v)
}
