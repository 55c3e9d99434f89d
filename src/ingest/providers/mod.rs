// src/ingest/providers/mod.rs
//! One adapter per upstream API. All of them implement `SourceAdapter`.

pub mod astronomy;
pub mod cinii;
pub mod openweather;
pub mod reddit;
pub mod semantic_scholar;
pub mod tumblr;
pub mod x;

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::ingest::types::SourceKind;

pub use astronomy::{AstronomyCredentials, AstronomyProvider};
pub use cinii::CiniiProvider;
pub use openweather::OpenWeatherProvider;
pub use reddit::{RedditCredentials, RedditProvider};
pub use semantic_scholar::SemanticScholarProvider;
pub use tumblr::TumblrProvider;
pub use x::XProvider;

/// The adapters a run can enable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProviderId {
    Reddit,
    X,
    Tumblr,
    SemanticScholar,
    Cinii,
    OpenWeather,
    Astronomy,
}

impl ProviderId {
    pub const ALL: [ProviderId; 7] = [
        ProviderId::Reddit,
        ProviderId::X,
        ProviderId::Tumblr,
        ProviderId::SemanticScholar,
        ProviderId::Cinii,
        ProviderId::OpenWeather,
        ProviderId::Astronomy,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ProviderId::Reddit => "reddit",
            ProviderId::X => "x",
            ProviderId::Tumblr => "tumblr",
            ProviderId::SemanticScholar => "semantic-scholar",
            ProviderId::Cinii => "cinii",
            ProviderId::OpenWeather => "openweather",
            ProviderId::Astronomy => "astronomy",
        }
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            ProviderId::Reddit | ProviderId::X => SourceKind::Social,
            ProviderId::Tumblr => SourceKind::TaggedBlog,
            ProviderId::SemanticScholar | ProviderId::Cinii => SourceKind::AcademicPaper,
            ProviderId::OpenWeather => SourceKind::WeatherSnapshot,
            ProviderId::Astronomy => SourceKind::MoonSnapshot,
        }
    }

    /// Keyword searches need `RELAY_KEYWORDS`; snapshots need a location instead.
    pub fn needs_keywords(&self) -> bool {
        !self.kind().is_snapshot()
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProviderId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let v = s.trim().to_ascii_lowercase();
        match v.as_str() {
            "twitter" => Ok(ProviderId::X),
            "semanticscholar" | "semantic_scholar" => Ok(ProviderId::SemanticScholar),
            "weather" => Ok(ProviderId::OpenWeather),
            "moon" => Ok(ProviderId::Astronomy),
            _ => ProviderId::ALL
                .iter()
                .copied()
                .find(|p| p.name() == v)
                .ok_or_else(|| ConfigError::invalid("RELAY_SOURCES", format!("unknown source {s:?}"))),
        }
    }
}
