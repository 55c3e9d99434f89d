// src/bootstrap.rs
use std::sync::Arc;

use tracing::info;

use crate::batch::Batcher;
use crate::config::{RelayConfig, SourceSettings};
use crate::error::ConfigError;
use crate::ingest::http::build_client;
use crate::ingest::providers::{
    AstronomyProvider, CiniiProvider, OpenWeatherProvider, RedditProvider, SemanticScholarProvider,
    TumblrProvider, XProvider,
};
use crate::ingest::types::{SourceAdapter, SourceQuery};
use crate::notify::DiscordNotifier;
use crate::pipeline::{Orchestrator, SourceJob};
use crate::store::{DriveUploader, JsonFileStore, PathTemplate};

fn adapter_for(settings: &SourceSettings, client: reqwest::Client) -> Arc<dyn SourceAdapter> {
    match settings {
        SourceSettings::Reddit(creds) => Arc::new(RedditProvider::new(creds.clone(), client)),
        SourceSettings::X { bearer_token } => Arc::new(XProvider::new(bearer_token.clone(), client)),
        SourceSettings::Tumblr { api_key } => Arc::new(TumblrProvider::new(api_key.clone(), client)),
        SourceSettings::SemanticScholar { api_key } => {
            Arc::new(SemanticScholarProvider::new(api_key.clone(), client))
        }
        SourceSettings::Cinii { app_id } => Arc::new(CiniiProvider::new(app_id.clone(), client)),
        SourceSettings::OpenWeather { api_key } => {
            Arc::new(OpenWeatherProvider::new(api_key.clone(), client))
        }
        SourceSettings::Astronomy(creds) => Arc::new(AstronomyProvider::new(creds.clone(), client)),
    }
}

/// Wire adapters and sinks from a validated config. Builds no network state
/// beyond the shared HTTP client.
pub fn build_orchestrator(cfg: &RelayConfig) -> Result<Orchestrator, ConfigError> {
    let client = build_client(cfg.http_timeout)?;

    let mut orch = Orchestrator::new(Batcher::new(cfg.max_batch_chars))
        .delete_after_upload(cfg.delete_after_upload);

    for settings in &cfg.sources {
        let adapter = adapter_for(settings, client.clone());
        let mut query = SourceQuery::new(cfg.keywords.clone()).with_max_results(cfg.max_results);
        if adapter.kind().is_snapshot() {
            if let Some(loc) = cfg.location {
                query = query.with_location(loc);
            }
        }
        let window = cfg.window_for(adapter.kind());
        orch = orch.with_job(SourceJob::new(adapter, query).with_window(window));
    }

    if cfg.persist {
        orch = orch.with_store(JsonFileStore::new(PathTemplate::under(&cfg.data_dir)));
    }
    if let Some(url) = &cfg.discord_webhook {
        orch = orch.with_notifier(Arc::new(DiscordNotifier::new(url.clone(), client.clone())));
    }
    if let Some(drive) = &cfg.drive {
        let uploader = DriveUploader::new(drive.auth.clone(), client.clone());
        orch = orch.with_uploader(Arc::new(uploader), drive.folder_id.clone());
    }

    // Safe diagnostics: names and flags only, never credentials
    info!(
        sources = ?cfg.sources.iter().map(|s| s.id().name()).collect::<Vec<_>>(),
        keywords = cfg.keywords.len(),
        max_results = cfg.max_results,
        max_batch_chars = cfg.max_batch_chars,
        persist = cfg.persist,
        discord = cfg.discord_webhook.is_some(),
        drive = cfg.drive.is_some(),
        "relay configured"
    );
    Ok(orch)
}
