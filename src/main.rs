//! daily-relay: one run of fetch → filter → normalize → batch → deliver, then exit.
//!
//! Configuration comes from the environment (and `.env` in development).

use std::process::ExitCode;

use daily_relay::{build_orchestrator, RelayConfig};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// `RELAY_LOG_FORMAT=json` switches to one JSON object per event.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("daily_relay=info,warn"));

    let json = std::env::var("RELAY_LOG_FORMAT")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op when the file is absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = match RelayConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(error = %e, "configuration rejected");
            eprintln!("daily-relay: {e}");
            return ExitCode::from(2);
        }
    };
    let orchestrator = match build_orchestrator(&cfg) {
        Ok(o) => o,
        Err(e) => {
            tracing::error!(error = %e, "could not build relay");
            eprintln!("daily-relay: {e}");
            return ExitCode::from(2);
        }
    };

    let report = orchestrator.run(chrono::Utc::now()).await;
    report.log_summary();

    if report.any_failed() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
