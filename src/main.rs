//! P2P Quote Bot — Binary Entrypoint
//! Boots the Axum HTTP server: Telegram webhook, scheduled tick, health and metrics.

use p2p_quote_bot::{metrics::Metrics, BotConfig};
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Logs go to stdout; `RUST_LOG` overrides the default filter and
/// `BOT_LOG_JSON=1` switches to JSON lines. A subscriber already installed by
/// the runtime is left in place.
fn enable_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("p2p_quote_bot=info,tower_http=info,warn"));

    let json = std::env::var("BOT_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    let res = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    enable_tracing();

    // Fails start-up when BOT_TOKEN / SECRET_PATH / CRON_KEY are missing.
    let config = BotConfig::from_env()?;
    tracing::info!(config = ?config, "configuration loaded");

    let metrics = Metrics::init()?;
    let router = p2p_quote_bot::app(config)?.merge(metrics.router());

    Ok(router.into())
}
