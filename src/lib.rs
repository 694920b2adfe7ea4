// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod bot;
pub mod config;
pub mod metrics;
pub mod notify;
pub mod quotes;
pub mod scheduler;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::config::BotConfig;
pub use crate::notify::{Messenger, Notifier};
pub use crate::quotes::types::{Quote, QuoteSource, RankedQuotes};
pub use crate::quotes::Aggregator;

use tracing::info;

/// Build the production router (without `/metrics`) from a loaded config.
/// Starts the in-process scheduler when `TICK_INTERVAL_SECS` is set.
pub fn app(config: BotConfig) -> anyhow::Result<axum::Router> {
    let state = AppState::from_config(config)?;

    info!(
        sources = ?state.aggregator.source_names(),
        volume = state.aggregator.volume(),
        default_chat = state.config.default_chat_id.is_some(),
        "quote bot configured"
    );

    if let Some(every) = state.config.tick_interval {
        info!(every_secs = every.as_secs(), "in-process scheduler enabled");
        scheduler::spawn_price_scheduler(state.clone(), every);
    }

    Ok(router(state))
}
