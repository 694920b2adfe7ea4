// src/scheduler.rs
use std::time::Duration;

use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::api::AppState;
use crate::bot;

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("scheduler_runs_total", "Scheduled price reports attempted.");
    });
}

/// In-process replacement for the external cron hitting `/send`.
/// The first tick fires one full `every` after start-up.
pub fn spawn_price_scheduler(state: AppState, every: Duration) -> JoinHandle<()> {
    ensure_metrics_described();
    tokio::spawn(async move {
        let start = tokio::time::Instant::now() + every;
        let mut ticker = tokio::time::interval_at(start, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            counter!("scheduler_runs_total").increment(1);
            if let Err(e) = bot::broadcast_prices(&state).await {
                tracing::warn!(target: "scheduler", error = %format!("{e:#}"), "scheduled report failed");
            }
        }
    })
}
