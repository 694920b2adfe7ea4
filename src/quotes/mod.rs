// src/quotes/mod.rs
pub mod criptoya;
pub mod types;

use crate::config::BotConfig;
use crate::quotes::criptoya::CriptoyaSource;
use crate::quotes::types::{Quote, QuoteSource, RankedQuotes};
use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Candidates kept per side.
pub const TOP_N: usize = 2;

/// `time` values at or above this are milliseconds, below it seconds.
pub const MILLIS_THRESHOLD: f64 = 1_000_000_000_000.0;

pub const NO_QUOTES_MSG: &str = "Sin cotizaciones disponibles en exchanges.";

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("quote_fetch_total", "Quote fetches attempted, per source.");
        describe_counter!(
            "quote_source_errors_total",
            "Sources skipped due to error, timeout, bad status or empty quote."
        );
        describe_counter!(
            "quote_aggregation_failures_total",
            "Aggregations where no source returned usable data."
        );
        describe_histogram!("quote_fetch_ms", "Per-source fetch time in milliseconds.");
        describe_gauge!("quote_last_run_ts", "Unix ts of the last aggregation.");
    });
}

/// Convert a provider `time` field (seconds or milliseconds) to a UTC instant.
/// Non-finite or out-of-range values map to the Unix epoch.
pub fn timestamp_to_utc(t: f64) -> DateTime<Utc> {
    if !t.is_finite() {
        return DateTime::<Utc>::UNIX_EPOCH;
    }
    let millis = if t >= MILLIS_THRESHOLD { t } else { t * 1000.0 };
    DateTime::from_timestamp_millis(millis.round() as i64).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Rank retained quotes. Sorting is stable, so equal prices keep source order.
pub fn rank(mut quotes: Vec<Quote>, top_n: usize) -> Result<RankedQuotes> {
    quotes.retain(|q| q.ask > 0.0 || q.bid > 0.0);

    let Some(latest) = quotes.iter().map(|q| q.observed_at).max() else {
        bail!(NO_QUOTES_MSG);
    };

    let mut best_buy: Vec<Quote> = quotes.iter().filter(|q| q.ask > 0.0).cloned().collect();
    best_buy.sort_by(|a, b| a.ask.total_cmp(&b.ask));
    best_buy.truncate(top_n);

    let mut best_sell: Vec<Quote> = quotes.into_iter().filter(|q| q.bid > 0.0).collect();
    best_sell.sort_by(|a, b| b.bid.total_cmp(&a.bid));
    best_sell.truncate(top_n);

    Ok(RankedQuotes {
        best_buy,
        best_sell,
        latest,
    })
}

/// Fans out one fetch per source and ranks whatever comes back.
pub struct Aggregator {
    sources: Vec<Arc<dyn QuoteSource>>,
    volume: u32,
    timeout: Duration,
}

impl Aggregator {
    pub fn new(sources: Vec<Arc<dyn QuoteSource>>, volume: u32, timeout: Duration) -> Self {
        Self {
            sources,
            volume,
            timeout,
        }
    }

    /// CriptoYa sources for every configured exchange, sharing one HTTP client.
    pub fn from_config(cfg: &BotConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building quote http client")?;

        let sources = cfg
            .sources
            .iter()
            .map(|id| {
                let src = CriptoyaSource::new(
                    id,
                    &cfg.quote_api_base,
                    &cfg.asset,
                    &cfg.fiat,
                    client.clone(),
                )
                .with_timeout(cfg.fetch_timeout);
                Arc::new(src) as Arc<dyn QuoteSource>
            })
            .collect();

        Ok(Self::new(sources, cfg.volume, cfg.fetch_timeout))
    }

    pub fn volume(&self) -> u32 {
        self.volume
    }

    pub fn source_names(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.name().to_string()).collect()
    }

    /// Fetch every source concurrently and wait for all of them. Failed,
    /// slow or empty sources are dropped; the rest keep source-list order.
    pub async fn collect(&self) -> Vec<Quote> {
        ensure_metrics_described();

        let mut handles = Vec::with_capacity(self.sources.len());
        for src in &self.sources {
            let src = Arc::clone(src);
            let volume = self.volume;
            let per_source = self.timeout;

            handles.push(tokio::spawn(async move {
                let t0 = Instant::now();
                let res = match tokio::time::timeout(per_source, src.fetch_quote(volume)).await {
                    Ok(r) => r,
                    Err(_) => Err(anyhow!("timed out after {per_source:?}")),
                };
                histogram!("quote_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
                res
            }));
        }

        let mut quotes = Vec::with_capacity(handles.len());
        for (src, handle) in self.sources.iter().zip(handles) {
            let name = src.name().to_string();
            counter!("quote_fetch_total", "source" => name.clone()).increment(1);
            match handle.await {
                Ok(Ok(q)) => quotes.push(q),
                Ok(Err(e)) => {
                    tracing::warn!(source = %name, error = %format!("{e:#}"), "quote source skipped");
                    counter!("quote_source_errors_total", "source" => name).increment(1);
                }
                Err(e) => {
                    tracing::warn!(source = %name, error = ?e, "quote task failed");
                    counter!("quote_source_errors_total", "source" => name).increment(1);
                }
            }
        }

        gauge!("quote_last_run_ts").set(Utc::now().timestamp() as f64);
        quotes
    }

    /// Best two quotes to buy (lowest ask) and to sell (highest bid).
    pub async fn fetch_top2(&self) -> Result<RankedQuotes> {
        let quotes = self.collect().await;
        let retained = quotes.len();
        match rank(quotes, TOP_N) {
            Ok(ranked) => {
                tracing::info!(
                    retained,
                    sources = self.sources.len(),
                    latest = %ranked.latest,
                    "quotes aggregated"
                );
                Ok(ranked)
            }
            Err(e) => {
                counter!("quote_aggregation_failures_total").increment(1);
                tracing::warn!(sources = self.sources.len(), "no usable quotes");
                Err(e)
            }
        }
    }
}
