// src/quotes/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct Quote {
    pub source: String,           // e.g. "binancep2p"
    pub ask: f64,                 // price a buyer pays
    pub bid: f64,                 // price a seller gets
    pub observed_at: DateTime<Utc>,
}

/// Top candidates per side plus the freshest observation across all retained quotes.
#[derive(Debug, Clone, serde::Serialize, PartialEq)]
pub struct RankedQuotes {
    pub best_buy: Vec<Quote>,
    pub best_sell: Vec<Quote>,
    pub latest: DateTime<Utc>,
}

#[async_trait::async_trait]
pub trait QuoteSource: Send + Sync {
    /// One quote for the reference `volume`. Any error means "skip this source".
    async fn fetch_quote(&self, volume: u32) -> Result<Quote>;
    fn name(&self) -> &str;
}
