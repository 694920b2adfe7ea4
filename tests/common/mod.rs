// tests/common/mod.rs
// Mock quote sources and a recording messenger shared by the integration tests.
#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use p2p_quote_bot::notify::format::ReportFormat;
use p2p_quote_bot::{Aggregator, AppState, BotConfig, Messenger, Notifier, Quote, QuoteSource};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const SECRET: &str = "hook-secret";
pub const CRON_KEY: &str = "cron-key";
pub const DEFAULT_CHAT: &str = "-1001";

pub enum Behavior {
    Quote { ask: f64, bid: f64, ts: i64 },
    Fail,
    Slow(Duration),
    Panic,
}

pub struct MockSource {
    name: String,
    behavior: Behavior,
    pub calls: AtomicUsize,
}

impl MockSource {
    pub fn quote(name: &str, ask: f64, bid: f64) -> Arc<Self> {
        Self::with(name, Behavior::Quote { ask, bid, ts: 1_700_000_000 })
    }

    pub fn failing(name: &str) -> Arc<Self> {
        Self::with(name, Behavior::Fail)
    }

    pub fn with(name: &str, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            behavior,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuoteSource for MockSource {
    async fn fetch_quote(&self, _volume: u32) -> Result<Quote> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Quote { ask, bid, ts } => Ok(Quote {
                source: self.name.clone(),
                ask: *ask,
                bid: *bid,
                observed_at: Utc.timestamp_opt(*ts, 0).unwrap(),
            }),
            Behavior::Fail => Err(anyhow!("{} responded with 503", self.name)),
            Behavior::Slow(d) => {
                tokio::time::sleep(*d).await;
                Ok(Quote {
                    source: self.name.clone(),
                    ask: 1.0,
                    bid: 1.0,
                    observed_at: Utc::now(),
                })
            }
            Behavior::Panic => panic!("mock source blew up"),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Default)]
pub struct RecordingMessenger {
    pub sent: Mutex<Vec<(String, String)>>,
}

impl RecordingMessenger {
    pub fn messages(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_text(&self, chat_id: &str, text: &str) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((chat_id.to_string(), text.to_string()));
        Ok(())
    }
}

pub fn test_config(default_chat: Option<&str>) -> BotConfig {
    let chat = default_chat.map(str::to_string);
    BotConfig::from_vars(|k| match k {
        "BOT_TOKEN" => Some("123:test".to_string()),
        "SECRET_PATH" => Some(SECRET.to_string()),
        "CRON_KEY" => Some(CRON_KEY.to_string()),
        "CHAT_ID" => chat.clone(),
        "REPORT_UTC_OFFSET_HOURS" => Some("-4".to_string()),
        _ => None,
    })
    .expect("test config")
}

pub fn aggregator(sources: &[Arc<MockSource>], timeout: Duration) -> Aggregator {
    let dyn_sources: Vec<Arc<dyn QuoteSource>> = sources
        .iter()
        .map(|s| s.clone() as Arc<dyn QuoteSource>)
        .collect();
    Aggregator::new(dyn_sources, 500, timeout)
}

/// State wired to mocks; returns the messenger so tests can inspect deliveries.
pub fn mock_state(
    sources: &[Arc<MockSource>],
    default_chat: Option<&str>,
) -> (AppState, Arc<RecordingMessenger>) {
    let config = test_config(default_chat);
    let messenger = Arc::new(RecordingMessenger::default());
    let notifier = Notifier::new(
        messenger.clone(),
        config.default_chat_id.clone(),
        ReportFormat::new(&config.asset, &config.fiat, config.volume),
    );
    let state = AppState::new(
        config,
        aggregator(sources, Duration::from_millis(500)),
        notifier,
    );
    (state, messenger)
}
