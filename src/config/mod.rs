// src/config/mod.rs
//! Process-wide configuration, read once at start-up and shared through `Arc`.

pub mod sources;

use anyhow::{anyhow, bail, Context, Result};
use chrono::FixedOffset;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_BOT_TOKEN: &str = "BOT_TOKEN";
pub const ENV_SECRET_PATH: &str = "SECRET_PATH";
pub const ENV_CRON_KEY: &str = "CRON_KEY";
pub const ENV_CHAT_ID: &str = "CHAT_ID";
pub const ENV_QUOTE_VOLUME: &str = "QUOTE_VOLUME";
pub const ENV_QUOTE_ASSET: &str = "QUOTE_ASSET";
pub const ENV_QUOTE_FIAT: &str = "QUOTE_FIAT";
pub const ENV_QUOTE_API_BASE: &str = "QUOTE_API_BASE";
pub const ENV_TELEGRAM_API_BASE: &str = "TELEGRAM_API_BASE";
pub const ENV_FETCH_TIMEOUT_SECS: &str = "FETCH_TIMEOUT_SECS";
pub const ENV_QUOTE_SOURCES: &str = "QUOTE_SOURCES";
pub const ENV_QUOTE_SOURCES_PATH: &str = "QUOTE_SOURCES_PATH";
pub const ENV_REPORT_UTC_OFFSET_HOURS: &str = "REPORT_UTC_OFFSET_HOURS";
pub const ENV_TICK_INTERVAL_SECS: &str = "TICK_INTERVAL_SECS";

pub const DEFAULT_VOLUME: u32 = 500;
pub const DEFAULT_ASSET: &str = "USDT";
pub const DEFAULT_FIAT: &str = "BOB";
pub const DEFAULT_QUOTE_API_BASE: &str = "https://criptoya.com/api";
pub const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

const RESERVED_PATHS: &[&str] = &["send", "metrics"];

#[derive(Clone)]
pub struct BotConfig {
    pub bot_token: String,
    /// Webhook path without the leading slash.
    pub secret_path: String,
    pub cron_key: String,
    pub default_chat_id: Option<String>,
    pub volume: u32,
    pub asset: String,
    pub fiat: String,
    pub quote_api_base: String,
    pub telegram_api_base: String,
    pub fetch_timeout: Duration,
    pub sources: Vec<String>,
    /// Offset used for the report timestamp; `None` means server local time.
    pub report_utc_offset: Option<FixedOffset>,
    pub tick_interval: Option<Duration>,
}

impl BotConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|k| std::env::var(k).ok())
    }

    /// Build configuration from any key lookup. Empty values count as unset.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| {
            lookup(k)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut missing = Vec::new();
        let mut required = |k: &'static str| {
            let v = get(k);
            if v.is_none() {
                missing.push(k);
            }
            v.unwrap_or_default()
        };
        let bot_token = required(ENV_BOT_TOKEN);
        let secret_path = required(ENV_SECRET_PATH);
        let cron_key = required(ENV_CRON_KEY);
        if !missing.is_empty() {
            bail!(
                "Faltan variables de entorno obligatorias: {}",
                missing.join(", ")
            );
        }

        let secret_path = secret_path.trim_start_matches('/').to_string();
        if secret_path.is_empty() {
            bail!("{ENV_SECRET_PATH} must not be just '/'");
        }
        // Route syntax characters and the fixed routes cannot be used as the webhook path.
        if secret_path.contains(['{', '}', '*']) || RESERVED_PATHS.contains(&secret_path.as_str())
        {
            bail!("{ENV_SECRET_PATH} collides with a built-in route");
        }
        if secret_path
            .split('/')
            .any(|seg| seg.is_empty() || seg.starts_with(':'))
        {
            bail!("{ENV_SECRET_PATH} has an empty or ':'-prefixed segment");
        }

        let volume = match get(ENV_QUOTE_VOLUME) {
            Some(v) => v
                .parse::<u32>()
                .with_context(|| format!("{ENV_QUOTE_VOLUME}={v} is not a whole number"))?,
            None => DEFAULT_VOLUME,
        };

        let fetch_timeout_secs = match get(ENV_FETCH_TIMEOUT_SECS) {
            Some(v) => v
                .parse::<u64>()
                .with_context(|| format!("{ENV_FETCH_TIMEOUT_SECS}={v} is not a number"))?,
            None => DEFAULT_FETCH_TIMEOUT_SECS,
        };
        if fetch_timeout_secs == 0 {
            bail!("{ENV_FETCH_TIMEOUT_SECS} must be at least 1");
        }

        let sources = if let Some(csv) = get(ENV_QUOTE_SOURCES) {
            sources::parse_sources_csv(&csv)
        } else if let Some(p) = get(ENV_QUOTE_SOURCES_PATH) {
            sources::load_sources_from(&PathBuf::from(p))?
        } else {
            sources::default_sources()
        };
        if sources.is_empty() {
            bail!("quote source list is empty");
        }

        let report_utc_offset = get(ENV_REPORT_UTC_OFFSET_HOURS)
            .map(|v| parse_offset_hours(&v))
            .transpose()?;

        let tick_interval = match get(ENV_TICK_INTERVAL_SECS) {
            Some(v) => {
                let secs = v
                    .parse::<u64>()
                    .with_context(|| format!("{ENV_TICK_INTERVAL_SECS}={v} is not a number"))?;
                (secs > 0).then(|| Duration::from_secs(secs))
            }
            None => None,
        };

        Ok(Self {
            bot_token,
            secret_path,
            cron_key,
            default_chat_id: get(ENV_CHAT_ID),
            volume,
            asset: get(ENV_QUOTE_ASSET).unwrap_or_else(|| DEFAULT_ASSET.to_string()),
            fiat: get(ENV_QUOTE_FIAT).unwrap_or_else(|| DEFAULT_FIAT.to_string()),
            quote_api_base: get(ENV_QUOTE_API_BASE)
                .unwrap_or_else(|| DEFAULT_QUOTE_API_BASE.to_string()),
            telegram_api_base: get(ENV_TELEGRAM_API_BASE)
                .unwrap_or_else(|| DEFAULT_TELEGRAM_API_BASE.to_string()),
            fetch_timeout: Duration::from_secs(fetch_timeout_secs),
            sources,
            report_utc_offset,
            tick_interval,
        })
    }
}

fn parse_offset_hours(raw: &str) -> Result<FixedOffset> {
    let hours: f64 = raw
        .parse()
        .with_context(|| format!("{ENV_REPORT_UTC_OFFSET_HOURS}={raw} is not a number"))?;
    let secs = (hours * 3600.0).round();
    if !secs.is_finite() {
        bail!("{ENV_REPORT_UTC_OFFSET_HOURS}={raw} is out of range");
    }
    FixedOffset::east_opt(secs as i32)
        .ok_or_else(|| anyhow!("{ENV_REPORT_UTC_OFFSET_HOURS}={raw} is out of range"))
}

// Secrets stay out of logs: only their length is shown.
impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("bot_token_len", &self.bot_token.len())
            .field("secret_path_len", &self.secret_path.len())
            .field("cron_key_len", &self.cron_key.len())
            .field("default_chat_id", &self.default_chat_id)
            .field("volume", &self.volume)
            .field("asset", &self.asset)
            .field("fiat", &self.fiat)
            .field("quote_api_base", &self.quote_api_base)
            .field("telegram_api_base", &self.telegram_api_base)
            .field("fetch_timeout", &self.fetch_timeout)
            .field("sources", &self.sources)
            .field("report_utc_offset", &self.report_utc_offset)
            .field("tick_interval", &self.tick_interval)
            .finish()
    }
}
