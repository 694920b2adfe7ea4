// src/bot.rs
//! Telegram update handling: `/start` and `/precio`.

use anyhow::Result;
use chrono::{FixedOffset, Local, Utc};
use serde::Deserialize;
use std::fmt;

use crate::api::AppState;

pub const HELP_TEXT: &str =
    "Listo ✅ Usa /precio para ver los top 2 de compra y venta por exchange.";

const REPORT_TS_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Price,
    Ignored,
}

impl Command {
    pub fn parse(text: &str) -> Self {
        match text.trim().to_lowercase().as_str() {
            "/start" => Command::Start,
            "/precio" => Command::Price,
            _ => Command::Ignored,
        }
    }
}

// --- subset of the Bot API `Update` object we care about ---

#[derive(Debug, Default, Deserialize)]
pub struct Update {
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub edited_message: Option<Message>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub chat: Option<Chat>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    #[serde(default)]
    pub id: Option<ChatId>,
}

/// Chat ids arrive as integers, but strings are tolerated too.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ChatId {
    Int(i64),
    Str(String),
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatId::Int(i) => write!(f, "{i}"),
            ChatId::Str(s) => f.write_str(s),
        }
    }
}

impl Update {
    /// Lenient parse: anything that is not a recognizable update becomes an empty one.
    pub fn from_slice(body: &[u8]) -> Self {
        match serde_json::from_slice(body) {
            Ok(u) => u,
            Err(e) => {
                tracing::warn!(error = %e, bytes = body.len(), "unparseable webhook update");
                Update::default()
            }
        }
    }

    pub fn message(&self) -> Option<&Message> {
        self.message.as_ref().or(self.edited_message.as_ref())
    }

    pub fn text(&self) -> &str {
        self.message()
            .and_then(|m| m.text.as_deref())
            .unwrap_or_default()
    }

    pub fn chat_id(&self) -> Option<String> {
        self.message()
            .and_then(|m| m.chat.as_ref())
            .and_then(|c| c.id.as_ref())
            .map(ChatId::to_string)
    }
}

/// "now" for the report footer, in the configured offset or server local time.
pub fn report_timestamp(offset: Option<FixedOffset>) -> String {
    match offset {
        Some(off) => Utc::now().with_timezone(&off).format(REPORT_TS_FORMAT).to_string(),
        None => Local::now().format(REPORT_TS_FORMAT).to_string(),
    }
}

/// React to one webhook update. Delivery problems are logged, never returned.
pub async fn handle_update(state: &AppState, update: &Update) -> Command {
    let cmd = Command::parse(update.text());
    let chat = update.chat_id();

    match cmd {
        Command::Start => {
            if let Err(e) = state.notifier.send(HELP_TEXT, chat.as_deref()).await {
                tracing::warn!(error = %format!("{e:#}"), "help reply failed");
            }
        }
        Command::Price => reply_with_prices(state, chat.as_deref()).await,
        Command::Ignored => {
            tracing::debug!(chars = update.text().chars().count(), "ignored update");
        }
    }
    cmd
}

async fn reply_with_prices(state: &AppState, chat: Option<&str>) {
    let outcome: Result<()> = async {
        let text = price_report(state).await?;
        state.notifier.send(&text, chat).await
    }
    .await;

    if let Err(e) = outcome {
        tracing::warn!(error = %format!("{e:#}"), "price reply failed");
        let warning = format!("⚠️ No pude obtener precios ahora: {e}");
        if let Err(e) = state.notifier.send(&warning, chat).await {
            tracing::warn!(error = %format!("{e:#}"), "warning reply failed");
        }
    }
}

/// Aggregate and render the report text.
pub async fn price_report(state: &AppState) -> Result<String> {
    let ranked = state.aggregator.fetch_top2().await?;
    let ts = report_timestamp(state.config.report_utc_offset);
    Ok(state.notifier.render(&ranked, &ts))
}

/// Scheduled-tick path: report to the default chat, errors propagate.
pub async fn broadcast_prices(state: &AppState) -> Result<()> {
    let text = price_report(state).await?;
    state.notifier.send(&text, None).await?;
    tracing::info!("scheduled price report sent");
    Ok(())
}
