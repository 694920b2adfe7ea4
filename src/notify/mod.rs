pub mod format;
pub mod telegram;

use anyhow::{anyhow, Result};
use metrics::counter;
use std::sync::Arc;

use crate::config::BotConfig;
use crate::quotes::types::RankedQuotes;
use format::ReportFormat;
use telegram::TelegramMessenger;

pub const NO_CHAT_MSG: &str = "No hay CHAT_ID configurado";

/// Outbound text channel (Telegram in production, mocks in tests).
#[async_trait::async_trait]
pub trait Messenger: Send + Sync {
    async fn send_text(&self, chat_id: &str, text: &str) -> Result<()>;
}

/// Formats ranked quotes and delivers them to a chat.
pub struct Notifier {
    messenger: Arc<dyn Messenger>,
    default_chat: Option<String>,
    report: ReportFormat,
}

impl Notifier {
    pub fn new(
        messenger: Arc<dyn Messenger>,
        default_chat: Option<String>,
        report: ReportFormat,
    ) -> Self {
        Self {
            messenger,
            default_chat,
            report,
        }
    }

    pub fn from_config(cfg: &BotConfig) -> Self {
        Self::new(
            Arc::new(telegram_messenger(cfg)),
            cfg.default_chat_id.clone(),
            ReportFormat::new(&cfg.asset, &cfg.fiat, cfg.volume),
        )
    }

    /// Explicit chat wins, then the configured default.
    pub fn resolve_chat(&self, chat: Option<&str>) -> Result<String> {
        chat.map(str::to_string)
            .or_else(|| self.default_chat.clone())
            .ok_or_else(|| anyhow!(NO_CHAT_MSG))
    }

    pub fn render(&self, ranked: &RankedQuotes, timestamp: &str) -> String {
        self.report
            .render(&ranked.best_buy, &ranked.best_sell, timestamp)
    }

    pub async fn send(&self, text: &str, chat: Option<&str>) -> Result<()> {
        let chat_id = self.resolve_chat(chat)?;
        match self.messenger.send_text(&chat_id, text).await {
            Ok(()) => {
                counter!("notify_messages_total").increment(1);
                tracing::debug!(chat = %chat_id, chars = text.chars().count(), "message sent");
                Ok(())
            }
            Err(e) => {
                counter!("notify_errors_total").increment(1);
                Err(e)
            }
        }
    }
}

// sendMessage keeps its own 10 s timeout, independent of quote fetches.
fn telegram_messenger(cfg: &BotConfig) -> TelegramMessenger {
    TelegramMessenger::new(&cfg.telegram_api_base, &cfg.bot_token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait::async_trait]
    impl Messenger for Recorder {
        async fn send_text(&self, chat_id: &str, text: &str) -> Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push((chat_id.to_string(), text.to_string()));
            Ok(())
        }
    }

    fn notifier(default_chat: Option<&str>) -> (Arc<Recorder>, Notifier) {
        let rec = Arc::new(Recorder::default());
        let n = Notifier::new(
            rec.clone(),
            default_chat.map(str::to_string),
            ReportFormat::new("USDT", "BOB", 500),
        );
        (rec, n)
    }

    #[tokio::test]
    async fn explicit_chat_takes_precedence() {
        let (rec, n) = notifier(Some("default"));
        n.send("hi", Some("42")).await.unwrap();
        n.send("again", None).await.unwrap();
        let sent = rec.sent.lock().unwrap();
        assert_eq!(sent[0], ("42".to_string(), "hi".to_string()));
        assert_eq!(sent[1].0, "default");
    }

    #[test]
    fn telegram_timeout_does_not_follow_fetch_timeout() {
        let cfg = BotConfig::from_vars(|k| match k {
            "BOT_TOKEN" => Some("1:t".to_string()),
            "SECRET_PATH" => Some("hook".to_string()),
            "CRON_KEY" => Some("k".to_string()),
            "FETCH_TIMEOUT_SECS" => Some("3".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(cfg.fetch_timeout, Duration::from_secs(3));
        assert_eq!(telegram_messenger(&cfg).timeout(), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn no_chat_anywhere_is_an_error() {
        let (rec, n) = notifier(None);
        let err = n.send("hi", None).await.unwrap_err();
        assert_eq!(err.to_string(), NO_CHAT_MSG);
        assert!(rec.sent.lock().unwrap().is_empty());
    }
}
