use anyhow::{Context, Result};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use super::Messenger;

/// Telegram Bot API `sendMessage` client.
#[derive(Clone)]
pub struct TelegramMessenger {
    endpoint: String,
    client: Client,
    timeout: Duration,
}

impl TelegramMessenger {
    pub fn new(api_base: &str, bot_token: &str) -> Self {
        Self {
            endpoint: format!(
                "{}/bot{}/sendMessage",
                api_base.trim_end_matches('/'),
                bot_token
            ),
            client: Client::new(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

#[async_trait::async_trait]
impl Messenger for TelegramMessenger {
    async fn send_text(&self, chat_id: &str, text: &str) -> Result<()> {
        self.client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&SendMessage { chat_id, text })
            .send()
            .await
            .context("telegram sendMessage")?
            .error_for_status()
            .context("telegram non-2xx")?;
        Ok(())
    }
}
