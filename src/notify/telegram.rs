use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::{AlertMessage, NotificationChannel};
use crate::errors::{MonitorError, Result};

/// Telegram transport posting directly to the Bot API `sendMessage`
/// endpoint; the recipient is the chat id.
pub struct TelegramChannel {
    client: Client,
    bot_token: String,
}

impl TelegramChannel {
    pub fn new(client: Client, bot_token: impl Into<String>) -> Self {
        Self {
            client,
            bot_token: bot_token.into(),
        }
    }
}

#[async_trait]
impl NotificationChannel for TelegramChannel {
    fn name(&self) -> &'static str {
        "telegram"
    }

    async fn send(&self, recipient: &str, message: &AlertMessage) -> Result<()> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.bot_token);
        let payload = serde_json::json!({
            "chat_id": recipient,
            "text": message.body,
        });

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| MonitorError::notification("telegram", format!("send failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MonitorError::notification(
                "telegram",
                format!("Bot API returned status {}: {}", status, body),
            ));
        }

        debug!(chat_id = recipient, "telegram notification sent");
        Ok(())
    }
}
