use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::{AlertMessage, NotificationChannel};
use crate::errors::{MonitorError, Result};

/// Email transport over an HTTP mail API (Resend-style JSON endpoint).
///
/// No delivery confirmation is awaited beyond the API accepting the send,
/// and there is no retry queue.
pub struct EmailChannel {
    client: Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl EmailChannel {
    pub fn new(
        client: Client,
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        from: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            api_key: api_key.into(),
            from: from.into(),
        }
    }
}

#[async_trait]
impl NotificationChannel for EmailChannel {
    fn name(&self) -> &'static str {
        "email"
    }

    async fn send(&self, recipient: &str, message: &AlertMessage) -> Result<()> {
        let payload = serde_json::json!({
            "from": self.from,
            "to": [recipient],
            "subject": message.subject,
            "text": message.body,
        });

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| MonitorError::notification("email", format!("send failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MonitorError::notification(
                "email",
                format!("mail API returned status {}: {}", status, body),
            ));
        }

        debug!(recipient, "email notification accepted by mail API");
        Ok(())
    }
}
