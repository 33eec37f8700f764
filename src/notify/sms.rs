use async_trait::async_trait;
use tracing::warn;

use super::{AlertMessage, NotificationChannel};
use crate::errors::Result;

/// SMS stub: no transport is wired up. Every attempted send logs a
/// warning so the drop is visible, rather than pretending delivery
/// succeeded silently.
pub struct SmsChannel;

#[async_trait]
impl NotificationChannel for SmsChannel {
    fn name(&self) -> &'static str {
        "sms"
    }

    async fn send(&self, recipient: &str, message: &AlertMessage) -> Result<()> {
        warn!(
            recipient,
            text = %message.short,
            "sms transport not wired up, notification dropped"
        );
        Ok(())
    }
}
