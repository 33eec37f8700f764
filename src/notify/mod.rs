mod email;
mod sms;
mod telegram;

pub use email::EmailChannel;
pub use sms::SmsChannel;
pub use telegram::TelegramChannel;

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::errors::Result;
use crate::models::{Alert, UserPrefs};
use crate::utils::formatting::{format_percentage, format_usd, truncate_string};

/// Rendered notification content; each transport picks the form it needs
/// (email uses subject + body, telegram the body, sms the short line).
#[derive(Debug, Clone)]
pub struct AlertMessage {
    pub subject: String,
    pub body: String,
    pub short: String,
}

/// One outbound delivery transport.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    fn name(&self) -> &'static str;

    async fn send(&self, recipient: &str, message: &AlertMessage) -> Result<()>;
}

/// Fans a fired alert out to the user's enabled channels.
///
/// A channel is attempted only when the alert's flag AND the user's
/// opt-in are both set and an endpoint is resolved. Failures are logged
/// per channel and never propagate: one channel failing must not block
/// the others, and nothing here can roll back the already-committed
/// `Triggered` status. Delivery is at-most-one-attempt; there is no retry
/// queue.
#[derive(Clone, Default)]
pub struct NotificationDispatcher {
    email: Option<Arc<dyn NotificationChannel>>,
    telegram: Option<Arc<dyn NotificationChannel>>,
    sms: Option<Arc<dyn NotificationChannel>>,
}

impl NotificationDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_email(mut self, channel: Arc<dyn NotificationChannel>) -> Self {
        self.email = Some(channel);
        self
    }

    pub fn with_telegram(mut self, channel: Arc<dyn NotificationChannel>) -> Self {
        self.telegram = Some(channel);
        self
    }

    pub fn with_sms(mut self, channel: Arc<dyn NotificationChannel>) -> Self {
        self.sms = Some(channel);
        self
    }

    /// Called only on a fire transition, after the status write committed.
    pub async fn dispatch(&self, alert: &Alert, prefs: &UserPrefs, current_price: f64) {
        let message = build_message(alert, current_price);
        let mut sent = 0usize;
        let mut failed = 0usize;

        let telegram_chat = prefs.telegram_chat_id.map(|id| id.to_string());

        let attempts: [(bool, bool, &Option<Arc<dyn NotificationChannel>>, Option<&str>); 3] = [
            (
                alert.channels.email,
                prefs.email_enabled,
                &self.email,
                prefs.email_address.as_deref(),
            ),
            (
                alert.channels.telegram,
                prefs.telegram_enabled,
                &self.telegram,
                telegram_chat.as_deref(),
            ),
            (
                alert.channels.sms,
                prefs.sms_enabled,
                &self.sms,
                prefs.phone_number.as_deref(),
            ),
        ];

        for (alert_flag, user_opt_in, channel, endpoint) in attempts {
            if !alert_flag || !user_opt_in {
                continue;
            }
            let Some(channel) = channel else {
                warn!(alert_id = %alert.id, "channel enabled but no transport wired");
                continue;
            };
            let Some(recipient) = endpoint else {
                warn!(
                    alert_id = %alert.id,
                    owner = %alert.owner,
                    channel = channel.name(),
                    "channel enabled but no endpoint on file"
                );
                continue;
            };

            match channel.send(recipient, &message).await {
                Ok(()) => sent += 1,
                Err(e) => {
                    failed += 1;
                    error!(
                        alert_id = %alert.id,
                        channel = channel.name(),
                        "notification delivery failed: {}",
                        e
                    );
                }
            }
        }

        info!(
            alert_id = %alert.id,
            symbol = %alert.symbol,
            sent,
            failed,
            "alert notifications dispatched"
        );
    }
}

fn build_message(alert: &Alert, current_price: f64) -> AlertMessage {
    let previous = alert.current_price;
    let delta = current_price - previous;
    let delta_percent = if previous.is_finite() && previous != 0.0 {
        delta / previous * 100.0
    } else {
        0.0
    };

    let subject = format!("Price alert: {} {}", alert.symbol, alert.trigger_type);

    let mut body = format!(
        "🔔 Price alert fired: {} ({})\n\
         Condition: {} {}\n\
         Current price: {}\n\
         Change since last check: {} ({:+.2})",
        alert.symbol,
        alert.asset_class,
        alert.trigger_type,
        alert.trigger_value,
        format_usd(current_price),
        format_percentage(delta_percent),
        delta,
    );
    if !alert.description.is_empty() {
        body.push_str(&format!("\nNote: {}", alert.description));
    }
    body.push_str(&format!(
        "\nTime: {}",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));

    let short = truncate_string(
        &format!(
            "{} alert: {} now {} ({})",
            alert.symbol,
            alert.trigger_type,
            format_usd(current_price),
            format_percentage(delta_percent)
        ),
        160,
    );

    AlertMessage {
        subject,
        body,
        short,
    }
}
