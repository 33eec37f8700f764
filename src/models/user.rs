use serde::{Deserialize, Serialize};

/// Per-user notification preferences, supplied by an external
/// collaborator and read-only from the engine's perspective. A channel is
/// used only when its opt-in flag is set and an endpoint is resolved.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserPrefs {
    pub user_id: String,
    pub email_enabled: bool,
    pub telegram_enabled: bool,
    pub sms_enabled: bool,
    pub email_address: Option<String>,
    pub telegram_chat_id: Option<i64>,
    pub phone_number: Option<String>,
}

impl UserPrefs {
    /// Fallback for users with no stored preferences: every channel off.
    pub fn disabled(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Self::default()
        }
    }
}
