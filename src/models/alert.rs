use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{MonitorError, Result};

/// Asset class of the monitored symbol. Only crypto has a live price
/// source wired up; the others are extension points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    Crypto,
    Stock,
    Forex,
    Commodity,
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AssetClass::Crypto => "crypto",
            AssetClass::Stock => "stock",
            AssetClass::Forex => "forex",
            AssetClass::Commodity => "commodity",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    PriceAbove,
    PriceBelow,
    PercentageChange,
    VolumeSpike,
}

impl fmt::Display for TriggerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TriggerType::PriceAbove => "price above",
            TriggerType::PriceBelow => "price below",
            TriggerType::PercentageChange => "percentage change",
            TriggerType::VolumeSpike => "volume spike",
        };
        write!(f, "{}", s)
    }
}

/// Lifecycle state of an alert. `Triggered` and `Cancelled` are terminal:
/// the loop only ever reads `Active` alerts and only ever writes the
/// Active -> Triggered transition. Cancellation belongs to the user-facing
/// collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Active,
    Triggered,
    Cancelled,
}

/// Per-alert notification channel flags. Each flag is additionally gated
/// by the owning user's channel opt-in.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ChannelFlags {
    pub email: bool,
    pub telegram: bool,
    pub sms: bool,
}

/// A user-defined price-trigger rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub owner: String,
    pub symbol: String,
    pub asset_class: AssetClass,
    pub trigger_type: TriggerType,
    pub trigger_value: f64,
    /// Last price observed by the monitor loop; seeded from the creation
    /// request, mutated only by the loop afterwards.
    pub current_price: f64,
    pub status: AlertStatus,
    pub channels: ChannelFlags,
    pub last_checked: Option<DateTime<Utc>>,
    /// Set exactly once, on the Active -> Triggered transition.
    pub triggered_at: Option<DateTime<Utc>>,
    /// Free-form, user-supplied; never interpreted by the engine.
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Alert {
    pub fn new(
        owner: impl Into<String>,
        symbol: impl Into<String>,
        asset_class: AssetClass,
        trigger_type: TriggerType,
        trigger_value: f64,
        seed_price: f64,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            owner: owner.into(),
            symbol: symbol.into(),
            asset_class,
            trigger_type,
            trigger_value,
            current_price: seed_price,
            status: AlertStatus::Active,
            channels: ChannelFlags::default(),
            last_checked: None,
            triggered_at: None,
            description: String::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_channels(mut self, channels: ChannelFlags) -> Self {
        self.channels = channels;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            return Err(MonitorError::validation("alert symbol cannot be empty"));
        }
        if !self.trigger_value.is_finite() || self.trigger_value <= 0.0 {
            return Err(MonitorError::validation(format!(
                "trigger value must be a positive number, got {}",
                self.trigger_value
            )));
        }
        Ok(())
    }
}

/// Partial-fields write applied to a single alert record. Every mutation
/// the loop performs is an independent single-record write.
#[derive(Debug, Clone, Default)]
pub struct AlertUpdate {
    pub current_price: Option<f64>,
    pub last_checked: Option<DateTime<Utc>>,
    pub status: Option<AlertStatus>,
    pub triggered_at: Option<DateTime<Utc>>,
}
