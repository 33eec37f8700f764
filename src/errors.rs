use thiserror::Error;

use crate::models::AssetClass;

pub type Result<T> = std::result::Result<T, MonitorError>;

/// Error taxonomy for the monitoring engine.
///
/// Everything except `LoopFailure` is recovered inside the cycle: the
/// affected alert (or channel) is skipped and the loop moves on.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("upstream price source unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("no price fetcher wired for asset class '{0}'")]
    NotSupported(AssetClass),

    #[error("alert store write failed: {0}")]
    PersistenceFailure(String),

    #[error("monitor cycle failed: {0}")]
    LoopFailure(String),

    #[error("notification via {channel} failed: {reason}")]
    NotificationFailure {
        channel: &'static str,
        reason: String,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("validation error: {0}")]
    Validation(String),
}

impl MonitorError {
    pub fn upstream(reason: impl Into<String>) -> Self {
        Self::UpstreamUnavailable(reason.into())
    }

    pub fn persistence(reason: impl Into<String>) -> Self {
        Self::PersistenceFailure(reason.into())
    }

    pub fn loop_failure(reason: impl Into<String>) -> Self {
        Self::LoopFailure(reason.into())
    }

    pub fn notification(channel: &'static str, reason: impl Into<String>) -> Self {
        Self::NotificationFailure {
            channel,
            reason: reason.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config(reason.into())
    }

    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation(reason.into())
    }
}
