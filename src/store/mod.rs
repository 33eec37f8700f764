mod memory;

pub use memory::{MemoryAlertStore, MemoryPrefsSource};

use async_trait::async_trait;

use crate::errors::Result;
use crate::models::{Alert, AlertStatus, AlertUpdate, UserPrefs};

/// Durable storage contract for alert records. The engine never performs
/// multi-record transactions; each cycle-visible mutation is an
/// independent single-record write.
#[async_trait]
pub trait AlertStore: Send + Sync {
    async fn find_by_status(&self, status: AlertStatus) -> Result<Vec<Alert>>;

    /// Applies the set fields of `update` to one record and returns the
    /// updated alert, or `NotFound` if no such id exists.
    async fn update_fields(&self, id: &str, update: AlertUpdate) -> Result<Alert>;
}

/// Read-only source of per-user notification preferences (external
/// collaborator data).
#[async_trait]
pub trait UserPrefsSource: Send + Sync {
    async fn prefs_for(&self, user_id: &str) -> Result<UserPrefs>;
}
