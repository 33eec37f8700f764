use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use super::{AlertStore, UserPrefsSource};
use crate::errors::{MonitorError, Result};
use crate::models::{Alert, AlertStatus, AlertUpdate, UserPrefs};

/// In-memory alert store used by the default wiring and by tests.
/// A production deployment substitutes its own `AlertStore` behind the
/// same trait.
#[derive(Clone, Default)]
pub struct MemoryAlertStore {
    alerts: Arc<RwLock<HashMap<String, Alert>>>,
}

impl MemoryAlertStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, alert: Alert) {
        let mut alerts = self.alerts.write().await;
        alerts.insert(alert.id.clone(), alert);
    }

    pub async fn get(&self, id: &str) -> Option<Alert> {
        let alerts = self.alerts.read().await;
        alerts.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.alerts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.alerts.read().await.is_empty()
    }
}

#[async_trait]
impl AlertStore for MemoryAlertStore {
    async fn find_by_status(&self, status: AlertStatus) -> Result<Vec<Alert>> {
        let alerts = self.alerts.read().await;
        Ok(alerts
            .values()
            .filter(|a| a.status == status)
            .cloned()
            .collect())
    }

    async fn update_fields(&self, id: &str, update: AlertUpdate) -> Result<Alert> {
        let mut alerts = self.alerts.write().await;
        let alert = alerts
            .get_mut(id)
            .ok_or_else(|| MonitorError::not_found(format!("alert {}", id)))?;

        if let Some(price) = update.current_price {
            alert.current_price = price;
        }
        if let Some(ts) = update.last_checked {
            alert.last_checked = Some(ts);
        }
        if let Some(status) = update.status {
            alert.status = status;
        }
        if let Some(ts) = update.triggered_at {
            alert.triggered_at = Some(ts);
        }

        Ok(alert.clone())
    }
}

/// In-memory user preference source with an all-disabled fallback for
/// unknown users, so a missing prefs record never errors the fire path.
#[derive(Clone, Default)]
pub struct MemoryPrefsSource {
    prefs: Arc<RwLock<HashMap<String, UserPrefs>>>,
}

impl MemoryPrefsSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, prefs: UserPrefs) {
        let mut map = self.prefs.write().await;
        map.insert(prefs.user_id.clone(), prefs);
    }
}

#[async_trait]
impl UserPrefsSource for MemoryPrefsSource {
    async fn prefs_for(&self, user_id: &str) -> Result<UserPrefs> {
        let map = self.prefs.read().await;
        match map.get(user_id) {
            Some(prefs) => Ok(prefs.clone()),
            None => {
                debug!(user_id, "no stored preferences, all channels disabled");
                Ok(UserPrefs::disabled(user_id))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AssetClass, TriggerType};
    use chrono::Utc;

    fn sample_alert() -> Alert {
        Alert::new("user-1", "BTC", AssetClass::Crypto, TriggerType::PriceAbove, 100.0, 90.0)
    }

    #[tokio::test]
    async fn find_by_status_filters_terminal_alerts() {
        let store = MemoryAlertStore::new();
        let active = sample_alert();
        let mut triggered = sample_alert();
        triggered.status = AlertStatus::Triggered;

        store.insert(active.clone()).await;
        store.insert(triggered).await;

        let found = store.find_by_status(AlertStatus::Active).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, active.id);
    }

    #[tokio::test]
    async fn update_fields_applies_only_set_fields() {
        let store = MemoryAlertStore::new();
        let alert = sample_alert();
        store.insert(alert.clone()).await;

        let now = Utc::now();
        let updated = store
            .update_fields(
                &alert.id,
                AlertUpdate {
                    current_price: Some(95.0),
                    last_checked: Some(now),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.current_price, 95.0);
        assert_eq!(updated.last_checked, Some(now));
        assert_eq!(updated.status, AlertStatus::Active);
        assert!(updated.triggered_at.is_none());
    }

    #[tokio::test]
    async fn update_fields_unknown_id_is_not_found() {
        let store = MemoryAlertStore::new();
        let err = store
            .update_fields("missing", AlertUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, MonitorError::NotFound(_)));
    }

    #[tokio::test]
    async fn unknown_user_resolves_to_disabled_prefs() {
        let source = MemoryPrefsSource::new();
        let prefs = source.prefs_for("nobody").await.unwrap();
        assert!(!prefs.email_enabled && !prefs.telegram_enabled && !prefs.sms_enabled);
    }
}
