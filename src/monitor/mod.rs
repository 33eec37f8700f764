use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::errors::{MonitorError, Result};
use crate::models::{Alert, AlertStatus, AlertUpdate};
use crate::notify::NotificationDispatcher;
use crate::oracle::PriceOracle;
use crate::store::{AlertStore, UserPrefsSource};
use crate::triggers::should_trigger;

/// Counts for one pass over the active alerts.
#[derive(Debug, Clone, Copy, Default)]
pub struct CycleSummary {
    pub checked: usize,
    pub triggered: usize,
    pub skipped: usize,
}

/// The monitoring engine: a single background task that periodically
/// reads every active alert, refreshes its price through the oracle,
/// evaluates the trigger predicate, persists the result, and dispatches
/// notifications on a fire.
///
/// Constructed once by the hosting process; `start`/`stop` are its only
/// public state transitions and both are idempotent. `stop` takes effect
/// at the next cycle boundary, so an in-flight cycle always completes.
///
/// Alerts are processed sequentially within a cycle, which bounds the
/// outbound call rate; each alert is checked inside its own error
/// boundary so one bad symbol never stalls the rest. A failure outside
/// that boundary (the bulk read itself) doubles the sleep interval once
/// and the loop carries on — only `stop` ends it.
#[derive(Clone)]
pub struct AlertMonitor {
    store: Arc<dyn AlertStore>,
    oracle: Arc<PriceOracle>,
    dispatcher: Arc<NotificationDispatcher>,
    prefs: Arc<dyn UserPrefsSource>,
    poll_interval: Duration,
    running: Arc<AtomicBool>,
    stop_flag: Arc<AtomicBool>,
}

impl AlertMonitor {
    pub fn new(
        store: Arc<dyn AlertStore>,
        oracle: Arc<PriceOracle>,
        dispatcher: Arc<NotificationDispatcher>,
        prefs: Arc<dyn UserPrefsSource>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            store,
            oracle,
            dispatcher,
            prefs,
            poll_interval,
            running: Arc::new(AtomicBool::new(false)),
            stop_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Spawns the monitoring loop. Returns false (and does nothing) when
    /// the loop is already running.
    pub fn start(&self) -> bool {
        if self.running.swap(true, Ordering::SeqCst) {
            info!("alert monitor already running, start ignored");
            return false;
        }
        self.stop_flag.store(false, Ordering::SeqCst);

        let monitor = self.clone();
        tokio::spawn(async move {
            monitor.run_loop().await;
        });

        info!(
            interval_secs = self.poll_interval.as_secs(),
            "alert monitor started"
        );
        true
    }

    /// Requests a stop. Returns false when the loop is not running. The
    /// flag takes effect at the next cycle boundary; an in-flight cycle
    /// completes first.
    pub fn stop(&self) -> bool {
        if !self.running.load(Ordering::SeqCst) {
            info!("alert monitor not running, stop ignored");
            return false;
        }
        self.stop_flag.store(true, Ordering::SeqCst);
        info!("alert monitor stop requested, effective at next cycle boundary");
        true
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    async fn run_loop(self) {
        let mut backoff = false;

        loop {
            if self.stop_flag.load(Ordering::SeqCst) {
                break;
            }

            let started = std::time::Instant::now();
            match self.run_cycle().await {
                Ok(summary) => {
                    backoff = false;
                    info!(
                        checked = summary.checked,
                        triggered = summary.triggered,
                        skipped = summary.skipped,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "monitor cycle complete"
                    );
                }
                Err(e) => {
                    // Transient cycle-level failure: one doubled sleep,
                    // normal cadence resumes after the next good cycle.
                    backoff = true;
                    error!("monitor cycle failed, backing off one interval: {}", e);
                }
            }

            let sleep_for = if backoff {
                self.poll_interval * 2
            } else {
                self.poll_interval
            };
            tokio::time::sleep(sleep_for).await;
        }

        self.running.store(false, Ordering::SeqCst);
        info!("alert monitor stopped");
    }

    /// One pass over all active alerts.
    async fn run_cycle(&self) -> Result<CycleSummary> {
        let alerts = self
            .store
            .find_by_status(AlertStatus::Active)
            .await
            .map_err(|e| MonitorError::loop_failure(format!("failed to load active alerts: {}", e)))?;

        debug!(count = alerts.len(), "evaluating active alerts");

        let mut summary = CycleSummary::default();
        for alert in &alerts {
            match self.check_alert(alert).await {
                Ok(fired) => {
                    summary.checked += 1;
                    if fired {
                        summary.triggered += 1;
                    }
                }
                Err(e) => {
                    // Isolation boundary: this alert keeps its previous
                    // price and last_checked until a future good cycle.
                    summary.skipped += 1;
                    warn!(
                        alert_id = %alert.id,
                        symbol = %alert.symbol,
                        "alert skipped this cycle: {}",
                        e
                    );
                }
            }
        }

        Ok(summary)
    }

    /// Checks a single alert: price lookup, predicate, write-back, and on
    /// a fire the Active -> Triggered transition plus dispatch.
    async fn check_alert(&self, alert: &Alert) -> Result<bool> {
        let price = self.oracle.get_price(&alert.symbol, alert.asset_class).await?;

        let fired = should_trigger(alert, price);
        let now = Utc::now();

        let mut update = AlertUpdate {
            current_price: Some(price),
            last_checked: Some(now),
            ..Default::default()
        };
        if fired {
            update.status = Some(AlertStatus::Triggered);
            update.triggered_at = Some(now);
        }

        self.store
            .update_fields(&alert.id, update)
            .await
            .map_err(|e| MonitorError::persistence(e.to_string()))?;

        if fired {
            info!(
                alert_id = %alert.id,
                symbol = %alert.symbol,
                price,
                threshold = alert.trigger_value,
                "alert triggered"
            );

            // Status is committed; dispatch failures cannot reverse it.
            match self.prefs.prefs_for(&alert.owner).await {
                Ok(prefs) => self.dispatcher.dispatch(alert, &prefs, price).await,
                Err(e) => warn!(
                    alert_id = %alert.id,
                    owner = %alert.owner,
                    "could not resolve notification preferences, dispatch skipped: {}",
                    e
                ),
            }
        }

        Ok(fired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AssetClass, ChannelFlags, TriggerType, UserPrefs};
    use crate::notify::{AlertMessage, NotificationChannel};
    use crate::oracle::PriceFetcher;
    use crate::store::{MemoryAlertStore, MemoryPrefsSource};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FixedFetcher {
        prices: HashMap<String, f64>,
    }

    impl FixedFetcher {
        fn new(pairs: &[(&str, f64)]) -> Self {
            Self {
                prices: pairs.iter().map(|(s, p)| (s.to_string(), *p)).collect(),
            }
        }
    }

    #[async_trait]
    impl PriceFetcher for FixedFetcher {
        async fn fetch_prices(&self, symbols: &[String]) -> Result<HashMap<String, f64>> {
            let mut out = HashMap::new();
            for symbol in symbols {
                match self.prices.get(symbol) {
                    Some(price) => {
                        out.insert(symbol.clone(), *price);
                    }
                    None => return Err(MonitorError::upstream(format!("{} unavailable", symbol))),
                }
            }
            Ok(out)
        }

        fn source_name(&self) -> &'static str {
            "fixed"
        }
    }

    struct CollectingChannel {
        sent: Mutex<Vec<String>>,
    }

    impl CollectingChannel {
        fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
            }
        }

        fn count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl NotificationChannel for CollectingChannel {
        fn name(&self) -> &'static str {
            "email"
        }

        async fn send(&self, recipient: &str, _message: &AlertMessage) -> Result<()> {
            self.sent.lock().unwrap().push(recipient.to_string());
            Ok(())
        }
    }

    struct FailingChannel;

    #[async_trait]
    impl NotificationChannel for FailingChannel {
        fn name(&self) -> &'static str {
            "email"
        }

        async fn send(&self, _recipient: &str, _message: &AlertMessage) -> Result<()> {
            Err(MonitorError::notification("email", "smtp gateway down"))
        }
    }

    struct FailingStore;

    #[async_trait]
    impl AlertStore for FailingStore {
        async fn find_by_status(&self, _status: AlertStatus) -> Result<Vec<Alert>> {
            Err(MonitorError::persistence("database unreachable"))
        }

        async fn update_fields(&self, _id: &str, _update: AlertUpdate) -> Result<Alert> {
            Err(MonitorError::persistence("database unreachable"))
        }
    }

    fn email_alert(trigger_type: TriggerType, trigger_value: f64, current_price: f64) -> Alert {
        Alert::new("user-1", "BTC", AssetClass::Crypto, trigger_type, trigger_value, current_price)
            .with_channels(ChannelFlags {
                email: true,
                telegram: false,
                sms: false,
            })
    }

    fn email_prefs() -> UserPrefs {
        UserPrefs {
            user_id: "user-1".into(),
            email_enabled: true,
            telegram_enabled: false,
            sms_enabled: false,
            email_address: Some("user@example.com".into()),
            telegram_chat_id: None,
            phone_number: None,
        }
    }

    async fn monitor_with(
        fetcher: Arc<dyn PriceFetcher>,
        email: Arc<dyn NotificationChannel>,
    ) -> (AlertMonitor, MemoryAlertStore) {
        let store = MemoryAlertStore::new();
        let prefs = MemoryPrefsSource::new();
        prefs.insert(email_prefs()).await;

        let oracle = PriceOracle::new(Duration::from_secs(60))
            .with_fetcher(AssetClass::Crypto, fetcher);
        let dispatcher = NotificationDispatcher::new().with_email(email);

        let monitor = AlertMonitor::new(
            Arc::new(store.clone()),
            Arc::new(oracle),
            Arc::new(dispatcher),
            Arc::new(prefs),
            Duration::from_millis(10),
        );
        (monitor, store)
    }

    #[tokio::test]
    async fn price_above_crossing_triggers_and_emails() {
        let email = Arc::new(CollectingChannel::new());
        let (monitor, store) = monitor_with(
            Arc::new(FixedFetcher::new(&[("BTC", 105.0)])),
            email.clone(),
        )
        .await;

        let alert = email_alert(TriggerType::PriceAbove, 100.0, 90.0);
        store.insert(alert.clone()).await;

        let summary = monitor.run_cycle().await.unwrap();
        assert_eq!(summary.triggered, 1);

        let stored = store.get(&alert.id).await.unwrap();
        assert_eq!(stored.status, AlertStatus::Triggered);
        assert!(stored.triggered_at.is_some());
        assert_eq!(stored.current_price, 105.0);
        assert_eq!(email.count(), 1);
    }

    #[tokio::test]
    async fn sub_threshold_percentage_change_updates_price_without_firing() {
        let email = Arc::new(CollectingChannel::new());
        let (monitor, store) = monitor_with(
            Arc::new(FixedFetcher::new(&[("BTC", 104.0)])),
            email.clone(),
        )
        .await;

        let alert = email_alert(TriggerType::PercentageChange, 5.0, 100.0);
        store.insert(alert.clone()).await;

        let summary = monitor.run_cycle().await.unwrap();
        assert_eq!(summary.triggered, 0);
        assert_eq!(summary.checked, 1);

        let stored = store.get(&alert.id).await.unwrap();
        assert_eq!(stored.status, AlertStatus::Active);
        assert_eq!(stored.current_price, 104.0);
        assert!(stored.last_checked.is_some());
        assert!(stored.triggered_at.is_none());
        assert_eq!(email.count(), 0);
    }

    #[tokio::test]
    async fn one_failing_symbol_does_not_stall_the_cycle() {
        let email = Arc::new(CollectingChannel::new());
        // Fetcher knows ETH but not DOWN.
        let (monitor, store) = monitor_with(
            Arc::new(FixedFetcher::new(&[("ETH", 2_000.0)])),
            email.clone(),
        )
        .await;

        let mut bad = email_alert(TriggerType::PriceAbove, 10_000.0, 9_000.0);
        bad.symbol = "DOWN".into();
        let mut good = email_alert(TriggerType::PriceAbove, 10_000.0, 1_900.0);
        good.symbol = "ETH".into();

        store.insert(bad.clone()).await;
        store.insert(good.clone()).await;

        let summary = monitor.run_cycle().await.unwrap();
        assert_eq!(summary.checked, 1);
        assert_eq!(summary.skipped, 1);

        let stored_bad = store.get(&bad.id).await.unwrap();
        assert_eq!(stored_bad.current_price, 9_000.0);
        assert!(stored_bad.last_checked.is_none());

        let stored_good = store.get(&good.id).await.unwrap();
        assert_eq!(stored_good.current_price, 2_000.0);
        assert!(stored_good.last_checked.is_some());
    }

    #[tokio::test]
    async fn dispatch_failure_does_not_revert_triggered_status() {
        let (monitor, store) = monitor_with(
            Arc::new(FixedFetcher::new(&[("BTC", 105.0)])),
            Arc::new(FailingChannel),
        )
        .await;

        let alert = email_alert(TriggerType::PriceAbove, 100.0, 90.0);
        store.insert(alert.clone()).await;

        // The cycle must complete normally despite the transport failure.
        let summary = monitor.run_cycle().await.unwrap();
        assert_eq!(summary.triggered, 1);

        let stored = store.get(&alert.id).await.unwrap();
        assert_eq!(stored.status, AlertStatus::Triggered);
    }

    #[tokio::test]
    async fn non_crossing_cycles_stay_active_while_fields_advance() {
        let email = Arc::new(CollectingChannel::new());
        let (monitor, store) = monitor_with(
            Arc::new(FixedFetcher::new(&[("BTC", 95.0)])),
            email.clone(),
        )
        .await;

        let alert = email_alert(TriggerType::PriceAbove, 100.0, 90.0);
        store.insert(alert.clone()).await;

        monitor.run_cycle().await.unwrap();
        let first = store.get(&alert.id).await.unwrap();

        monitor.run_cycle().await.unwrap();
        monitor.run_cycle().await.unwrap();
        let last = store.get(&alert.id).await.unwrap();

        assert_eq!(last.status, AlertStatus::Active);
        assert_eq!(last.current_price, 95.0);
        assert!(last.last_checked.unwrap() >= first.last_checked.unwrap());
        assert_eq!(email.count(), 0);
    }

    #[tokio::test]
    async fn triggered_alert_is_not_rechecked() {
        let email = Arc::new(CollectingChannel::new());
        let (monitor, store) = monitor_with(
            Arc::new(FixedFetcher::new(&[("BTC", 105.0)])),
            email.clone(),
        )
        .await;

        let alert = email_alert(TriggerType::PriceAbove, 100.0, 90.0);
        store.insert(alert.clone()).await;

        monitor.run_cycle().await.unwrap();
        let summary = monitor.run_cycle().await.unwrap();

        // Terminal status: the second cycle sees no active alerts and
        // sends nothing new.
        assert_eq!(summary.checked, 0);
        assert_eq!(email.count(), 1);
    }

    #[tokio::test]
    async fn start_is_idempotent() {
        let email = Arc::new(CollectingChannel::new());
        let (monitor, _store) = monitor_with(
            Arc::new(FixedFetcher::new(&[("BTC", 95.0)])),
            email,
        )
        .await;

        assert!(monitor.start());
        assert!(!monitor.start());
        assert!(monitor.is_running());

        assert!(monitor.stop());

        // The flag takes effect at the next cycle boundary.
        for _ in 0..50 {
            if !monitor.is_running() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(!monitor.is_running());
        assert!(!monitor.stop());
    }

    #[tokio::test]
    async fn loop_survives_cycle_level_failures() {
        let oracle = PriceOracle::new(Duration::from_secs(60));
        let monitor = AlertMonitor::new(
            Arc::new(FailingStore),
            Arc::new(oracle),
            Arc::new(NotificationDispatcher::new()),
            Arc::new(MemoryPrefsSource::new()),
            Duration::from_millis(10),
        );

        assert!(matches!(
            monitor.run_cycle().await,
            Err(MonitorError::LoopFailure(_))
        ));

        monitor.start();
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(monitor.is_running());
        monitor.stop();
    }
}
