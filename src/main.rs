use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use alertmon::models::AssetClass;
use alertmon::monitor::AlertMonitor;
use alertmon::notify::{EmailChannel, NotificationDispatcher, SmsChannel, TelegramChannel};
use alertmon::oracle::{CoinGeckoFetcher, PriceOracle};
use alertmon::store::{MemoryAlertStore, MemoryPrefsSource};
use alertmon::utils::Config;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    config.validate()?;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.upstream_timeout_secs))
        .build()?;

    // Only crypto has a live source; stock/forex/commodity fail with
    // NotSupported until a fetcher is registered for them.
    let oracle = PriceOracle::new(Duration::from_secs(config.price_cache_ttl_secs)).with_fetcher(
        AssetClass::Crypto,
        Arc::new(CoinGeckoFetcher::new(
            client.clone(),
            config.coingecko_base_url.clone(),
        )),
    );

    let mut dispatcher = NotificationDispatcher::new().with_sms(Arc::new(SmsChannel));

    if config.email_configured() {
        dispatcher = dispatcher.with_email(Arc::new(EmailChannel::new(
            client.clone(),
            config.mail_api_url.clone().unwrap_or_default(),
            config.mail_api_key.clone().unwrap_or_default(),
            config.mail_from.clone().unwrap_or_default(),
        )));
    } else {
        warn!("mail API not configured, email channel disabled");
    }

    match &config.telegram_bot_token {
        Some(token) => {
            dispatcher =
                dispatcher.with_telegram(Arc::new(TelegramChannel::new(client.clone(), token.clone())));
        }
        None => warn!("TELEGRAM_BOT_TOKEN not set, telegram channel disabled"),
    }

    // The user-facing collaborator owns alert CRUD and user preferences;
    // the in-memory implementations stand in for it here.
    let store = Arc::new(MemoryAlertStore::new());
    let prefs = Arc::new(MemoryPrefsSource::new());

    let monitor = AlertMonitor::new(
        store,
        Arc::new(oracle),
        Arc::new(dispatcher),
        prefs,
        Duration::from_secs(config.poll_interval_secs),
    );

    monitor.start();

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    monitor.stop();

    Ok(())
}
