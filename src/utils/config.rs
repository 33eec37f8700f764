use serde::{Deserialize, Serialize};
use std::env;

use crate::errors::{MonitorError, Result};

const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;
const DEFAULT_CACHE_TTL_SECS: u64 = 60;
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;
const DEFAULT_COINGECKO_BASE_URL: &str = "https://api.coingecko.com";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Scheduler
    pub poll_interval_secs: u64,
    pub price_cache_ttl_secs: u64,
    pub upstream_timeout_secs: u64,

    // Price source
    pub coingecko_base_url: String,

    // Notification transports; a missing credential disables that channel
    // at wiring time rather than failing startup.
    pub telegram_bot_token: Option<String>,
    pub mail_api_url: Option<String>,
    pub mail_api_key: Option<String>,
    pub mail_from: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            poll_interval_secs: parse_env("POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS),
            price_cache_ttl_secs: parse_env("PRICE_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS),
            upstream_timeout_secs: parse_env(
                "UPSTREAM_TIMEOUT_SECS",
                DEFAULT_UPSTREAM_TIMEOUT_SECS,
            ),
            coingecko_base_url: env::var("COINGECKO_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_COINGECKO_BASE_URL.to_string()),
            telegram_bot_token: env::var("TELEGRAM_BOT_TOKEN").ok().filter(|s| !s.is_empty()),
            mail_api_url: env::var("MAIL_API_URL").ok().filter(|s| !s.is_empty()),
            mail_api_key: env::var("MAIL_API_KEY").ok().filter(|s| !s.is_empty()),
            mail_from: env::var("MAIL_FROM").ok().filter(|s| !s.is_empty()),
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_secs == 0 {
            return Err(MonitorError::config("POLL_INTERVAL_SECS must be non-zero"));
        }
        if self.price_cache_ttl_secs == 0 {
            return Err(MonitorError::config("PRICE_CACHE_TTL_SECS must be non-zero"));
        }
        if self.upstream_timeout_secs == 0 {
            return Err(MonitorError::config("UPSTREAM_TIMEOUT_SECS must be non-zero"));
        }
        if self.mail_api_url.is_some() && (self.mail_api_key.is_none() || self.mail_from.is_none())
        {
            return Err(MonitorError::config(
                "MAIL_API_URL requires MAIL_API_KEY and MAIL_FROM",
            ));
        }
        Ok(())
    }

    pub fn email_configured(&self) -> bool {
        self.mail_api_url.is_some() && self.mail_api_key.is_some() && self.mail_from.is_some()
    }
}

fn parse_env(key: &str, default: u64) -> u64 {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .unwrap_or(default)
}
