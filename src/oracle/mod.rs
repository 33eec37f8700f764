mod cache;
mod coingecko;

pub use cache::{CacheStats, PriceCache};
pub use coingecko::CoinGeckoFetcher;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::errors::{MonitorError, Result};
use crate::models::AssetClass;

/// Capability interface for one upstream price source.
///
/// A single request may carry several symbols; the result maps each
/// symbol to its USD price, and a symbol absent from the map failed
/// individually (missing from the upstream response or non-numeric).
#[async_trait]
pub trait PriceFetcher: Send + Sync {
    async fn fetch_prices(&self, symbols: &[String]) -> Result<HashMap<String, f64>>;

    fn source_name(&self) -> &'static str;
}

/// Price lookup facade: a TTL cache in front of per-asset-class fetchers.
///
/// Asset classes with no registered fetcher fail with `NotSupported`
/// without issuing any outbound call; they are the documented extension
/// points (stock/forex/commodity in the default wiring).
pub struct PriceOracle {
    fetchers: HashMap<AssetClass, Arc<dyn PriceFetcher>>,
    cache: PriceCache,
}

impl PriceOracle {
    pub fn new(cache_ttl: Duration) -> Self {
        Self {
            fetchers: HashMap::new(),
            cache: PriceCache::new(cache_ttl),
        }
    }

    pub fn with_fetcher(mut self, asset_class: AssetClass, fetcher: Arc<dyn PriceFetcher>) -> Self {
        self.fetchers.insert(asset_class, fetcher);
        self
    }

    /// Current USD price for (symbol, asset class). A cache hit within the
    /// TTL window returns the stored value without an upstream call; a
    /// failed refresh leaves any stale entry in place.
    pub async fn get_price(&self, symbol: &str, asset_class: AssetClass) -> Result<f64> {
        if let Some(price) = self.cache.get(asset_class, symbol).await {
            return Ok(price);
        }

        let fetcher = self
            .fetchers
            .get(&asset_class)
            .ok_or(MonitorError::NotSupported(asset_class))?;

        let symbols = [symbol.to_string()];
        let prices = fetcher.fetch_prices(&symbols).await?;

        let price = prices.get(symbol).copied().ok_or_else(|| {
            MonitorError::upstream(format!(
                "{} returned no usable price for {}",
                fetcher.source_name(),
                symbol
            ))
        })?;

        self.cache.insert(asset_class, symbol, price).await;
        debug!(symbol, %asset_class, price, source = fetcher.source_name(), "price refreshed");

        Ok(price)
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }
}
