use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::models::AssetClass;

/// TTL price cache keyed by (asset class, symbol).
///
/// Entries are refreshed only by successful fetches; a failed refresh
/// never evicts a stale entry. Expired entries are swept opportunistically
/// so the map does not grow without bound across long runs.
pub struct PriceCache {
    inner: RwLock<CacheInner>,
    ttl: Duration,
}

struct CacheInner {
    entries: HashMap<(AssetClass, String), CachedPrice>,
    hits: u64,
    misses: u64,
    last_cleanup: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct CachedPrice {
    price: f64,
    cached_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

const CLEANUP_INTERVAL_MINUTES: i64 = 5;

impl PriceCache {
    pub fn new(ttl: std::time::Duration) -> Self {
        Self {
            inner: RwLock::new(CacheInner {
                entries: HashMap::new(),
                hits: 0,
                misses: 0,
                last_cleanup: Utc::now(),
            }),
            ttl: Duration::seconds(ttl.as_secs() as i64),
        }
    }

    /// Returns the cached price when the entry is within its TTL window.
    pub async fn get(&self, asset_class: AssetClass, symbol: &str) -> Option<f64> {
        let mut inner = self.inner.write().await;

        let now = Utc::now();
        let hit = inner
            .entries
            .get(&(asset_class, symbol.to_string()))
            .filter(|cached| now.signed_duration_since(cached.cached_at) < self.ttl)
            .map(|cached| cached.price);

        match hit {
            Some(price) => {
                inner.hits += 1;
                debug!(symbol, %asset_class, price, "price cache hit");
                Some(price)
            }
            None => {
                inner.misses += 1;
                if now.signed_duration_since(inner.last_cleanup)
                    > Duration::minutes(CLEANUP_INTERVAL_MINUTES)
                {
                    self.cleanup(&mut inner, now);
                }
                None
            }
        }
    }

    pub async fn insert(&self, asset_class: AssetClass, symbol: &str, price: f64) {
        let mut inner = self.inner.write().await;
        inner.entries.insert(
            (asset_class, symbol.to_string()),
            CachedPrice {
                price,
                cached_at: Utc::now(),
            },
        );
    }

    pub async fn stats(&self) -> CacheStats {
        let inner = self.inner.read().await;
        CacheStats {
            entries: inner.entries.len(),
            hits: inner.hits,
            misses: inner.misses,
        }
    }

    fn cleanup(&self, inner: &mut CacheInner, now: DateTime<Utc>) {
        let ttl = self.ttl;
        let before = inner.entries.len();
        inner
            .entries
            .retain(|_, cached| now.signed_duration_since(cached.cached_at) < ttl);
        inner.last_cleanup = now;

        let swept = before - inner.entries.len();
        if swept > 0 {
            debug!(swept, "cleaned expired price cache entries");
        }
    }
}
