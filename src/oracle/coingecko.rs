use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use tracing::debug;

use super::PriceFetcher;
use crate::errors::{MonitorError, Result};

/// Crypto price fetcher backed by the CoinGecko simple-price endpoint.
pub struct CoinGeckoFetcher {
    client: Client,
    base_url: String,
}

/// Ticker-to-CoinGecko-id mapping for the common symbols; anything else
/// falls back to the lowercased symbol, which matches CoinGecko ids for
/// many smaller coins.
const SYMBOL_IDS: &[(&str, &str)] = &[
    ("BTC", "bitcoin"),
    ("ETH", "ethereum"),
    ("SOL", "solana"),
    ("BNB", "binancecoin"),
    ("XRP", "ripple"),
    ("ADA", "cardano"),
    ("DOGE", "dogecoin"),
    ("DOT", "polkadot"),
    ("AVAX", "avalanche-2"),
    ("LINK", "chainlink"),
    ("MATIC", "matic-network"),
    ("LTC", "litecoin"),
];

fn coin_id(symbol: &str) -> String {
    let upper = symbol.to_uppercase();
    SYMBOL_IDS
        .iter()
        .find(|(sym, _)| *sym == upper)
        .map(|(_, id)| (*id).to_string())
        .unwrap_or_else(|| symbol.to_lowercase())
}

impl CoinGeckoFetcher {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl PriceFetcher for CoinGeckoFetcher {
    async fn fetch_prices(&self, symbols: &[String]) -> Result<HashMap<String, f64>> {
        if symbols.is_empty() {
            return Ok(HashMap::new());
        }

        let ids: Vec<String> = symbols.iter().map(|s| coin_id(s)).collect();
        let url = format!("{}/api/v3/simple/price", self.base_url);

        debug!(count = symbols.len(), "fetching prices from CoinGecko");

        let response = self
            .client
            .get(&url)
            .query(&[("ids", ids.join(",")), ("vs_currencies", "usd".into())])
            .send()
            .await
            .map_err(|e| MonitorError::upstream(format!("price request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MonitorError::upstream(format!(
                "price API returned status {}: {}",
                status, body
            )));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| MonitorError::upstream(format!("failed to parse price response: {}", e)))?;

        // Symbols missing from the response, or carrying a non-numeric
        // price, are simply absent from the result map; the caller treats
        // each absence as an upstream failure for that symbol only.
        let mut prices = HashMap::new();
        for (symbol, id) in symbols.iter().zip(ids.iter()) {
            if let Some(price) = payload
                .get(id)
                .and_then(|entry| entry.get("usd"))
                .and_then(|usd| usd.as_f64())
                .filter(|p| p.is_finite())
            {
                prices.insert(symbol.clone(), price);
            }
        }

        Ok(prices)
    }

    fn source_name(&self) -> &'static str {
        "coingecko"
    }
}
