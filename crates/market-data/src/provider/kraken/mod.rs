//! Kraken quote provider implementation.
//!
//! Public `Ticker` endpoint. The result is keyed by Kraken's internal pair
//! name (`XXBTZUSD` for `XBTUSD`), so the first entry is taken. Array
//! fields hold `[today, last 24h]` or `[price, lot volume]`:
//! - `c[0]` last trade price
//! - `v[1]` volume over the last 24 hours
//! - `o` today's opening price

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::errors::ProviderFailure;
use crate::models::{AssetClass, ProviderResult, RawQuote};
use crate::provider::{parse_error, ProviderAdapter, ProviderHttp};
use crate::registry::RateLimitConfig;
use crate::resolver::CryptoPair;

const BASE_URL: &str = "https://api.kraken.com/0/public/Ticker";
const PROVIDER_ID: &str = "KRAKEN";

#[derive(Debug, Deserialize)]
struct KrakenResponse {
    #[serde(default)]
    error: Vec<String>,
    #[serde(default)]
    result: Map<String, Value>,
}

/// Kraken quote provider.
pub struct KrakenProvider {
    http: ProviderHttp,
    base_url: String,
}

impl KrakenProvider {
    pub fn new() -> Self {
        Self {
            http: ProviderHttp::new(PROVIDER_ID),
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl Default for KrakenProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn array_item(ticker: &Value, key: &str, index: usize) -> Option<Value> {
    ticker.get(key)?.get(index).cloned()
}

fn parse_ticker(payload: Value) -> ProviderResult {
    let response: KrakenResponse = serde_json::from_value(payload)
        .map_err(|e| parse_error(PROVIDER_ID, format!("Unexpected response shape: {}", e)))?;

    if let Some(error) = response.error.first() {
        if error.contains("Rate limit") || error.contains("Throttled") {
            return Err(ProviderFailure::RateLimited {
                provider: PROVIDER_ID.to_string(),
                retry_after: None,
            });
        }
        if error.contains("Unknown asset pair") {
            return Err(ProviderFailure::EmptyResponse {
                provider: PROVIDER_ID.to_string(),
            });
        }
        return Err(parse_error(PROVIDER_ID, error.clone()));
    }

    let ticker = response
        .result
        .values()
        .next()
        .ok_or_else(|| ProviderFailure::EmptyResponse {
            provider: PROVIDER_ID.to_string(),
        })?;

    let mut raw = RawQuote::new(PROVIDER_ID.into());
    if let Some(last) = array_item(ticker, "c", 0) {
        raw.insert("last", last);
    }
    if let Some(volume) = array_item(ticker, "v", 1) {
        raw.insert("volume", volume);
    }
    if let Some(open) = ticker.get("o") {
        raw.insert("open", open.clone());
    }
    if let Some(high) = array_item(ticker, "h", 1) {
        raw.insert("high", high);
    }
    if let Some(low) = array_item(ticker, "l", 1) {
        raw.insert("low", low);
    }

    if raw.get("last").is_none() {
        return Err(parse_error(PROVIDER_ID, "Ticker without last trade"));
    }
    Ok(raw)
}

#[async_trait]
impl ProviderAdapter for KrakenProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn asset_classes(&self) -> &'static [AssetClass] {
        &[AssetClass::Crypto]
    }

    fn rate_limit(&self) -> RateLimitConfig {
        RateLimitConfig::default()
    }

    fn supports(&self, symbol: &str) -> bool {
        CryptoPair::parse(symbol).is_ok()
    }

    async fn fetch(&self, symbol: &str) -> ProviderResult {
        let pair = CryptoPair::parse(symbol).map_err(|e| parse_error(PROVIDER_ID, e.to_string()))?;
        let kraken_pair = pair.kraken_pair();
        let payload = self
            .http
            .get_json(&self.base_url, &[("pair", kraken_pair.as_str())])
            .await?;
        parse_ticker(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_ticker() {
        let payload = json!({
            "error": [],
            "result": {
                "XXBTZUSD": {
                    "a": ["43620.10000", "1", "1.000"],
                    "b": ["43620.00000", "2", "2.000"],
                    "c": ["43620.10000", "0.00150000"],
                    "v": ["812.3", "2411.90123"],
                    "p": ["43210.1", "43001.7"],
                    "t": [12000, 31000],
                    "l": ["42900.0", "41800.0"],
                    "h": ["43700.0", "43900.0"],
                    "o": "42380.00000"
                }
            }
        });
        let raw = parse_ticker(payload).unwrap();
        assert_eq!(raw.get("last"), Some(&json!("43620.10000")));
        assert_eq!(raw.get("volume"), Some(&json!("2411.90123")));
        assert_eq!(raw.get("open"), Some(&json!("42380.00000")));
        assert_eq!(raw.get("high"), Some(&json!("43900.0")));
    }

    #[test]
    fn test_parse_errors() {
        let unknown = json!({"error": ["EQuery:Unknown asset pair"]});
        assert!(matches!(
            parse_ticker(unknown),
            Err(ProviderFailure::EmptyResponse { .. })
        ));

        let limited = json!({"error": ["EAPI:Rate limit exceeded"]});
        assert!(matches!(
            parse_ticker(limited),
            Err(ProviderFailure::RateLimited { .. })
        ));

        let empty = json!({"error": [], "result": {}});
        assert!(matches!(
            parse_ticker(empty),
            Err(ProviderFailure::EmptyResponse { .. })
        ));
    }

    #[tokio::test]
    #[ignore = "requires network access"]
    async fn test_live_quote() {
        let raw = KrakenProvider::new().fetch("BTC-USD").await.unwrap();
        assert!(raw.get("last").is_some());
    }
}
