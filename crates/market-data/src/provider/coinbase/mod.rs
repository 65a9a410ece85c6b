//! Coinbase Exchange quote provider implementation.
//!
//! Product stats via `/products/{product_id}/stats`: 24h open, high, low,
//! last and volume. The payload has no timestamp, so the fetch time is used.

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::ProviderFailure;
use crate::models::{AssetClass, ProviderResult};
use crate::provider::{extract_fields, parse_error, ProviderAdapter, ProviderHttp};
use crate::registry::RateLimitConfig;
use crate::resolver::CryptoPair;

const BASE_URL: &str = "https://api.exchange.coinbase.com/products";
const PROVIDER_ID: &str = "COINBASE";

const STATS_FIELDS: &[&str] = &["last", "open", "high", "low", "volume"];

/// Coinbase Exchange quote provider.
pub struct CoinbaseProvider {
    http: ProviderHttp,
    base_url: String,
}

impl CoinbaseProvider {
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

impl Default for CoinbaseProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_stats(payload: &Value) -> ProviderResult {
    let object = payload
        .as_object()
        .ok_or_else(|| parse_error(PROVIDER_ID, "Expected JSON object"))?;

    // {"message":"NotFound"} for unknown products
    if let Some(message) = object.get("message").and_then(Value::as_str) {
        if message.eq_ignore_ascii_case("notfound") {
            return Err(ProviderFailure::EmptyResponse {
                provider: PROVIDER_ID.to_string(),
            });
        }
        return Err(parse_error(PROVIDER_ID, message));
    }

    extract_fields(PROVIDER_ID, object, STATS_FIELDS)
}

#[async_trait]
impl ProviderAdapter for CoinbaseProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn asset_classes(&self) -> &'static [AssetClass] {
        &[AssetClass::Crypto]
    }

    fn rate_limit(&self) -> RateLimitConfig {
        RateLimitConfig::per_window(180, 5000)
    }

    fn supports(&self, symbol: &str) -> bool {
        CryptoPair::parse(symbol).is_ok()
    }

    async fn fetch(&self, symbol: &str) -> ProviderResult {
        let pair = CryptoPair::parse(symbol).map_err(|e| parse_error(PROVIDER_ID, e.to_string()))?;
        let url = format!("{}/{}/stats", self.base_url, pair.coinbase_product());
        let payload = self.http.get_json(&url, &[]).await?;
        parse_stats(&payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_stats() {
        let payload = json!({
            "open": "42100.01", "high": "43900.00", "low": "41800.55",
            "last": "43612.20", "volume": "15321.8842", "volume_30day": "512000.1"
        });
        let raw = parse_stats(&payload).unwrap();
        assert_eq!(raw.get("last"), Some(&json!("43612.20")));
        assert_eq!(raw.get("open"), Some(&json!("42100.01")));
        assert!(raw.get("volume_30day").is_none());
    }

    #[test]
    fn test_parse_not_found() {
        assert!(matches!(
            parse_stats(&json!({"message": "NotFound"})),
            Err(ProviderFailure::EmptyResponse { .. })
        ));
        assert!(matches!(
            parse_stats(&json!({"message": "Internal error"})),
            Err(ProviderFailure::ParseError { .. })
        ));
    }

    #[tokio::test]
    #[ignore = "requires network access"]
    async fn test_live_quote() {
        let raw = CoinbaseProvider::new().fetch("BTC-USD").await.unwrap();
        assert!(raw.get("last").is_some());
    }
}
