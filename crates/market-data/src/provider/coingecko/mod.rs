//! CoinGecko quote provider implementation.
//!
//! Aggregated prices via `/simple/price`. CoinGecko addresses coins by id
//! (`bitcoin`), so only bases with a known id are supported. The response
//! keys every figure by the `vs_currency`; the adapter strips that prefix:
//!
//! ```text
//! {"bitcoin":{"usd":43620,"usd_24h_change":2.9,"usd_24h_vol":1.2e10,"last_updated_at":1704412800}}
//!   -> price, 24h_change, 24h_vol, last_updated_at
//! ```

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::ProviderFailure;
use crate::models::{AssetClass, ProviderResult, RawQuote};
use crate::provider::{parse_error, ProviderAdapter, ProviderHttp};
use crate::registry::RateLimitConfig;
use crate::resolver::CryptoPair;

const BASE_URL: &str = "https://api.coingecko.com/api/v3/simple/price";
const PROVIDER_ID: &str = "COINGECKO";

/// CoinGecko quote provider.
pub struct CoinGeckoProvider {
    http: ProviderHttp,
    base_url: String,
}

impl CoinGeckoProvider {
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

impl Default for CoinGeckoProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_simple_price(payload: &Value, coin_id: &str, vs_currency: &str) -> ProviderResult {
    if let Some(status) = payload.get("status") {
        // {"status":{"error_code":429,"error_message":"You've exceeded the Rate Limit"}}
        if status.get("error_code").and_then(Value::as_i64) == Some(429) {
            return Err(ProviderFailure::RateLimited {
                provider: PROVIDER_ID.to_string(),
                retry_after: None,
            });
        }
        return Err(parse_error(PROVIDER_ID, status.to_string()));
    }

    let coin = payload
        .get(coin_id)
        .and_then(Value::as_object)
        .ok_or_else(|| ProviderFailure::EmptyResponse {
            provider: PROVIDER_ID.to_string(),
        })?;

    let price = coin
        .get(vs_currency)
        .ok_or_else(|| ProviderFailure::EmptyResponse {
            provider: PROVIDER_ID.to_string(),
        })?;

    let mut raw = RawQuote::new(PROVIDER_ID.into());
    raw.insert("price", price.clone());
    for suffix in ["24h_change", "24h_vol"] {
        if let Some(value) = coin.get(&format!("{}_{}", vs_currency, suffix)) {
            raw.insert(suffix, value.clone());
        }
    }
    if let Some(updated) = coin.get("last_updated_at") {
        raw.insert("last_updated_at", updated.clone());
    }
    Ok(raw)
}

#[async_trait]
impl ProviderAdapter for CoinGeckoProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn asset_classes(&self) -> &'static [AssetClass] {
        &[AssetClass::Crypto]
    }

    fn rate_limit(&self) -> RateLimitConfig {
        RateLimitConfig::per_window(25, 1000)
    }

    fn supports(&self, symbol: &str) -> bool {
        CryptoPair::parse(symbol)
            .map(|pair| pair.coingecko_id().is_some())
            .unwrap_or(false)
    }

    async fn fetch(&self, symbol: &str) -> ProviderResult {
        let pair = CryptoPair::parse(symbol).map_err(|e| parse_error(PROVIDER_ID, e.to_string()))?;
        let coin_id = pair.coingecko_id().ok_or_else(|| ProviderFailure::EmptyResponse {
            provider: PROVIDER_ID.to_string(),
        })?;
        let vs_currency = pair.coingecko_vs_currency();

        let payload = self
            .http
            .get_json(
                &self.base_url,
                &[
                    ("ids", coin_id),
                    ("vs_currencies", vs_currency.as_str()),
                    ("include_24hr_change", "true"),
                    ("include_24hr_vol", "true"),
                    ("include_last_updated_at", "true"),
                ],
            )
            .await?;
        parse_simple_price(&payload, coin_id, &vs_currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_simple_price() {
        let payload = json!({
            "bitcoin": {
                "usd": 43620,
                "usd_24h_vol": 12000000000.5,
                "usd_24h_change": 2.91,
                "last_updated_at": 1704412800
            }
        });
        let raw = parse_simple_price(&payload, "bitcoin", "usd").unwrap();
        assert_eq!(raw.get("price"), Some(&json!(43620)));
        assert_eq!(raw.get("24h_change"), Some(&json!(2.91)));
        assert_eq!(raw.get("24h_vol"), Some(&json!(12000000000.5)));
        assert_eq!(raw.get("last_updated_at"), Some(&json!(1704412800)));
    }

    #[test]
    fn test_parse_missing_coin_or_currency() {
        assert!(matches!(
            parse_simple_price(&json!({}), "bitcoin", "usd"),
            Err(ProviderFailure::EmptyResponse { .. })
        ));
        assert!(matches!(
            parse_simple_price(&json!({"bitcoin": {"eur": 40000}}), "bitcoin", "usd"),
            Err(ProviderFailure::EmptyResponse { .. })
        ));
    }

    #[test]
    fn test_parse_rate_limited() {
        let payload = json!({"status": {"error_code": 429, "error_message": "You've exceeded the Rate Limit."}});
        assert!(matches!(
            parse_simple_price(&payload, "bitcoin", "usd"),
            Err(ProviderFailure::RateLimited { .. })
        ));
    }

    #[test]
    fn test_supports_known_coins_only() {
        let provider = CoinGeckoProvider::new();
        assert!(provider.supports("BTC-USD"));
        assert!(provider.supports("ETH-USDT"));
        assert!(!provider.supports("FOO-USD"));
    }

    #[tokio::test]
    #[ignore = "requires network access"]
    async fn test_live_quote() {
        let raw = CoinGeckoProvider::new().fetch("BTC-USD").await.unwrap();
        assert!(raw.get("price").is_some());
    }
}
