//! Binance quote provider implementation.
//!
//! Spot pairs via the public 24hr ticker. USD pairs are quoted against USDT.
//! Request weight is generous (6000/min per IP); 429 and 418 mean the IP
//! is being throttled or banned.

use async_trait::async_trait;
use serde_json::Value;

use crate::models::{AssetClass, ProviderResult};
use crate::provider::{extract_fields, parse_error, ProviderAdapter, ProviderHttp};
use crate::registry::RateLimitConfig;
use crate::resolver::CryptoPair;

const BASE_URL: &str = "https://api.binance.com/api/v3/ticker/24hr";
const PROVIDER_ID: &str = "BINANCE";

const TICKER_FIELDS: &[&str] = &[
    "lastPrice",
    "priceChange",
    "priceChangePercent",
    "prevClosePrice",
    "openPrice",
    "highPrice",
    "lowPrice",
    "volume",
    "closeTime",
];

/// Binance quote provider.
pub struct BinanceProvider {
    http: ProviderHttp,
    base_url: String,
}

impl BinanceProvider {
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

impl Default for BinanceProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_ticker(payload: &Value) -> ProviderResult {
    let object = payload
        .as_object()
        .ok_or_else(|| parse_error(PROVIDER_ID, "Expected JSON object"))?;

    if let Some(msg) = object.get("msg").and_then(Value::as_str) {
        return Err(parse_error(PROVIDER_ID, msg));
    }

    extract_fields(PROVIDER_ID, object, TICKER_FIELDS)
}

#[async_trait]
impl ProviderAdapter for BinanceProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn asset_classes(&self) -> &'static [AssetClass] {
        &[AssetClass::Crypto]
    }

    fn rate_limit(&self) -> RateLimitConfig {
        RateLimitConfig::per_window(300, 10_000)
    }

    fn supports(&self, symbol: &str) -> bool {
        CryptoPair::parse(symbol).is_ok()
    }

    async fn fetch(&self, symbol: &str) -> ProviderResult {
        let pair = CryptoPair::parse(symbol).map_err(|e| parse_error(PROVIDER_ID, e.to_string()))?;
        let market = pair.binance_symbol();
        let payload = self
            .http
            .get_json(&self.base_url, &[("symbol", market.as_str())])
            .await?;
        parse_ticker(&payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ProviderFailure;
    use serde_json::json;

    #[test]
    fn test_parse_ticker() {
        let payload = json!({
            "symbol": "BTCUSDT",
            "priceChange": "1250.10000000",
            "priceChangePercent": "2.950",
            "prevClosePrice": "42375.90000000",
            "lastPrice": "43626.00000000",
            "openPrice": "42375.90000000",
            "volume": "23456.12345000",
            "quoteVolume": "1020000000.00",
            "closeTime": 1704412799999u64,
            "count": 1000000
        });
        let raw = parse_ticker(&payload).unwrap();
        assert_eq!(raw.get("lastPrice"), Some(&json!("43626.00000000")));
        assert_eq!(raw.get("closeTime"), Some(&json!(1704412799999u64)));
        assert!(raw.get("quoteVolume").is_none());
    }

    #[test]
    fn test_parse_error_body() {
        let payload = json!({"code": -1121, "msg": "Invalid symbol."});
        assert!(matches!(
            parse_ticker(&payload),
            Err(ProviderFailure::ParseError { .. })
        ));
    }

    #[tokio::test]
    #[ignore = "requires network access"]
    async fn test_live_quote() {
        let raw = BinanceProvider::new().fetch("BTC-USD").await.unwrap();
        assert!(raw.get("lastPrice").is_some());
    }
}
