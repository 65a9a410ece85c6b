//! Finnhub quote provider implementation.
//!
//! Equities via the /quote endpoint. Finnhub free tier is limited to 60 API
//! calls per minute and requires an API key.
//! API documentation: https://finnhub.io/docs/api

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::errors::ProviderFailure;
use crate::models::{AssetClass, ProviderResult};
use crate::provider::{extract_fields, parse_error, parse_json, ProviderAdapter, ProviderHttp};
use crate::registry::RateLimitConfig;

const BASE_URL: &str = "https://finnhub.io/api/v1";
const PROVIDER_ID: &str = "FINNHUB";

/// Fields of the /quote payload: current, change, percent change, high, low,
/// open, previous close, timestamp.
const QUOTE_FIELDS: &[&str] = &["c", "d", "dp", "h", "l", "o", "pc", "t"];

// ============================================================================
// FinnhubProvider
// ============================================================================

/// Finnhub quote provider.
pub struct FinnhubProvider {
    http: ProviderHttp,
    api_key: String,
    base_url: String,
}

impl FinnhubProvider {
    /// Create a new Finnhub provider with the given API key.
    pub fn new(api_key: String) -> Self {
        Self {
            http: ProviderHttp::new(PROVIDER_ID),
            api_key,
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Extract the /quote payload.
///
/// Finnhub answers unknown symbols with HTTP 200 and all-zero fields.
fn parse_quote(payload: &Value) -> ProviderResult {
    let object = payload
        .as_object()
        .ok_or_else(|| parse_error(PROVIDER_ID, "Expected JSON object"))?;

    if let Some(error) = object.get("error").and_then(Value::as_str) {
        return Err(parse_error(PROVIDER_ID, error));
    }

    let price = object.get("c").and_then(Value::as_f64).unwrap_or(0.0);
    if price == 0.0 {
        return Err(ProviderFailure::EmptyResponse {
            provider: PROVIDER_ID.to_string(),
        });
    }

    extract_fields(PROVIDER_ID, object, QUOTE_FIELDS)
}

#[async_trait]
impl ProviderAdapter for FinnhubProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn asset_classes(&self) -> &'static [AssetClass] {
        &[AssetClass::Equity]
    }

    fn rate_limit(&self) -> RateLimitConfig {
        RateLimitConfig::per_window(60, 2000)
    }

    async fn fetch(&self, symbol: &str) -> ProviderResult {
        debug!("Finnhub quote request for {}", symbol);
        let url = format!("{}/quote", self.base_url);
        let request = self
            .http
            .get(&url)
            .header("X-Finnhub-Token", &self.api_key)
            .query(&[("symbol", symbol)]);
        let body = self.http.send(request).await?;
        parse_quote(&parse_json(PROVIDER_ID, &body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_quote() {
        let payload = json!({
            "c": 185.92, "d": 1.24, "dp": 0.6714, "h": 186.4, "l": 183.9,
            "o": 184.2, "pc": 184.68, "t": 1704412800
        });
        let raw = parse_quote(&payload).unwrap();
        assert_eq!(raw.provider, PROVIDER_ID);
        assert_eq!(raw.get("c"), Some(&json!(185.92)));
        assert_eq!(raw.get("pc"), Some(&json!(184.68)));
    }

    #[test]
    fn test_unknown_symbol_is_empty() {
        let payload = json!({"c": 0, "d": null, "dp": null, "h": 0, "l": 0, "o": 0, "pc": 0, "t": 0});
        assert!(matches!(
            parse_quote(&payload),
            Err(ProviderFailure::EmptyResponse { .. })
        ));
    }

    #[test]
    fn test_api_error_is_parse_error() {
        let payload = json!({"error": "You don't have access to this resource."});
        assert!(matches!(
            parse_quote(&payload),
            Err(ProviderFailure::ParseError { .. })
        ));
    }

    #[test]
    fn test_metadata() {
        let provider = FinnhubProvider::new("key".to_string());
        assert_eq!(provider.id(), "FINNHUB");
        assert_eq!(provider.asset_classes(), &[AssetClass::Equity]);
        assert_eq!(provider.rate_limit().requests_per_minute, 60);
    }

    #[tokio::test]
    #[ignore = "requires network access and QUOTEHUB_FINNHUB_API_KEY"]
    async fn test_live_quote() {
        let key = std::env::var("QUOTEHUB_FINNHUB_API_KEY").unwrap();
        let raw = FinnhubProvider::new(key).fetch("AAPL").await.unwrap();
        assert!(raw.get("c").is_some());
    }
}
