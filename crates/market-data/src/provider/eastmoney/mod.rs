//! Eastmoney quote provider implementation.
//!
//! China A-shares via the push2 `stock/get` endpoint. With `fltt=2` prices
//! come back as plain decimals; suspended stocks report `"-"`.
//!
//! Field codes used:
//! - f43 last price, f44 high, f45 low, f46 open, f60 previous close
//! - f47 volume (lots of 100 shares), f48 turnover
//! - f86 update time (unix seconds), f169 change, f170 change percent

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::ProviderFailure;
use crate::models::{AssetClass, ProviderResult};
use crate::provider::{extract_fields, parse_error, ProviderAdapter, ProviderHttp};
use crate::registry::RateLimitConfig;
use crate::resolver::AShareCode;

const BASE_URL: &str = "https://push2.eastmoney.com/api/qt/stock/get";
const PROVIDER_ID: &str = "EASTMONEY";

const FIELDS: &str = "f43,f44,f45,f46,f47,f48,f57,f58,f60,f86,f169,f170";
const QUOTE_FIELDS: &[&str] = &[
    "f43", "f44", "f45", "f46", "f47", "f48", "f60", "f86", "f169", "f170",
];

/// Eastmoney quote provider.
pub struct EastmoneyProvider {
    http: ProviderHttp,
    base_url: String,
}

impl EastmoneyProvider {
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

impl Default for EastmoneyProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_stock(payload: &Value) -> ProviderResult {
    let data = payload
        .get("data")
        .ok_or_else(|| parse_error(PROVIDER_ID, "Missing data block"))?;

    // Unknown secid: {"rc":0,"data":null}
    let Some(object) = data.as_object() else {
        return Err(ProviderFailure::EmptyResponse {
            provider: PROVIDER_ID.to_string(),
        });
    };

    extract_fields(PROVIDER_ID, object, QUOTE_FIELDS)
}

#[async_trait]
impl ProviderAdapter for EastmoneyProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn asset_classes(&self) -> &'static [AssetClass] {
        &[AssetClass::AShare]
    }

    fn rate_limit(&self) -> RateLimitConfig {
        RateLimitConfig::default()
    }

    fn supports(&self, symbol: &str) -> bool {
        AShareCode::parse(symbol).is_ok()
    }

    async fn fetch(&self, symbol: &str) -> ProviderResult {
        let code = AShareCode::parse(symbol).map_err(|e| parse_error(PROVIDER_ID, e.to_string()))?;
        let secid = code.eastmoney_secid();
        let payload = self
            .http
            .get_json(
                &self.base_url,
                &[
                    ("secid", secid.as_str()),
                    ("fields", FIELDS),
                    ("fltt", "2"),
                    ("invt", "2"),
                ],
            )
            .await?;
        parse_stock(&payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_stock() {
        let payload = json!({
            "rc": 0, "rt": 4, "svr": 181669437,
            "data": {
                "f43": 1700.0, "f44": 1710.0, "f45": 1685.0, "f46": 1690.0,
                "f47": 25000, "f48": 4250000000.0, "f57": "600519", "f58": "贵州茅台",
                "f60": 1680.0, "f86": 1704438003, "f169": 20.0, "f170": 1.19
            }
        });
        let raw = parse_stock(&payload).unwrap();
        assert_eq!(raw.get("f43"), Some(&json!(1700.0)));
        assert_eq!(raw.get("f86"), Some(&json!(1704438003)));
        assert!(raw.get("f58").is_none());
    }

    #[test]
    fn test_parse_unknown_secid() {
        let payload = json!({"rc": 0, "rt": 4, "data": null});
        assert!(matches!(
            parse_stock(&payload),
            Err(ProviderFailure::EmptyResponse { .. })
        ));
    }

    #[test]
    fn test_parse_missing_data() {
        assert!(matches!(
            parse_stock(&json!({"rc": 102})),
            Err(ProviderFailure::ParseError { .. })
        ));
    }

    #[tokio::test]
    #[ignore = "requires network access"]
    async fn test_live_quote() {
        let raw = EastmoneyProvider::new().fetch("600519.SS").await.unwrap();
        assert!(raw.get("f43").is_some());
    }
}
