//! Tushare Pro quote provider implementation.
//!
//! China A-shares via the `daily` API (latest daily bar). Requires a token;
//! every call is a JSON POST carrying `api_name`, `token`, `params` and the
//! requested `fields`. Responses come back column-oriented:
//!
//! ```text
//! {"code":0,"data":{"fields":["ts_code","close",...],"items":[["600519.SH",1700.0,...]]}}
//! ```

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::errors::ProviderFailure;
use crate::models::{AssetClass, ProviderResult};
use crate::provider::{extract_fields, parse_error, ProviderAdapter, ProviderHttp};
use crate::registry::RateLimitConfig;
use crate::resolver::AShareCode;

const BASE_URL: &str = "http://api.tushare.pro";
const PROVIDER_ID: &str = "TUSHARE";

const DAILY_FIELDS: &str = "ts_code,trade_date,open,high,low,close,pre_close,change,pct_chg,vol";

/// Tushare's "too many calls per minute" code.
const CODE_RATE_LIMITED: i64 = 40203;

#[derive(Debug, Deserialize)]
struct TushareResponse {
    code: i64,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    data: Option<TushareTable>,
}

#[derive(Debug, Deserialize)]
struct TushareTable {
    fields: Vec<String>,
    #[serde(default)]
    items: Vec<Vec<Value>>,
}

/// Tushare Pro quote provider.
pub struct TushareProvider {
    http: ProviderHttp,
    token: String,
    base_url: String,
}

impl TushareProvider {
    pub fn new(token: String) -> Self {
        Self {
            http: ProviderHttp::new(PROVIDER_ID),
            token,
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Zip the first (most recent) row with the column names.
fn parse_daily(payload: Value) -> ProviderResult {
    let response: TushareResponse = serde_json::from_value(payload)
        .map_err(|e| parse_error(PROVIDER_ID, format!("Unexpected response shape: {}", e)))?;

    if response.code == CODE_RATE_LIMITED {
        return Err(ProviderFailure::RateLimited {
            provider: PROVIDER_ID.to_string(),
            retry_after: None,
        });
    }
    if response.code != 0 {
        return Err(parse_error(
            PROVIDER_ID,
            format!(
                "API error {}: {}",
                response.code,
                response.msg.unwrap_or_default()
            ),
        ));
    }

    let table = response.data.ok_or_else(|| ProviderFailure::EmptyResponse {
        provider: PROVIDER_ID.to_string(),
    })?;
    let row = table
        .items
        .into_iter()
        .next()
        .ok_or_else(|| ProviderFailure::EmptyResponse {
            provider: PROVIDER_ID.to_string(),
        })?;

    let record: Map<String, Value> = table.fields.into_iter().zip(row).collect();
    let keys: Vec<&str> = DAILY_FIELDS.split(',').collect();
    extract_fields(PROVIDER_ID, &record, &keys)
}

#[async_trait]
impl ProviderAdapter for TushareProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn asset_classes(&self) -> &'static [AssetClass] {
        &[AssetClass::AShare]
    }

    fn rate_limit(&self) -> RateLimitConfig {
        RateLimitConfig::per_window(50, 2000)
    }

    fn supports(&self, symbol: &str) -> bool {
        AShareCode::parse(symbol).is_ok()
    }

    async fn fetch(&self, symbol: &str) -> ProviderResult {
        let code = AShareCode::parse(symbol).map_err(|e| parse_error(PROVIDER_ID, e.to_string()))?;
        let request = json!({
            "api_name": "daily",
            "token": self.token,
            "params": {"ts_code": code.tushare_code()},
            "fields": DAILY_FIELDS,
        });
        let payload = self.http.post_json(&self.base_url, &request).await?;
        parse_daily(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_daily_takes_latest_row() {
        let payload = json!({
            "request_id": "abc",
            "code": 0,
            "msg": "",
            "data": {
                "fields": ["ts_code", "trade_date", "open", "high", "low", "close", "pre_close", "change", "pct_chg", "vol"],
                "items": [
                    ["600519.SH", "20240105", 1690.0, 1710.0, 1685.0, 1700.0, 1680.0, 20.0, 1.1905, 25000.0],
                    ["600519.SH", "20240104", 1670.0, 1690.0, 1665.0, 1680.0, 1672.0, 8.0, 0.4785, 21000.0]
                ],
                "has_more": false
            }
        });
        let raw = parse_daily(payload).unwrap();
        assert_eq!(raw.get("trade_date"), Some(&json!("20240105")));
        assert_eq!(raw.get("close"), Some(&json!(1700.0)));
        assert_eq!(raw.get("vol"), Some(&json!(25000.0)));
    }

    #[test]
    fn test_parse_daily_errors() {
        let limited = json!({"code": 40203, "msg": "抱歉，您每分钟最多访问该接口50次", "data": null});
        assert!(matches!(
            parse_daily(limited),
            Err(ProviderFailure::RateLimited { .. })
        ));

        let bad_token = json!({"code": 40101, "msg": "您的token不对，请确认。", "data": null});
        assert!(matches!(
            parse_daily(bad_token),
            Err(ProviderFailure::ParseError { .. })
        ));

        let empty = json!({"code": 0, "msg": "", "data": {"fields": ["ts_code"], "items": []}});
        assert!(matches!(
            parse_daily(empty),
            Err(ProviderFailure::EmptyResponse { .. })
        ));
    }

    #[test]
    fn test_supports_only_a_share_codes() {
        let provider = TushareProvider::new("token".to_string());
        assert!(provider.supports("600519.SS"));
        assert!(!provider.supports("AAPL"));
    }
}
