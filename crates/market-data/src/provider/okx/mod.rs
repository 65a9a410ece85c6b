//! OKX quote provider implementation.
//!
//! Spot tickers via `/api/v5/market/ticker`. OKX wraps every answer in
//! `{"code":"0","msg":"","data":[...]}`; a non-zero code is an API error.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::errors::ProviderFailure;
use crate::models::{AssetClass, ProviderResult};
use crate::provider::{extract_fields, parse_error, ProviderAdapter, ProviderHttp};
use crate::registry::RateLimitConfig;
use crate::resolver::CryptoPair;

const BASE_URL: &str = "https://www.okx.com/api/v5/market/ticker";
const PROVIDER_ID: &str = "OKX";

const TICKER_FIELDS: &[&str] = &["last", "open24h", "high24h", "low24h", "vol24h", "ts"];

/// Instrument does not exist.
const CODE_UNKNOWN_INSTRUMENT: &str = "51001";
/// Too many requests.
const CODE_RATE_LIMITED: &str = "50011";

#[derive(Debug, Deserialize)]
struct OkxResponse {
    code: String,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    data: Vec<Map<String, Value>>,
}

/// OKX quote provider.
pub struct OkxProvider {
    http: ProviderHttp,
    base_url: String,
}

impl OkxProvider {
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

impl Default for OkxProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_ticker(payload: Value) -> ProviderResult {
    let response: OkxResponse = serde_json::from_value(payload)
        .map_err(|e| parse_error(PROVIDER_ID, format!("Unexpected response shape: {}", e)))?;

    match response.code.as_str() {
        "0" => {}
        CODE_UNKNOWN_INSTRUMENT => {
            return Err(ProviderFailure::EmptyResponse {
                provider: PROVIDER_ID.to_string(),
            })
        }
        CODE_RATE_LIMITED => {
            return Err(ProviderFailure::RateLimited {
                provider: PROVIDER_ID.to_string(),
                retry_after: None,
            })
        }
        code => {
            return Err(parse_error(
                PROVIDER_ID,
                format!("API error {}: {}", code, response.msg),
            ))
        }
    }

    let ticker = response
        .data
        .first()
        .ok_or_else(|| ProviderFailure::EmptyResponse {
            provider: PROVIDER_ID.to_string(),
        })?;
    extract_fields(PROVIDER_ID, ticker, TICKER_FIELDS)
}

#[async_trait]
impl ProviderAdapter for OkxProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn asset_classes(&self) -> &'static [AssetClass] {
        &[AssetClass::Crypto]
    }

    fn rate_limit(&self) -> RateLimitConfig {
        RateLimitConfig::per_window(120, 5000)
    }

    fn supports(&self, symbol: &str) -> bool {
        CryptoPair::parse(symbol).is_ok()
    }

    async fn fetch(&self, symbol: &str) -> ProviderResult {
        let pair = CryptoPair::parse(symbol).map_err(|e| parse_error(PROVIDER_ID, e.to_string()))?;
        let inst_id = pair.okx_inst_id();
        let payload = self
            .http
            .get_json(&self.base_url, &[("instId", inst_id.as_str())])
            .await?;
        parse_ticker(payload)
    }
}
