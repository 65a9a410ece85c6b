//! Yahoo Finance quote provider implementation.
//!
//! Uses the public v8 chart endpoint, which needs no crumb or cookie for a
//! single-day range. Symbols are passed through in Yahoo notation
//! (`AAPL`, `BRK-B`, `^GSPC`).

mod models;

use async_trait::async_trait;
use tracing::{debug, warn};
use urlencoding::encode;

use crate::errors::ProviderFailure;
use crate::models::{AssetClass, ProviderResult};
use crate::provider::{extract_fields, parse_error, ProviderAdapter, ProviderHttp};
use crate::registry::RateLimitConfig;

use models::YahooChartResponse;

const BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const PROVIDER_ID: &str = "YAHOO";

const META_FIELDS: &[&str] = &[
    "regularMarketPrice",
    "chartPreviousClose",
    "previousClose",
    "regularMarketVolume",
    "regularMarketTime",
    "regularMarketDayHigh",
    "regularMarketDayLow",
    "currency",
];

/// Yahoo Finance quote provider.
pub struct YahooProvider {
    http: ProviderHttp,
    base_url: String,
}

impl YahooProvider {
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

impl Default for YahooProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_chart(body: &str) -> ProviderResult {
    let response: YahooChartResponse = serde_json::from_str(body)
        .map_err(|e| parse_error(PROVIDER_ID, format!("Failed to parse chart response: {}", e)))?;

    if let Some(error) = response.chart.error {
        debug!(
            "Yahoo chart error {}: {}",
            error.code,
            error.description.unwrap_or_default()
        );
        return Err(ProviderFailure::EmptyResponse {
            provider: PROVIDER_ID.to_string(),
        });
    }

    let result = response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| ProviderFailure::EmptyResponse {
            provider: PROVIDER_ID.to_string(),
        })?;

    if !result.meta.contains_key("regularMarketPrice") {
        warn!("Yahoo chart meta without regularMarketPrice");
    }
    extract_fields(PROVIDER_ID, &result.meta, META_FIELDS)
}

#[async_trait]
impl ProviderAdapter for YahooProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn asset_classes(&self) -> &'static [AssetClass] {
        &[AssetClass::Equity]
    }

    fn rate_limit(&self) -> RateLimitConfig {
        RateLimitConfig::per_window(100, 2000)
    }

    async fn fetch(&self, symbol: &str) -> ProviderResult {
        let url = format!("{}/{}", self.base_url, encode(symbol));
        let body = self
            .http
            .get_text(&url, &[("interval", "1d"), ("range", "1d")])
            .await?;
        parse_chart(&body)
    }
}
