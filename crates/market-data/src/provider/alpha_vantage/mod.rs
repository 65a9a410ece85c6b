//! Alpha Vantage quote provider implementation.
//!
//! Equities via the GLOBAL_QUOTE function.
//!
//! Note: Alpha Vantage free tier is limited to 5 API calls per minute and
//! 25 per day; quota exhaustion is reported in-band with HTTP 200.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::errors::ProviderFailure;
use crate::models::{AssetClass, ProviderResult};
use crate::provider::{extract_fields, parse_error, ProviderAdapter, ProviderHttp};
use crate::registry::RateLimitConfig;

const BASE_URL: &str = "https://www.alphavantage.co/query";
const PROVIDER_ID: &str = "ALPHA_VANTAGE";

const QUOTE_FIELDS: &[&str] = &[
    "02. open",
    "03. high",
    "04. low",
    "05. price",
    "06. volume",
    "07. latest trading day",
    "08. previous close",
    "09. change",
    "10. change percent",
];

// ============================================================================
// API Response Structures
// ============================================================================

/// Response from the GLOBAL_QUOTE function
#[derive(Debug, Deserialize)]
struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote")]
    global_quote: Option<Map<String, Value>>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

// ============================================================================
// AlphaVantageProvider
// ============================================================================

/// Alpha Vantage quote provider.
pub struct AlphaVantageProvider {
    http: ProviderHttp,
    api_key: String,
    base_url: String,
}

impl AlphaVantageProvider {
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

/// Check for API-level errors in the response.
fn check_api_error(response: &GlobalQuoteResponse) -> Result<(), ProviderFailure> {
    if let Some(msg) = &response.error_message {
        if msg.contains("Invalid API call") {
            return Err(ProviderFailure::EmptyResponse {
                provider: PROVIDER_ID.to_string(),
            });
        }
        return Err(parse_error(PROVIDER_ID, msg.clone()));
    }

    // Both "Note" and "Information" carry the quota message
    for msg in [&response.note, &response.information].into_iter().flatten() {
        if msg.contains("call frequency") || msg.contains("rate limit") {
            return Err(ProviderFailure::RateLimited {
                provider: PROVIDER_ID.to_string(),
                retry_after: None,
            });
        }
        warn!("Alpha Vantage notice: {}", msg);
    }

    Ok(())
}

fn parse_global_quote(body: &str) -> ProviderResult {
    let response: GlobalQuoteResponse = serde_json::from_str(body)
        .map_err(|e| parse_error(PROVIDER_ID, format!("Failed to parse response: {}", e)))?;

    check_api_error(&response)?;

    let quote = response
        .global_quote
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ProviderFailure::EmptyResponse {
            provider: PROVIDER_ID.to_string(),
        })?;

    extract_fields(PROVIDER_ID, &quote, QUOTE_FIELDS)
}

#[async_trait]
impl ProviderAdapter for AlphaVantageProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn asset_classes(&self) -> &'static [AssetClass] {
        &[AssetClass::Equity]
    }

    fn rate_limit(&self) -> RateLimitConfig {
        RateLimitConfig::per_window(5, 25)
    }

    async fn fetch(&self, symbol: &str) -> ProviderResult {
        let body = self
            .http
            .get_text(
                &self.base_url,
                &[
                    ("function", "GLOBAL_QUOTE"),
                    ("symbol", symbol),
                    ("apikey", self.api_key.as_str()),
                ],
            )
            .await?;
        parse_global_quote(&body)
    }
}
