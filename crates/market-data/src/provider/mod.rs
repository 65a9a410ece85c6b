//! Quote provider abstractions and implementations.
//!
//! This module contains:
//! - The `ProviderAdapter` trait that all providers implement
//! - Shared HTTP plumbing with uniform failure mapping
//! - Concrete adapters for equity, China A-share and crypto sources
//!
//! # Architecture
//!
//! Adapters are deliberately thin: one request per call, provider-native
//! fields out. Rate limiting, timeouts, failover and normalization live in
//! the orchestrator so every adapter is treated the same way.
//!
//! | Asset class | Adapters                                        |
//! |-------------|-------------------------------------------------|
//! | Equity      | FINNHUB, YAHOO, ALPHA_VANTAGE                   |
//! | A-share     | TUSHARE, EASTMONEY, SINA, TENCENT               |
//! | Crypto      | BINANCE, OKX, COINBASE, KRAKEN, COINGECKO       |

mod http;
mod traits;

pub mod alpha_vantage;
pub mod binance;
pub mod coinbase;
pub mod coingecko;
pub mod eastmoney;
pub mod finnhub;
pub mod kraken;
pub mod okx;
pub mod sina;
pub mod tencent;
pub mod tushare;
pub mod yahoo;

pub use http::{classify_status, parse_json, ProviderHttp, DEFAULT_HTTP_TIMEOUT};
pub use traits::ProviderAdapter;

pub(crate) use http::parse_error;

use std::borrow::Cow;

use serde_json::{Map, Value};

use crate::errors::ProviderFailure;
use crate::models::RawQuote;

/// Copy the listed keys from a decoded object into a fresh record.
///
/// Fails with `EmptyResponse` when none of the keys are present.
pub(crate) fn extract_fields(
    provider: &'static str,
    source: &Map<String, Value>,
    keys: &[&str],
) -> Result<RawQuote, ProviderFailure> {
    let mut raw = RawQuote::new(Cow::Borrowed(provider));
    for key in keys {
        if let Some(value) = source.get(*key) {
            raw.insert(*key, value.clone());
        }
    }

    if raw.is_empty() {
        return Err(ProviderFailure::EmptyResponse {
            provider: provider.to_string(),
        });
    }
    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_fields_copies_listed_keys() {
        let source = json!({"c": 1.5, "x": "ignored", "t": null});
        let raw = extract_fields("TEST", source.as_object().unwrap(), &["c", "t", "d"]).unwrap();
        assert_eq!(raw.get("c"), Some(&json!(1.5)));
        assert!(raw.get("x").is_none());
        assert!(raw.get("t").is_none());
    }

    #[test]
    fn test_extract_fields_empty_is_failure() {
        let source = json!({"other": 1});
        let err = extract_fields("TEST", source.as_object().unwrap(), &["c"]).unwrap_err();
        assert_eq!(
            err,
            ProviderFailure::EmptyResponse {
                provider: "TEST".to_string()
            }
        );
    }
}
