//! Error types and retry classification for the market data crate.
//!
//! This module provides:
//! - [`MarketDataError`]: The main error enum for all quote operations
//! - [`ProviderFailure`]: Typed failure reason of a single provider call
//! - [`NormalizeError`]: Rejection of a provider record by the normalizer
//! - [`RetryClass`]: Classification for determining failover behavior

mod retry;

pub use retry::RetryClass;

use std::time::Duration;

use thiserror::Error;

use crate::models::AssetClass;

/// Why a single provider call failed.
///
/// Each variant is classified into a [`RetryClass`]; transport failures
/// penalize the provider's rate-limit state, payload failures do not.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderFailure {
    /// The call did not complete within the per-call timeout.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: String,
    },

    /// The provider refused the request (HTTP 429, quota notes, ...).
    #[error("Rate limited: {provider}")]
    RateLimited {
        /// The provider that rate limited the request
        provider: String,
        /// Wait hint from the provider, when it sent one
        retry_after: Option<Duration>,
    },

    /// The payload could not be decoded.
    #[error("Parse error: {provider} - {message}")]
    ParseError {
        /// The provider that returned the payload
        provider: String,
        /// What went wrong while decoding
        message: String,
    },

    /// The provider answered without any usable data for the symbol.
    #[error("Empty response: {provider}")]
    EmptyResponse {
        /// The provider that returned nothing
        provider: String,
    },

    /// Connection failure or non-success HTTP status.
    #[error("Network error: {provider} - {message}")]
    Network {
        /// The provider that could not be reached
        provider: String,
        /// Transport error description
        message: String,
    },
}

impl ProviderFailure {
    /// The provider this failure belongs to.
    pub fn provider(&self) -> &str {
        match self {
            Self::Timeout { provider }
            | Self::RateLimited { provider, .. }
            | Self::ParseError { provider, .. }
            | Self::EmptyResponse { provider }
            | Self::Network { provider, .. } => provider,
        }
    }

    /// Returns the failover classification for this failure.
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::Timeout { .. } | Self::RateLimited { .. } | Self::Network { .. } => {
                RetryClass::FailoverWithPenalty
            }
            Self::ParseError { .. } | Self::EmptyResponse { .. } => RetryClass::NextProvider,
        }
    }

    /// Whether the network exchange itself succeeded.
    ///
    /// This is the outcome reported to the rate limiter, independent of
    /// whether the payload turned out to be usable.
    pub fn network_succeeded(&self) -> bool {
        self.retry_class() != RetryClass::FailoverWithPenalty
    }
}

/// Rejection of a provider record by the normalizer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    /// No price field could be found in the record.
    #[error("Missing price in {provider} record")]
    MissingPrice {
        /// The provider whose record was rejected
        provider: String,
    },

    /// A field was present but could not be read as a number.
    #[error("Invalid {field} in {provider} record: {value}")]
    InvalidNumber {
        /// The provider whose record was rejected
        provider: String,
        /// Canonical field name
        field: &'static str,
        /// Raw value as received
        value: String,
    },

    /// The price was zero or negative.
    #[error("Non-positive price in {provider} record: {price}")]
    NonPositivePrice {
        /// The provider whose record was rejected
        provider: String,
        /// Offending price
        price: String,
    },
}

/// Errors that can occur during quote operations.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The symbol is empty or malformed for its asset class.
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// The asset class string is not one of the supported classes.
    #[error("Invalid asset class: {0}")]
    InvalidAssetClass(String),

    /// A single provider call failed.
    #[error(transparent)]
    Provider(#[from] ProviderFailure),

    /// A provider record could not be normalized.
    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    /// Data validation failed.
    /// The provider returned data that failed validation checks.
    #[error("Validation failed: {message}")]
    ValidationFailed {
        /// Description of the validation failure
        message: String,
    },

    /// No providers are registered for the asset class.
    #[error("No providers configured for {0}")]
    NoProvidersConfigured(AssetClass),

    /// Every provider in the ordered list was tried and none succeeded.
    #[error("All sources failed for {symbol} ({asset_class}): {attempts}")]
    AllSourcesFailed {
        /// The requested symbol
        symbol: String,
        /// The requested asset class
        asset_class: AssetClass,
        /// Per-provider attempt summary
        attempts: String,
    },

    /// The caller cancelled the request.
    #[error("Request cancelled")]
    Cancelled,

    /// The caller's deadline passed before a provider answered.
    #[error("Deadline exceeded")]
    DeadlineExceeded,

    /// The service configuration is unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl MarketDataError {
    /// Returns the failover classification for this error.
    ///
    /// - [`RetryClass::Never`]: Stop resolving, the error is terminal
    /// - [`RetryClass::FailoverWithPenalty`]: Penalize the provider, try the next one
    /// - [`RetryClass::NextProvider`]: Try the next provider in the chain
    ///
    /// # Examples
    ///
    /// ```
    /// use quotehub_market_data::errors::{MarketDataError, ProviderFailure, RetryClass};
    ///
    /// let error = MarketDataError::from(ProviderFailure::Timeout { provider: "YAHOO".to_string() });
    /// assert_eq!(error.retry_class(), RetryClass::FailoverWithPenalty);
    ///
    /// let error = MarketDataError::Cancelled;
    /// assert_eq!(error.retry_class(), RetryClass::Never);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::Provider(failure) => failure.retry_class(),

            // Payload quality problems - another provider may do better
            Self::Normalize(_) | Self::ValidationFailed { .. } => RetryClass::NextProvider,

            // Invalid requests, caller aborts and exhausted chains - terminal
            Self::InvalidSymbol(_)
            | Self::InvalidAssetClass(_)
            | Self::NoProvidersConfigured(_)
            | Self::AllSourcesFailed { .. }
            | Self::Cancelled
            | Self::DeadlineExceeded
            | Self::InvalidConfig(_) => RetryClass::Never,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> String {
        "YAHOO".to_string()
    }

    #[test]
    fn test_transport_failures_fail_over_with_penalty() {
        let failures = [
            ProviderFailure::Timeout { provider: provider() },
            ProviderFailure::RateLimited {
                provider: provider(),
                retry_after: None,
            },
            ProviderFailure::Network {
                provider: provider(),
                message: "connection reset".to_string(),
            },
        ];

        for failure in failures {
            assert_eq!(failure.retry_class(), RetryClass::FailoverWithPenalty);
            assert!(!failure.network_succeeded());
        }
    }

    #[test]
    fn test_payload_failures_try_next_provider() {
        let failures = [
            ProviderFailure::ParseError {
                provider: provider(),
                message: "expected value".to_string(),
            },
            ProviderFailure::EmptyResponse { provider: provider() },
        ];

        for failure in failures {
            assert_eq!(failure.retry_class(), RetryClass::NextProvider);
            assert!(failure.network_succeeded());
        }
    }

    #[test]
    fn test_normalize_error_tries_next_provider() {
        let error = MarketDataError::from(NormalizeError::MissingPrice { provider: provider() });
        assert_eq!(error.retry_class(), RetryClass::NextProvider);
    }

    #[test]
    fn test_terminal_errors_never_retry() {
        assert_eq!(MarketDataError::Cancelled.retry_class(), RetryClass::Never);
        assert_eq!(MarketDataError::DeadlineExceeded.retry_class(), RetryClass::Never);
        assert_eq!(
            MarketDataError::InvalidSymbol(String::new()).retry_class(),
            RetryClass::Never
        );
    }

    #[test]
    fn test_error_display() {
        let error = MarketDataError::from(ProviderFailure::RateLimited {
            provider: provider(),
            retry_after: None,
        });
        assert_eq!(format!("{}", error), "Rate limited: YAHOO");

        let error = MarketDataError::from(ProviderFailure::Network {
            provider: "SINA".to_string(),
            message: "HTTP 502".to_string(),
        });
        assert_eq!(format!("{}", error), "Network error: SINA - HTTP 502");

        let error = MarketDataError::NoProvidersConfigured(AssetClass::Crypto);
        assert_eq!(format!("{}", error), "No providers configured for CRYPTO");
    }

    #[test]
    fn test_failure_provider_accessor() {
        let failure = ProviderFailure::ParseError {
            provider: "TENCENT".to_string(),
            message: "short payload".to_string(),
        };
        assert_eq!(failure.provider(), "TENCENT");
    }
}
