//! Quote provider trait definitions.
//!
//! This module defines the core `ProviderAdapter` trait that every quote
//! source implements.

use async_trait::async_trait;

use crate::models::{AssetClass, ProviderResult};
use crate::registry::RateLimitConfig;

/// Trait for quote providers.
///
/// An adapter performs exactly one outbound request per `fetch` and extracts
/// the provider-native fields into a [`RawQuote`](crate::models::RawQuote).
/// It does not normalize, retry, or consult the rate limiter; the
/// orchestrator owns all of that.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use quotehub_market_data::models::{AssetClass, ProviderResult, RawQuote};
/// use quotehub_market_data::provider::ProviderAdapter;
/// use quotehub_market_data::registry::RateLimitConfig;
///
/// struct MyProvider;
///
/// #[async_trait]
/// impl ProviderAdapter for MyProvider {
///     fn id(&self) -> &'static str {
///         "MY_PROVIDER"
///     }
///
///     fn asset_classes(&self) -> &'static [AssetClass] {
///         &[AssetClass::Equity]
///     }
///
///     fn rate_limit(&self) -> RateLimitConfig {
///         RateLimitConfig::per_window(30, 500)
///     }
///
///     async fn fetch(&self, symbol: &str) -> ProviderResult {
///         // ... one HTTP call, then extract fields
///     }
/// }
/// ```
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Unique identifier for this provider.
    ///
    /// Should be a constant string like "YAHOO", "BINANCE", etc. Used as the
    /// rate-limit service key, the normalizer alias key and the quote source.
    fn id(&self) -> &'static str;

    /// Asset classes this provider can quote.
    fn asset_classes(&self) -> &'static [AssetClass];

    /// Rate limiting configuration applied to this provider's service key.
    fn rate_limit(&self) -> RateLimitConfig;

    /// Whether the provider can translate `symbol` at all.
    ///
    /// Checked before any rate-limit slot is taken. Defaults to true.
    fn supports(&self, _symbol: &str) -> bool {
        true
    }

    /// Fetch the latest quote record for a canonical symbol.
    async fn fetch(&self, symbol: &str) -> ProviderResult;
}
