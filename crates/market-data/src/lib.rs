//! Quotehub Market Data Crate
//!
//! Multi-source quote acquisition: for a requested symbol, try an ordered
//! list of independent providers until one answers, normalize the payload
//! into one canonical [`Quote`], cache it, and keep every outbound call
//! inside per-provider rate limits.
//!
//! # Overview
//!
//! The crate supports:
//! - Three asset classes: equities, China A-shares, crypto pairs
//! - Twelve providers: Finnhub, Yahoo, Alpha Vantage, Tushare, Eastmoney,
//!   Sina, Tencent, Binance, OKX, Coinbase, Kraken, CoinGecko
//! - Sliding-window rate limiting with exponential backoff
//! - TTL and priority aware caching with stale and simulated fallbacks
//!
//! # Architecture
//!
//! ```text
//! +------------------+
//! |   QuoteService   |  (get_quote, batch_get_quotes)
//! +------------------+
//!          |  miss
//!          v
//! +------------------+     +------------------+
//! |    QuoteCache    |     |   RateLimiter    |  (per provider)
//! +------------------+     +------------------+
//!          |                        ^
//!          v                        |
//! +------------------+              |
//! | FetchOrchestrator| -------------+  (sequential failover)
//! +------------------+
//!          |
//!          v
//! +------------------+
//! | ProviderAdapter  |  (Finnhub, Tushare, Binance, ...)
//! +------------------+
//!          |  RawQuote
//!          v
//! +------------------+
//! |    Normalizer    |  (provider fields -> Quote)
//! +------------------+
//! ```
//!
//! # Core Types
//!
//! - [`Quote`] - Canonical quote with a mandatory [`Reliability`] tag
//! - [`RawQuote`] - Provider-native fields before normalization
//! - [`AssetClass`] - Selects provider list and normalization rules
//! - [`FetchContext`] - Caller deadline and cancellation signal
//! - [`QuoteServiceConfig`] - Serde and environment driven settings

pub mod cache;
pub mod config;
pub mod context;
pub mod errors;
pub mod models;
pub mod normalizer;
pub mod provider;
pub mod registry;
pub mod resolver;
pub mod service;

// Re-export all public types from models
pub use models::{AssetClass, ProviderId, ProviderResult, Quote, RawQuote, Reliability};

pub use cache::{cache_key, CachePriority, CacheStatsSnapshot, CacheTtls, QuoteCache};
pub use config::{FallbackPolicy, ProviderSettings, QuoteServiceConfig, RateLimitOverride};
pub use context::{CancelHandle, FetchContext};
pub use errors::{MarketDataError, NormalizeError, ProviderFailure, RetryClass};
pub use normalizer::normalize;
pub use resolver::{canonical_symbol, AShareCode, CryptoPair};

// Re-export provider types
pub use provider::alpha_vantage::AlphaVantageProvider;
pub use provider::binance::BinanceProvider;
pub use provider::coinbase::CoinbaseProvider;
pub use provider::coingecko::CoinGeckoProvider;
pub use provider::eastmoney::EastmoneyProvider;
pub use provider::finnhub::FinnhubProvider;
pub use provider::kraken::KrakenProvider;
pub use provider::okx::OkxProvider;
pub use provider::sina::SinaProvider;
pub use provider::tencent::TencentProvider;
pub use provider::tushare::TushareProvider;
pub use provider::yahoo::YahooProvider;
pub use provider::{ProviderAdapter, ProviderHttp};

// Re-export registry types
pub use registry::{
    Acquire, DenyReason, FetchDiagnostics, FetchOrchestrator, ProviderAttempt, ProviderRoutes,
    QuoteValidator, RateLimitConfig, RateLimitSnapshot, RateLimiter, SkipReason,
    ValidationSeverity,
};

pub use service::{default_routes, spawn_cache_sweeper, QuoteService};
