//! Service configuration.
//!
//! [`QuoteServiceConfig`] deserializes from any serde source and can be read
//! from `QUOTEHUB_*` environment variables. Every field has a default, so an
//! empty environment yields a working keyless setup.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::cache::{CacheTtls, DEFAULT_CACHE_CAPACITY};
use crate::errors::MarketDataError;
use crate::registry::{RateLimitConfig, DEFAULT_CALL_TIMEOUT};

const ENV_PREFIX: &str = "QUOTEHUB_";
const RATE_LIMIT_PREFIX: &str = "QUOTEHUB_RATE_LIMIT_";

/// What `get_quote` does once every provider has failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Serve the last cached value, else a simulated quote
    #[default]
    StaleThenSynthetic,
    /// Serve the last cached value, else fail
    StaleOnly,
    /// Fail with `AllSourcesFailed`
    Disabled,
}

impl FallbackPolicy {
    pub fn allows_stale(&self) -> bool {
        !matches!(self, Self::Disabled)
    }

    pub fn allows_synthetic(&self) -> bool {
        matches!(self, Self::StaleThenSynthetic)
    }
}

impl FromStr for FallbackPolicy {
    type Err = MarketDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "stale_then_synthetic" | "synthetic" => Ok(Self::StaleThenSynthetic),
            "stale_only" | "stale" => Ok(Self::StaleOnly),
            "disabled" | "none" | "off" => Ok(Self::Disabled),
            other => Err(MarketDataError::InvalidConfig(format!(
                "unknown fallback policy '{}'",
                other
            ))),
        }
    }
}

/// Vendor credentials. Adapters that need a key are only wired when it is set.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub finnhub_api_key: Option<String>,
    pub alpha_vantage_api_key: Option<String>,
    pub tushare_token: Option<String>,
}

impl ProviderSettings {
    fn non_empty(value: &Option<String>) -> Option<&str> {
        value.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn finnhub_api_key(&self) -> Option<&str> {
        Self::non_empty(&self.finnhub_api_key)
    }

    pub fn alpha_vantage_api_key(&self) -> Option<&str> {
        Self::non_empty(&self.alpha_vantage_api_key)
    }

    pub fn tushare_token(&self) -> Option<&str> {
        Self::non_empty(&self.tushare_token)
    }
}

// Keys never reach the logs
impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn mask(value: Option<&str>) -> &'static str {
            if value.is_some() {
                "<set>"
            } else {
                "<unset>"
            }
        }

        f.debug_struct("ProviderSettings")
            .field("finnhub_api_key", &mask(self.finnhub_api_key()))
            .field("alpha_vantage_api_key", &mask(self.alpha_vantage_api_key()))
            .field("tushare_token", &mask(self.tushare_token()))
            .finish()
    }
}

/// Window limits for one service, overriding the adapter's declared limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RateLimitOverride {
    pub requests_per_minute: u32,
    pub requests_per_hour: u32,
}

impl RateLimitOverride {
    pub fn to_config(self) -> RateLimitConfig {
        RateLimitConfig::per_window(self.requests_per_minute, self.requests_per_hour)
    }
}

impl FromStr for RateLimitOverride {
    type Err = MarketDataError;

    /// Parses `"<per-minute>/<per-hour>"`, e.g. `"30/1000"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            MarketDataError::InvalidConfig(format!(
                "rate limit '{}' must look like <per-minute>/<per-hour>",
                s
            ))
        };
        let (minute, hour) = s.split_once('/').ok_or_else(invalid)?;
        Ok(Self {
            requests_per_minute: minute.trim().parse().map_err(|_| invalid())?,
            requests_per_hour: hour.trim().parse().map_err(|_| invalid())?,
        })
    }
}

/// Configuration for [`QuoteService`](crate::service::QuoteService).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct QuoteServiceConfig {
    pub cache_capacity: usize,
    pub equity_ttl_secs: u64,
    pub a_share_ttl_secs: u64,
    pub crypto_ttl_secs: u64,
    /// TTL for simulated quotes, kept short so real data replaces them soon
    pub simulated_ttl_secs: u64,
    pub provider_timeout_secs: u64,
    pub batch_concurrency: usize,
    pub fallback_policy: FallbackPolicy,
    pub providers: ProviderSettings,
    /// Per-service overrides keyed by provider id (`FINNHUB`, `BINANCE`, ...)
    pub rate_limits: HashMap<String, RateLimitOverride>,
}

impl Default for QuoteServiceConfig {
    fn default() -> Self {
        let ttls = CacheTtls::default();
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            equity_ttl_secs: ttls.equity.as_secs(),
            a_share_ttl_secs: ttls.a_share.as_secs(),
            crypto_ttl_secs: ttls.crypto.as_secs(),
            simulated_ttl_secs: 10,
            provider_timeout_secs: DEFAULT_CALL_TIMEOUT.as_secs(),
            batch_concurrency: 8,
            fallback_policy: FallbackPolicy::default(),
            providers: ProviderSettings::default(),
            rate_limits: HashMap::new(),
        }
    }
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> Result<T, MarketDataError> {
    value
        .trim()
        .parse()
        .map_err(|_| MarketDataError::InvalidConfig(format!("invalid {}: '{}'", name, value)))
}

impl QuoteServiceConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, MarketDataError> {
        Self::from_vars(std::env::vars())
    }

    /// Build a configuration from `QUOTEHUB_*` key/value pairs.
    ///
    /// Unknown `QUOTEHUB_*` keys are ignored; malformed values are errors.
    pub fn from_vars<I>(vars: I) -> Result<Self, MarketDataError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut config = Self::default();

        for (key, value) in vars {
            let Some(name) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };

            if let Some(service) = key.strip_prefix(RATE_LIMIT_PREFIX) {
                config
                    .rate_limits
                    .insert(service.to_ascii_uppercase(), value.parse()?);
                continue;
            }

            match name {
                "CACHE_CAPACITY" => config.cache_capacity = parse_var(&key, &value)?,
                "EQUITY_TTL_SECS" => config.equity_ttl_secs = parse_var(&key, &value)?,
                "A_SHARE_TTL_SECS" => config.a_share_ttl_secs = parse_var(&key, &value)?,
                "CRYPTO_TTL_SECS" => config.crypto_ttl_secs = parse_var(&key, &value)?,
                "SIMULATED_TTL_SECS" => config.simulated_ttl_secs = parse_var(&key, &value)?,
                "PROVIDER_TIMEOUT_SECS" => {
                    config.provider_timeout_secs = parse_var(&key, &value)?
                }
                "BATCH_CONCURRENCY" => config.batch_concurrency = parse_var(&key, &value)?,
                "FALLBACK_POLICY" => config.fallback_policy = value.parse()?,
                "FINNHUB_API_KEY" => config.providers.finnhub_api_key = Some(value),
                "ALPHA_VANTAGE_API_KEY" => config.providers.alpha_vantage_api_key = Some(value),
                "TUSHARE_TOKEN" => config.providers.tushare_token = Some(value),
                _ => {}
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the service cannot run with.
    pub fn validate(&self) -> Result<(), MarketDataError> {
        let checks = [
            (self.cache_capacity == 0, "cache_capacity must be positive"),
            (self.provider_timeout_secs == 0, "provider_timeout_secs must be positive"),
            (self.batch_concurrency == 0, "batch_concurrency must be positive"),
            (self.simulated_ttl_secs == 0, "simulated_ttl_secs must be positive"),
        ];
        for (failed, message) in checks {
            if failed {
                return Err(MarketDataError::InvalidConfig(message.to_string()));
            }
        }

        for (service, limits) in &self.rate_limits {
            if limits.requests_per_minute == 0 || limits.requests_per_hour == 0 {
                return Err(MarketDataError::InvalidConfig(format!(
                    "rate limit for {} must allow at least one request per window",
                    service
                )));
            }
        }
        Ok(())
    }

    pub fn cache_ttls(&self) -> CacheTtls {
        CacheTtls {
            equity: Duration::from_secs(self.equity_ttl_secs),
            a_share: Duration::from_secs(self.a_share_ttl_secs),
            crypto: Duration::from_secs(self.crypto_ttl_secs),
        }
    }

    pub fn simulated_ttl(&self) -> Duration {
        Duration::from_secs(self.simulated_ttl_secs)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }
}
