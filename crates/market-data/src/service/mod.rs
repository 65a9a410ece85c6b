//! Public quote service.
//!
//! [`QuoteService`] ties the pieces together:
//!
//! ```text
//! get_quote ──► canonical symbol ──► QuoteCache ──hit──► Quote
//!                                       │ miss
//!                                       ▼
//!                               FetchOrchestrator ──ok──► cache.set ──► Quote
//!                                       │ AllSourcesFailed
//!                                       ▼
//!                          stale cache value (Fallback)
//!                                       │ none
//!                                       ▼
//!                          synthetic quote (Simulated, Low priority)
//! ```

mod defaults;
mod fallback;
mod sweeper;

pub use defaults::default_routes;
pub use fallback::{symbol_seed, synthetic_quote};
pub use sweeper::spawn_cache_sweeper;

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use futures::stream::{self, StreamExt};
use log::{debug, info, warn};
use tokio::task::JoinHandle;

use crate::cache::{cache_key, CachePriority, CacheStatsSnapshot, QuoteCache};
use crate::config::{FallbackPolicy, QuoteServiceConfig};
use crate::context::FetchContext;
use crate::errors::MarketDataError;
use crate::models::{AssetClass, Quote, SIMULATED_SOURCE};
use crate::provider::ProviderAdapter;
use crate::registry::{FetchOrchestrator, ProviderRoutes, RateLimitSnapshot, RateLimiter};
use crate::resolver::canonical_symbol;

const DEFAULT_BATCH_CONCURRENCY: usize = 8;
const DEFAULT_SIMULATED_TTL: Duration = Duration::from_secs(10);

/// Entry point for quote lookups.
pub struct QuoteService {
    orchestrator: FetchOrchestrator,
    cache: Arc<QuoteCache>,
    /// Cache keys of symbols the caller holds
    held: RwLock<HashSet<String>>,
    fallback_policy: FallbackPolicy,
    simulated_ttl: Duration,
    batch_concurrency: usize,
}

impl QuoteService {
    /// Create a service over an orchestrator and a shared cache.
    ///
    /// Fails with `InvalidConfig` when any asset class has no providers.
    pub fn new(
        orchestrator: FetchOrchestrator,
        cache: Arc<QuoteCache>,
    ) -> Result<Self, MarketDataError> {
        let missing = orchestrator.missing_classes();
        if !missing.is_empty() {
            let names: Vec<&str> = missing.iter().map(AssetClass::as_str).collect();
            return Err(MarketDataError::InvalidConfig(format!(
                "no providers configured for {}",
                names.join(", ")
            )));
        }

        Ok(Self {
            orchestrator,
            cache,
            held: RwLock::new(HashSet::new()),
            fallback_policy: FallbackPolicy::default(),
            simulated_ttl: DEFAULT_SIMULATED_TTL,
            batch_concurrency: DEFAULT_BATCH_CONCURRENCY,
        })
    }

    /// Build a service over the built-in adapters.
    pub fn from_config(config: &QuoteServiceConfig) -> Result<Self, MarketDataError> {
        Self::with_routes(default_routes(&config.providers), config)
    }

    /// Build a service over `routes`, applying every other setting in `config`.
    pub fn with_routes(
        routes: ProviderRoutes,
        config: &QuoteServiceConfig,
    ) -> Result<Self, MarketDataError> {
        config.validate()?;

        let rate_limiter = Arc::new(RateLimiter::new());
        for (service, limits) in &config.rate_limits {
            rate_limiter.configure(service, limits.to_config());
        }

        let orchestrator = FetchOrchestrator::new(routes, rate_limiter)
            .with_call_timeout(config.provider_timeout());
        let cache = Arc::new(
            QuoteCache::with_capacity(config.cache_capacity).with_ttls(config.cache_ttls()),
        );

        Ok(Self::new(orchestrator, cache)?
            .with_fallback_policy(config.fallback_policy)
            .with_simulated_ttl(config.simulated_ttl())
            .with_batch_concurrency(config.batch_concurrency))
    }

    pub fn with_fallback_policy(mut self, policy: FallbackPolicy) -> Self {
        self.fallback_policy = policy;
        self
    }

    pub fn with_simulated_ttl(mut self, ttl: Duration) -> Self {
        self.simulated_ttl = ttl;
        self
    }

    pub fn with_batch_concurrency(mut self, concurrency: usize) -> Self {
        self.batch_concurrency = concurrency.max(1);
        self
    }

    pub fn cache(&self) -> &Arc<QuoteCache> {
        &self.cache
    }

    pub fn orchestrator(&self) -> &FetchOrchestrator {
        &self.orchestrator
    }

    fn read_held(&self) -> RwLockReadGuard<'_, HashSet<String>> {
        self.held.read().unwrap_or_else(|poisoned| {
            warn!("Held symbols lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write_held(&self) -> RwLockWriteGuard<'_, HashSet<String>> {
        self.held.write().unwrap_or_else(|poisoned| {
            warn!("Held symbols lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Get a quote for `symbol`.
    ///
    /// Errors only for invalid input, a cancelled or expired context, or
    /// when the fallback policy does not allow a substitute.
    pub async fn get_quote(
        &self,
        ctx: &FetchContext,
        symbol: &str,
        asset_class: AssetClass,
    ) -> Result<Quote, MarketDataError> {
        let symbol = canonical_symbol(symbol, asset_class)?;
        let key = cache_key(&symbol, asset_class);

        if let Some(quote) = self.cache.get(&key) {
            debug!("Cache hit for {}", key);
            return Ok(quote);
        }

        match self.orchestrator.resolve(ctx, &symbol, asset_class).await {
            Ok(quote) => {
                let priority = if self.read_held().contains(&key) {
                    CachePriority::High
                } else {
                    CachePriority::Normal
                };
                self.cache
                    .set(&key, quote.clone(), priority, quote.source());
                Ok(quote)
            }
            Err(err @ MarketDataError::AllSourcesFailed { .. }) => {
                self.fallback(&key, &symbol, asset_class, err)
            }
            Err(err) => Err(err),
        }
    }

    fn fallback(
        &self,
        key: &str,
        symbol: &str,
        asset_class: AssetClass,
        err: MarketDataError,
    ) -> Result<Quote, MarketDataError> {
        if self.fallback_policy.allows_stale() {
            if let Some(stale) = self.cache.get_stale(key) {
                if !stale.is_simulated() || self.fallback_policy.allows_synthetic() {
                    warn!("Serving stale {} quote for {}: {}", stale.source(), key, err);
                    return Ok(stale.into_fallback());
                }
            }
        }

        if !self.fallback_policy.allows_synthetic() {
            return Err(err);
        }

        let quote = synthetic_quote(symbol, asset_class)?;
        warn!(
            "Serving simulated quote for {} (price {}): {}",
            key,
            quote.price(),
            err
        );
        self.cache.set_with_ttl(
            key,
            quote.clone(),
            CachePriority::Low,
            SIMULATED_SOURCE,
            self.simulated_ttl,
        );
        Ok(quote)
    }

    /// Fetch many symbols of one asset class concurrently.
    ///
    /// Results are keyed by canonical symbol. Invalid symbols and symbols
    /// that could not be served are logged and left out.
    pub async fn batch_get_quotes<S: AsRef<str>>(
        &self,
        ctx: &FetchContext,
        symbols: &[S],
        asset_class: AssetClass,
    ) -> HashMap<String, Quote> {
        let mut canonical = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            match canonical_symbol(symbol.as_ref(), asset_class) {
                Ok(symbol) if !canonical.contains(&symbol) => canonical.push(symbol),
                Ok(_) => {}
                Err(e) => warn!("Skipping batch symbol '{}': {}", symbol.as_ref(), e),
            }
        }

        let results: Vec<_> = stream::iter(canonical)
            .map(|symbol| async move {
                let result = self.get_quote(ctx, &symbol, asset_class).await;
                (symbol, result)
            })
            .buffer_unordered(self.batch_concurrency)
            .collect()
            .await;

        let mut quotes = HashMap::with_capacity(results.len());
        for (symbol, result) in results {
            match result {
                Ok(quote) => {
                    quotes.insert(symbol, quote);
                }
                Err(e) => warn!("Batch quote for {} failed: {}", symbol, e),
            }
        }
        quotes
    }

    pub fn cache_stats(&self) -> CacheStatsSnapshot {
        self.cache.stats()
    }

    /// Replace or reorder the providers for an asset class.
    pub fn configure_provider(
        &self,
        asset_class: AssetClass,
        providers: Vec<Arc<dyn ProviderAdapter>>,
    ) -> Result<(), MarketDataError> {
        self.orchestrator.configure(asset_class, providers)
    }

    pub fn rate_limit_state(&self, service: &str) -> RateLimitSnapshot {
        self.orchestrator.rate_limiter().state(service)
    }

    /// Cache future quotes for `symbol` at high priority.
    pub fn mark_held(&self, symbol: &str, asset_class: AssetClass) -> Result<(), MarketDataError> {
        let key = cache_key(&canonical_symbol(symbol, asset_class)?, asset_class);
        if self.write_held().insert(key.clone()) {
            info!("Marked {} as held", key);
        }
        Ok(())
    }

    pub fn unmark_held(&self, symbol: &str, asset_class: AssetClass) -> Result<(), MarketDataError> {
        let key = cache_key(&canonical_symbol(symbol, asset_class)?, asset_class);
        if self.write_held().remove(&key) {
            info!("Unmarked {} as held", key);
        }
        Ok(())
    }

    pub fn is_held(&self, symbol: &str, asset_class: AssetClass) -> bool {
        canonical_symbol(symbol, asset_class)
            .map(|symbol| self.read_held().contains(&cache_key(&symbol, asset_class)))
            .unwrap_or(false)
    }

    /// Start a background sweeper over this service's cache.
    pub fn spawn_cache_sweeper(&self, every: Duration) -> JoinHandle<()> {
        spawn_cache_sweeper(Arc::clone(&self.cache), every)
    }
}
