//! Sequential provider failover for a single quote.
//!
//! For one symbol the orchestrator walks the asset class's ordered provider
//! list and stops at the first adapter whose record normalizes and
//! validates. Every outbound call passes through one path that:
//! - takes a rate-limit slot (denied providers are skipped, never awaited)
//! - bounds the call with the per-call timeout and the caller's context
//! - reports the network outcome back to the rate limiter
//!
//! ```text
//! Idle -> TryingProvider(0) -> TryingProvider(1) -> ... -> AllExhausted
//!               |                    |
//!               +--> Success         +--> Success
//! ```

use std::borrow::Cow;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use super::{
    Acquire, FetchDiagnostics, ProviderRoutes, QuoteValidator, RateLimiter, SkipReason,
};
use crate::context::FetchContext;
use crate::errors::{MarketDataError, ProviderFailure};
use crate::models::{AssetClass, ProviderId, ProviderResult, Quote};
use crate::normalizer::normalize;
use crate::provider::ProviderAdapter;

/// Default bound on a single provider call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// Resolves quotes by trying providers in order.
pub struct FetchOrchestrator {
    routes: RwLock<ProviderRoutes>,
    rate_limiter: Arc<RateLimiter>,
    validator: QuoteValidator,
    call_timeout: Duration,
}

impl FetchOrchestrator {
    /// Create an orchestrator over `routes`.
    ///
    /// Registers each adapter's declared rate limit with `rate_limiter`,
    /// unless the service was already configured explicitly.
    pub fn new(routes: ProviderRoutes, rate_limiter: Arc<RateLimiter>) -> Self {
        for adapter in routes.adapters() {
            register_rate_limit(&rate_limiter, adapter.as_ref());
        }

        Self {
            routes: RwLock::new(routes),
            rate_limiter,
            validator: QuoteValidator::new(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub fn with_validator(mut self, validator: QuoteValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.rate_limiter
    }

    fn read_routes(&self) -> RwLockReadGuard<'_, ProviderRoutes> {
        self.routes.read().unwrap_or_else(|poisoned| {
            warn!("Provider routes lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write_routes(&self) -> RwLockWriteGuard<'_, ProviderRoutes> {
        self.routes.write().unwrap_or_else(|poisoned| {
            warn!("Provider routes lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Replace the ordered provider list for an asset class.
    ///
    /// Takes effect for resolutions that start afterwards.
    pub fn configure(
        &self,
        asset_class: AssetClass,
        providers: Vec<Arc<dyn ProviderAdapter>>,
    ) -> Result<(), MarketDataError> {
        if providers.is_empty() {
            return Err(MarketDataError::InvalidConfig(format!(
                "provider list for {} must not be empty",
                asset_class
            )));
        }

        for adapter in &providers {
            if !adapter.asset_classes().contains(&asset_class) {
                warn!(
                    "Provider '{}' does not declare {}; it will be skipped for that class",
                    adapter.id(),
                    asset_class
                );
            }
            register_rate_limit(&self.rate_limiter, adapter.as_ref());
        }

        let ids: Vec<_> = providers.iter().map(|p| p.id()).collect();
        self.write_routes().set(asset_class, providers);
        info!("Provider order for {} set to {:?}", asset_class, ids);
        Ok(())
    }

    /// Provider ids for an asset class, in failover order.
    pub fn provider_ids(&self, asset_class: AssetClass) -> Vec<&'static str> {
        self.read_routes().provider_ids(asset_class)
    }

    /// Asset classes with no providers configured.
    pub fn missing_classes(&self) -> Vec<AssetClass> {
        self.read_routes().missing_classes()
    }

    /// Resolve a quote for a canonical symbol.
    pub async fn resolve(
        &self,
        ctx: &FetchContext,
        symbol: &str,
        asset_class: AssetClass,
    ) -> Result<Quote, MarketDataError> {
        self.resolve_with_diagnostics(ctx, symbol, asset_class)
            .await
            .0
    }

    /// Resolve a quote and report what happened with every provider.
    pub async fn resolve_with_diagnostics(
        &self,
        ctx: &FetchContext,
        symbol: &str,
        asset_class: AssetClass,
    ) -> (Result<Quote, MarketDataError>, FetchDiagnostics) {
        let mut diagnostics = FetchDiagnostics::new();

        // Snapshot so the lock is not held across provider calls
        let providers: Vec<Arc<dyn ProviderAdapter>> = self.read_routes().get(asset_class).to_vec();
        if providers.is_empty() {
            warn!("No providers configured for {}", asset_class);
            return (
                Err(MarketDataError::NoProvidersConfigured(asset_class)),
                diagnostics,
            );
        }

        for adapter in providers {
            if let Err(e) = ctx.check() {
                debug!("Resolution of {} stopped: {}", symbol, e);
                return (Err(e), diagnostics);
            }

            let provider_id: ProviderId = Cow::Borrowed(adapter.id());

            if !adapter.asset_classes().contains(&asset_class) {
                diagnostics.record_skip(provider_id, SkipReason::AssetClassMismatch);
                continue;
            }
            if !adapter.supports(symbol) {
                debug!("Provider '{}' cannot quote {}", provider_id, symbol);
                diagnostics.record_skip(provider_id, SkipReason::SymbolUnsupported);
                continue;
            }

            if let Acquire::Denied { retry_after, reason } =
                self.rate_limiter.try_acquire(&provider_id)
            {
                debug!(
                    "Skipping '{}' for {}: rate limited ({:?}), retry after {:?}",
                    provider_id, symbol, reason, retry_after
                );
                diagnostics.record_skip(
                    provider_id,
                    SkipReason::RateLimited {
                        retry_after,
                        reason,
                    },
                );
                continue;
            }

            let started = Instant::now();
            let result = match self.call_provider(ctx, adapter.as_ref(), symbol).await {
                Ok(result) => result,
                Err(e) => {
                    // Caller gave up; the in-flight provider is not at fault
                    diagnostics.record_error(provider_id, e.to_string(), started.elapsed());
                    debug!("Resolution of {} aborted: {}", symbol, e);
                    return (Err(e), diagnostics);
                }
            };
            let elapsed = started.elapsed();

            let raw = match result {
                Ok(raw) => {
                    self.rate_limiter.record_outcome(&provider_id, true);
                    raw
                }
                Err(failure) => {
                    self.rate_limiter
                        .record_outcome(&provider_id, failure.network_succeeded());
                    warn!(
                        "Provider '{}' failed for {} ({:?}): {}",
                        provider_id,
                        symbol,
                        failure.retry_class(),
                        failure
                    );
                    diagnostics.record_error(provider_id, failure.to_string(), elapsed);
                    continue;
                }
            };

            let quote = match normalize(&raw, symbol, asset_class) {
                Ok(quote) => quote,
                Err(e) => {
                    warn!("Provider '{}' returned unusable data for {}: {}", provider_id, symbol, e);
                    diagnostics.record_error(provider_id, e.to_string(), elapsed);
                    continue;
                }
            };

            if let Err(e) = self.validator.validate(&quote) {
                warn!("Quote from '{}' for {} rejected: {}", provider_id, symbol, e);
                diagnostics.record_error(provider_id, e.to_string(), elapsed);
                continue;
            }

            diagnostics.record_success(provider_id.clone(), elapsed);
            info!(
                "Resolved {} ({}) via '{}' in {:?}",
                symbol, asset_class, provider_id, elapsed
            );
            return (Ok(quote), diagnostics);
        }

        let attempts = diagnostics.summary();
        warn!("All sources failed for {} ({}): {}", symbol, asset_class, attempts);
        (
            Err(MarketDataError::AllSourcesFailed {
                symbol: symbol.to_string(),
                asset_class,
                attempts,
            }),
            diagnostics,
        )
    }

    /// One bounded adapter call.
    ///
    /// The outer error is the caller's context firing; the inner result is
    /// the provider's own outcome, with the per-call timeout mapped to
    /// `ProviderFailure::Timeout`.
    async fn call_provider(
        &self,
        ctx: &FetchContext,
        adapter: &dyn ProviderAdapter,
        symbol: &str,
    ) -> Result<ProviderResult, MarketDataError> {
        let bounded = tokio::time::timeout(self.call_timeout, adapter.fetch(symbol));
        let outcome = ctx.run(bounded).await?;
        Ok(outcome.unwrap_or_else(|_| {
            Err(ProviderFailure::Timeout {
                provider: adapter.id().to_string(),
            })
        }))
    }
}

fn register_rate_limit(rate_limiter: &RateLimiter, adapter: &dyn ProviderAdapter) {
    if !rate_limiter.is_configured(adapter.id()) {
        rate_limiter.configure(adapter.id(), adapter.rate_limit());
    }
}
