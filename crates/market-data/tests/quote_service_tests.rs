//! End-to-end tests for `QuoteService` over mock providers.

mod common;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rust_decimal_macros::dec;
use serde_json::json;

use common::{Behavior, MockProvider};
use quotehub_market_data::{
    cache_key, Acquire, AssetClass, CachePriority, DenyReason, FetchContext, FetchOrchestrator,
    MarketDataError, ProviderAdapter, ProviderRoutes, QuoteCache, QuoteService,
    QuoteServiceConfig, RateLimitConfig, RateLimiter, Reliability,
};

fn routes_for_all(providers: Vec<Arc<dyn ProviderAdapter>>) -> ProviderRoutes {
    ProviderRoutes::new()
        .with_route(AssetClass::Equity, providers.clone())
        .with_route(AssetClass::AShare, providers.clone())
        .with_route(AssetClass::Crypto, providers)
}

fn service(providers: Vec<Arc<dyn ProviderAdapter>>) -> QuoteService {
    QuoteService::with_routes(routes_for_all(providers), &QuoteServiceConfig::default()).unwrap()
}

// =============================================================================
// Scenario 1: cold cache, then hit
// =============================================================================

#[tokio::test]
async fn test_cold_cache_then_hit() {
    let provider = MockProvider::new(
        "PRIMARY",
        Behavior::Fields(vec![("price", json!(150.25)), ("change", json!(1.2))]),
    );
    let service = service(vec![provider.clone()]);
    let ctx = FetchContext::background();

    let quote = service.get_quote(&ctx, "AAPL", AssetClass::Equity).await.unwrap();
    assert_eq!(quote.price(), dec!(150.25));
    assert_eq!(quote.change(), dec!(1.2));
    // 1.2 / (150.25 - 1.2) * 100
    assert_eq!(quote.change_percent(), dec!(0.8051));
    assert_eq!(quote.reliability(), Reliability::Verified);
    assert_eq!(quote.source(), "PRIMARY");

    let again = service.get_quote(&ctx, "AAPL", AssetClass::Equity).await.unwrap();
    assert_eq!(again, quote);
    assert_eq!(provider.calls(), 1);

    let stats = service.cache_stats();
    assert_eq!(stats.total_requests, 2);
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
}

// =============================================================================
// Scenario 2: timeout, then provider 2
// =============================================================================

#[tokio::test]
async fn test_timeout_fails_over_with_one_recorded_error() {
    let slow = MockProvider::new("SLOW", Behavior::Hang);
    let fast = MockProvider::price("FAST", 42.0);

    let rate_limiter = Arc::new(RateLimiter::new());
    let orchestrator = FetchOrchestrator::new(
        routes_for_all(vec![slow.clone(), fast.clone()]),
        Arc::clone(&rate_limiter),
    )
    .with_call_timeout(Duration::from_millis(50));
    let service = QuoteService::new(orchestrator, Arc::new(QuoteCache::new())).unwrap();

    let quote = service
        .get_quote(&FetchContext::background(), "MSFT", AssetClass::Equity)
        .await
        .unwrap();

    assert_eq!(quote.source(), "FAST");
    assert_eq!(slow.calls(), 1);
    assert_eq!(service.rate_limit_state("SLOW").consecutive_errors, 1);
    assert_eq!(service.rate_limit_state("FAST").consecutive_errors, 0);
    assert!(service.rate_limit_state("SLOW").backoff_remaining > Duration::ZERO);
}

// =============================================================================
// Scenario 3: everything fails
// =============================================================================

#[tokio::test]
async fn test_all_failures_yield_stable_simulated_quote() {
    let service = service(vec![MockProvider::failing("A"), MockProvider::failing("B")]);
    let ctx = FetchContext::background();

    let first = service.get_quote(&ctx, "XXXX", AssetClass::Equity).await.unwrap();
    assert_eq!(first.reliability(), Reliability::Simulated);
    assert!(first.is_simulated());
    assert!(first.price() > rust_decimal::Decimal::ZERO);

    let second = service.get_quote(&ctx, "XXXX", AssetClass::Equity).await.unwrap();
    assert_eq!(first.price(), second.price());

    // Same seed in a fresh service
    let other = self::service(vec![MockProvider::failing("C")]);
    let third = other.get_quote(&ctx, "XXXX", AssetClass::Equity).await.unwrap();
    assert_eq!(first.price(), third.price());
}

#[tokio::test]
async fn test_all_sources_failed_lists_every_attempt() {
    let service = service(vec![MockProvider::failing("A"), MockProvider::failing("B")]);

    let (result, diagnostics) = service
        .orchestrator()
        .resolve_with_diagnostics(&FetchContext::background(), "XXXX", AssetClass::Equity)
        .await;

    match result {
        Err(MarketDataError::AllSourcesFailed { attempts, .. }) => {
            assert!(attempts.contains("A: ERROR"));
            assert!(attempts.contains("B: ERROR"));
        }
        other => panic!("expected AllSourcesFailed, got {:?}", other),
    }
    assert!(!diagnostics.has_success());
}

#[tokio::test]
async fn test_degenerate_previous_close_still_serves_a_quote() {
    let provider = MockProvider::new(
        "ODD",
        Behavior::Fields(vec![
            ("c", json!(100)),
            ("pc", json!("0.0000000000000000000000000001")),
        ]),
    );
    let service = service(vec![provider]);

    let quote = service
        .get_quote(&FetchContext::background(), "AAPL", AssetClass::Equity)
        .await
        .unwrap();

    assert_eq!(quote.reliability(), Reliability::Verified);
    assert_eq!(quote.price(), dec!(100));
    assert_eq!(quote.change_percent(), dec!(0));
}

// =============================================================================
// Scenario 4: eviction at capacity
// =============================================================================

#[tokio::test]
async fn test_capacity_evicts_low_priority_first() {
    let provider = MockProvider::new(
        "MOCK",
        Behavior::PriceExcept(10.0, HashSet::from(["XXXX"])),
    );
    let config = QuoteServiceConfig {
        cache_capacity: 3,
        ..Default::default()
    };
    let service = QuoteService::with_routes(routes_for_all(vec![provider]), &config).unwrap();
    let ctx = FetchContext::background();

    // XXXX falls back to a simulated quote cached at Low priority
    let simulated = service.get_quote(&ctx, "XXXX", AssetClass::Equity).await.unwrap();
    assert!(simulated.is_simulated());
    service.get_quote(&ctx, "AAPL", AssetClass::Equity).await.unwrap();
    service.get_quote(&ctx, "MSFT", AssetClass::Equity).await.unwrap();

    // Make the Low entry the most recently used one
    service.get_quote(&ctx, "XXXX", AssetClass::Equity).await.unwrap();
    let low_key = cache_key("XXXX", AssetClass::Equity);
    assert_eq!(service.cache().entry(&low_key).unwrap().priority, CachePriority::Low);

    service.get_quote(&ctx, "NVDA", AssetClass::Equity).await.unwrap();

    let cache = service.cache();
    assert_eq!(cache.len(), 3);
    assert!(cache.entry(&low_key).is_none());
    assert!(cache.entry(&cache_key("AAPL", AssetClass::Equity)).is_some());
    assert!(cache.entry(&cache_key("MSFT", AssetClass::Equity)).is_some());
    assert!(cache.entry(&cache_key("NVDA", AssetClass::Equity)).is_some());
    assert_eq!(service.cache_stats().evictions, 1);
}

// =============================================================================
// Scenario 5: exhausted window
// =============================================================================

#[tokio::test]
async fn test_exhausted_window_skips_without_waiting() {
    let limited = MockProvider::with_limit(
        "LIMITED",
        Behavior::PriceExcept(1.0, HashSet::new()),
        RateLimitConfig::per_window(1, 100),
    );
    let backup = MockProvider::price("BACKUP", 2.0);
    let service = service(vec![limited.clone(), backup.clone()]);
    let ctx = FetchContext::background();

    let first = service.get_quote(&ctx, "AAPL", AssetClass::Equity).await.unwrap();
    assert_eq!(first.source(), "LIMITED");

    match service.orchestrator().rate_limiter().try_acquire("LIMITED") {
        Acquire::Denied {
            retry_after,
            reason,
        } => {
            assert!(retry_after > Duration::ZERO);
            assert_eq!(reason, DenyReason::MinuteWindow);
        }
        Acquire::Granted => panic!("window should be exhausted"),
    }

    let started = Instant::now();
    let second = service.get_quote(&ctx, "MSFT", AssetClass::Equity).await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(second.source(), "BACKUP");
    assert_eq!(limited.calls(), 1);
    assert_eq!(backup.calls(), 1);
}

// =============================================================================
// Context handling
// =============================================================================

#[tokio::test]
async fn test_cancelled_context_is_not_penalized() {
    let slow = MockProvider::new("SLOW", Behavior::Hang);
    let service = service(vec![slow.clone(), MockProvider::price("NEXT", 5.0)]);

    let (ctx, handle) = FetchContext::background().cancellable();
    let cancel = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.cancel();
    });

    let result = service.get_quote(&ctx, "AAPL", AssetClass::Equity).await;
    cancel.await.unwrap();

    assert!(matches!(result, Err(MarketDataError::Cancelled)));
    assert_eq!(service.rate_limit_state("SLOW").consecutive_errors, 0);
    assert!(service.cache().is_empty());
}

#[tokio::test]
async fn test_explicit_rate_limit_override_wins() {
    let provider = MockProvider::price("MOCK", 1.0);
    let mut config = QuoteServiceConfig::default();
    config.rate_limits.insert(
        "MOCK".to_string(),
        "1/10".parse().unwrap(),
    );
    let service = QuoteService::with_routes(routes_for_all(vec![provider]), &config).unwrap();
    let ctx = FetchContext::background();

    service.get_quote(&ctx, "AAPL", AssetClass::Equity).await.unwrap();
    // Window of one is spent, so the next symbol falls back to simulation
    let second = service.get_quote(&ctx, "MSFT", AssetClass::Equity).await.unwrap();
    assert!(second.is_simulated());
}
