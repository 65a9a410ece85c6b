//! Shared mock provider for integration tests.

#![allow(dead_code)]

use std::borrow::Cow;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use quotehub_market_data::{
    AssetClass, ProviderAdapter, ProviderFailure, ProviderResult, RateLimitConfig, RawQuote,
};

/// How a mock provider answers.
pub enum Behavior {
    /// Return these fields for every symbol
    Fields(Vec<(&'static str, Value)>),
    /// Return a fixed price, except for the listed symbols which fail
    PriceExcept(f64, HashSet<&'static str>),
    /// Fail every call
    Fail(ProviderFailure),
    /// Never answer
    Hang,
}

pub struct MockProvider {
    id: &'static str,
    behavior: Behavior,
    limit: RateLimitConfig,
    calls: AtomicUsize,
}

impl MockProvider {
    pub fn new(id: &'static str, behavior: Behavior) -> Arc<Self> {
        Self::with_limit(id, behavior, RateLimitConfig::per_window(1000, 10_000))
    }

    pub fn with_limit(id: &'static str, behavior: Behavior, limit: RateLimitConfig) -> Arc<Self> {
        Arc::new(Self {
            id,
            behavior,
            limit,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn price(id: &'static str, price: f64) -> Arc<Self> {
        Self::new(id, Behavior::PriceExcept(price, HashSet::new()))
    }

    pub fn failing(id: &'static str) -> Arc<Self> {
        Self::new(
            id,
            Behavior::Fail(ProviderFailure::Network {
                provider: id.to_string(),
                message: "connection refused".to_string(),
            }),
        )
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderAdapter for MockProvider {
    fn id(&self) -> &'static str {
        self.id
    }

    fn asset_classes(&self) -> &'static [AssetClass] {
        &AssetClass::ALL
    }

    fn rate_limit(&self) -> RateLimitConfig {
        self.limit.clone()
    }

    async fn fetch(&self, symbol: &str) -> ProviderResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Fields(fields) => {
                let mut raw = RawQuote::new(Cow::Borrowed(self.id));
                for (key, value) in fields {
                    raw.insert(*key, value.clone());
                }
                Ok(raw)
            }
            Behavior::PriceExcept(_, failing) if failing.contains(symbol) => {
                Err(ProviderFailure::EmptyResponse {
                    provider: self.id.to_string(),
                })
            }
            Behavior::PriceExcept(price, _) => Ok(RawQuote::new(Cow::Borrowed(self.id))
                .with("price", json!(price))
                .with("volume", json!(5000))),
            Behavior::Fail(failure) => Err(failure.clone()),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(ProviderFailure::Timeout {
                    provider: self.id.to_string(),
                })
            }
        }
    }
}
