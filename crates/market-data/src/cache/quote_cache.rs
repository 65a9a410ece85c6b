//! In-memory quote cache with TTL and priority-aware eviction

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, warn};

use super::models::{CacheEntry, CachePriority, CacheStatsSnapshot};
use crate::models::{AssetClass, Quote};

/// Default maximum number of cached quotes.
pub const DEFAULT_CACHE_CAPACITY: usize = 1000;

/// Cache key for a canonical symbol.
pub fn cache_key(symbol: &str, asset_class: AssetClass) -> String {
    format!("{}:{}", asset_class.as_str(), symbol)
}

/// Default TTL per asset class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    pub equity: Duration,
    pub a_share: Duration,
    pub crypto: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            equity: Duration::from_secs(60),
            a_share: Duration::from_secs(60),
            crypto: Duration::from_secs(30),
        }
    }
}

impl CacheTtls {
    pub fn for_class(&self, asset_class: AssetClass) -> Duration {
        match asset_class {
            AssetClass::Equity => self.equity,
            AssetClass::AShare => self.a_share,
            AssetClass::Crypto => self.crypto,
        }
    }
}

#[derive(Debug, Default)]
struct CacheCounters {
    total_requests: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
    expired_removed: u64,
    hits_by_source: BTreeMap<String, u64>,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    counters: CacheCounters,
    /// Monotonic access counter backing LRU order
    tick: u64,
}

impl CacheState {
    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    /// Key of the entry to evict: lowest priority group first, then the
    /// least recently accessed entry inside it.
    fn eviction_candidate(&self) -> Option<String> {
        self.entries
            .iter()
            .min_by_key(|(_, entry)| (entry.priority, entry.access_tick))
            .map(|(key, _)| key.clone())
    }
}

/// Thread-safe quote cache.
///
/// All bookkeeping happens under one mutex that is never held across I/O.
/// Expired entries stay in place until swept or evicted so that
/// [`get_stale`](Self::get_stale) can still serve them.
pub struct QuoteCache {
    state: Mutex<CacheState>,
    capacity: usize,
    ttls: CacheTtls,
}

impl QuoteCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }

    /// Create a cache holding at most `capacity` entries (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            capacity: capacity.max(1),
            ttls: CacheTtls::default(),
        }
    }

    pub fn with_ttls(mut self, ttls: CacheTtls) -> Self {
        self.ttls = ttls;
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn default_ttl(&self, asset_class: AssetClass) -> Duration {
        self.ttls.for_class(asset_class)
    }

    fn lock_state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!("Quote cache mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Fresh quote for `key`, if any.
    pub fn get(&self, key: &str) -> Option<Quote> {
        self.get_at(key, Instant::now())
    }

    /// [`get`](Self::get) against an explicit clock reading.
    pub fn get_at(&self, key: &str, now: Instant) -> Option<Quote> {
        let mut state = self.lock_state();
        state.counters.total_requests += 1;

        let fresh = state
            .entries
            .get(key)
            .map(|entry| !entry.is_expired(now))
            .unwrap_or(false);
        if !fresh {
            state.counters.misses += 1;
            return None;
        }

        let tick = state.next_tick();
        let (quote, source) = match state.entries.get_mut(key) {
            Some(entry) => {
                entry.touch(now, tick);
                (entry.quote.clone(), entry.data_source.clone())
            }
            None => return None,
        };

        state.counters.hits += 1;
        *state.counters.hits_by_source.entry(source).or_insert(0) += 1;
        Some(quote)
    }

    /// Last stored quote for `key`, ignoring its TTL.
    ///
    /// Does not count as a request and does not refresh recency.
    pub fn get_stale(&self, key: &str) -> Option<Quote> {
        self.lock_state()
            .entries
            .get(key)
            .map(|entry| entry.quote.clone())
    }

    /// Copy of the bookkeeping entry for `key`.
    pub fn entry(&self, key: &str) -> Option<CacheEntry> {
        self.lock_state().entries.get(key).cloned()
    }

    /// Store `quote` with the default TTL of its asset class.
    pub fn set(&self, key: &str, quote: Quote, priority: CachePriority, source: &str) {
        let ttl = self.default_ttl(quote.asset_class());
        self.set_at(key, quote, priority, source, ttl, Instant::now());
    }

    pub fn set_with_ttl(
        &self,
        key: &str,
        quote: Quote,
        priority: CachePriority,
        source: &str,
        ttl: Duration,
    ) {
        self.set_at(key, quote, priority, source, ttl, Instant::now());
    }

    /// [`set_with_ttl`](Self::set_with_ttl) against an explicit clock reading.
    ///
    /// Replacing an existing key never evicts; inserting a new key at
    /// capacity evicts exactly one entry first.
    pub fn set_at(
        &self,
        key: &str,
        quote: Quote,
        priority: CachePriority,
        source: &str,
        ttl: Duration,
        now: Instant,
    ) {
        let mut state = self.lock_state();

        if !state.entries.contains_key(key) && state.entries.len() >= self.capacity {
            if let Some(victim) = state.eviction_candidate() {
                if let Some(evicted) = state.entries.remove(&victim) {
                    state.counters.evictions += 1;
                    debug!(
                        "Evicted {} (priority {}, {} hits) to make room for {}",
                        victim, evicted.priority, evicted.hit_count, key
                    );
                }
            }
        }

        let tick = state.next_tick();
        let entry = CacheEntry::new(quote, priority, source.to_string(), ttl, now, tick);
        state.entries.insert(key.to_string(), entry);
    }

    /// Remove expired entries and return how many were removed.
    ///
    /// With `Some(ttl)` every entry older than `ttl` is removed regardless of
    /// its own TTL.
    pub fn clear_expired(&self, ttl: Option<Duration>) -> usize {
        self.clear_expired_at(ttl, Instant::now())
    }

    pub fn clear_expired_at(&self, ttl: Option<Duration>, now: Instant) -> usize {
        let mut state = self.lock_state();
        let before = state.entries.len();
        state.entries.retain(|_, entry| match ttl {
            Some(max_age) => entry.age(now) < max_age,
            None => !entry.is_expired(now),
        });
        let removed = before - state.entries.len();
        state.counters.expired_removed += removed as u64;
        removed
    }

    /// Remove one key; returns whether it was present.
    pub fn invalidate(&self, key: &str) -> bool {
        self.lock_state().entries.remove(key).is_some()
    }

    /// Remove every entry. Statistics are kept.
    pub fn clear(&self) {
        self.lock_state().entries.clear();
    }

    pub fn len(&self) -> usize {
        self.lock_state().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStatsSnapshot {
        let state = self.lock_state();
        let counters = &state.counters;
        let hit_rate = if counters.total_requests == 0 {
            0.0
        } else {
            counters.hits as f64 / counters.total_requests as f64
        };

        CacheStatsSnapshot {
            total_requests: counters.total_requests,
            hits: counters.hits,
            misses: counters.misses,
            evictions: counters.evictions,
            expired_removed: counters.expired_removed,
            entries: state.entries.len(),
            capacity: self.capacity,
            hit_rate,
            hits_by_source: counters.hits_by_source.clone(),
        }
    }
}

impl Default for QuoteCache {
    fn default() -> Self {
        Self::new()
    }
}
