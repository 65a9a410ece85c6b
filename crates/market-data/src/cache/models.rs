//! Cache data models

use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::models::Quote;

/// Eviction priority of a cache entry.
///
/// At capacity the cache evicts from the lowest non-empty group first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CachePriority {
    /// Placeholder data (simulated quotes)
    Low,
    /// Regular fetched quotes
    Normal,
    /// Quotes for symbols the caller holds
    High,
}

impl CachePriority {
    /// Priorities in eviction order.
    pub const EVICTION_ORDER: [CachePriority; 3] =
        [CachePriority::Low, CachePriority::Normal, CachePriority::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            CachePriority::Low => "LOW",
            CachePriority::Normal => "NORMAL",
            CachePriority::High => "HIGH",
        }
    }
}

impl fmt::Display for CachePriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cached quote plus its bookkeeping.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub quote: Quote,
    pub cached_at: Instant,
    pub ttl: Duration,
    pub priority: CachePriority,
    pub hit_count: u64,
    /// Source label credited with hits on this entry
    pub data_source: String,
    pub last_accessed: Instant,
    /// Logical access clock; orders entries for LRU without timer ties.
    pub(crate) access_tick: u64,
}

impl CacheEntry {
    pub(crate) fn new(
        quote: Quote,
        priority: CachePriority,
        data_source: String,
        ttl: Duration,
        now: Instant,
        tick: u64,
    ) -> Self {
        Self {
            quote,
            cached_at: now,
            ttl,
            priority,
            hit_count: 0,
            data_source,
            last_accessed: now,
            access_tick: tick,
        }
    }

    pub(crate) fn touch(&mut self, now: Instant, tick: u64) {
        self.hit_count += 1;
        self.last_accessed = now;
        self.access_tick = tick;
    }

    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.cached_at)
    }

    /// An entry is fresh strictly before `cached_at + ttl`.
    pub fn is_expired(&self, now: Instant) -> bool {
        self.age(now) >= self.ttl
    }
}

/// Serializable snapshot of cache statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStatsSnapshot {
    pub total_requests: u64,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    /// Entries removed by expiry sweeps
    pub expired_removed: u64,
    pub entries: usize,
    pub capacity: usize,
    /// Hits / total requests, 0.0 before the first request
    pub hit_rate: f64,
    pub hits_by_source: BTreeMap<String, u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AssetClass, Reliability};
    use rust_decimal_macros::dec;

    #[test]
    fn test_priority_ordering() {
        assert!(CachePriority::Low < CachePriority::Normal);
        assert!(CachePriority::Normal < CachePriority::High);
        assert_eq!(CachePriority::EVICTION_ORDER[0], CachePriority::Low);
    }

    #[test]
    fn test_entry_expiry_boundary() {
        let quote = Quote::new("AAPL", AssetClass::Equity, dec!(1), "YAHOO", Reliability::Verified)
            .unwrap();
        let now = Instant::now();
        let entry = CacheEntry::new(
            quote,
            CachePriority::Normal,
            "YAHOO".to_string(),
            Duration::from_secs(60),
            now,
            0,
        );

        assert!(!entry.is_expired(now + Duration::from_millis(59_999)));
        assert!(entry.is_expired(now + Duration::from_secs(60)));
    }
}
