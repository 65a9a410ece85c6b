//! Caching layer for quotes
//!
//! In-memory cache with per-asset-class TTL, priority groups and LRU
//! eviction inside each group.

mod models;
mod quote_cache;

pub use models::{CacheEntry, CachePriority, CacheStatsSnapshot};
pub use quote_cache::{cache_key, CacheTtls, QuoteCache, DEFAULT_CACHE_CAPACITY};
