//! Background cache sweeper.

use std::sync::Arc;

use log::{debug, info};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::cache::QuoteCache;

/// Shortest sweep period accepted.
const MIN_SWEEP_PERIOD: Duration = Duration::from_millis(1);

/// Periodically drop expired entries from `cache`.
///
/// The first sweep happens one `every` after spawning; periods below one
/// millisecond are raised to it. Abort the returned handle to stop the task.
pub fn spawn_cache_sweeper(cache: Arc<QuoteCache>, every: Duration) -> JoinHandle<()> {
    let every = every.max(MIN_SWEEP_PERIOD);
    tokio::spawn(async move {
        info!("Cache sweeper started ({:?} interval)", every);

        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick is immediate
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let removed = cache.clear_expired(None);
            if removed > 0 {
                info!("Cache sweep removed {} expired quotes", removed);
            } else {
                debug!("Cache sweep found nothing to remove");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{cache_key, CachePriority};
    use crate::models::{AssetClass, Quote, Reliability};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_sweeper_removes_expired_entries() {
        let cache = Arc::new(QuoteCache::new());
        let key = cache_key("AAPL", AssetClass::Equity);
        let quote = Quote::new("AAPL", AssetClass::Equity, dec!(190), "YAHOO", Reliability::Verified)
            .unwrap();
        cache.set_with_ttl(
            &key,
            quote,
            CachePriority::Normal,
            "YAHOO",
            Duration::from_millis(10),
        );

        let handle = spawn_cache_sweeper(Arc::clone(&cache), Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(150)).await;
        handle.abort();

        assert!(cache.is_empty());
        assert_eq!(cache.stats().expired_removed, 1);
    }

    #[tokio::test]
    async fn test_zero_period_is_clamped() {
        let cache = Arc::new(QuoteCache::new());
        let key = cache_key("BTC-USD", AssetClass::Crypto);
        let quote = Quote::new("BTC-USD", AssetClass::Crypto, dec!(64000), "BINANCE", Reliability::Verified)
            .unwrap();
        cache.set_with_ttl(
            &key,
            quote,
            CachePriority::Normal,
            "BINANCE",
            Duration::from_millis(5),
        );

        let handle = spawn_cache_sweeper(Arc::clone(&cache), Duration::ZERO);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!handle.is_finished());
        handle.abort();

        assert!(cache.is_empty());
    }
}
