//! Symbol resolution for quote providers.
//!
//! Callers address instruments with one provider-agnostic symbol per asset
//! class (`AAPL`, `600519.SS`, `BTC-USD`). This module canonicalizes those
//! symbols for cache keys and translates them into each provider's format:
//!
//! ```text
//!   600519.SS ──► sh600519   (Sina, Tencent)
//!             ├─► 1.600519   (Eastmoney)
//!             └─► 600519.SH  (Tushare)
//!
//!   BTC-USD   ──► BTCUSDT    (Binance)
//!             ├─► BTC-USDT   (OKX)
//!             ├─► XBTUSD     (Kraken)
//!             └─► bitcoin    (CoinGecko)
//! ```

mod a_share;
mod crypto;

pub use a_share::{AShareCode, ChinaExchange};
pub use crypto::CryptoPair;

use crate::errors::MarketDataError;
use crate::models::AssetClass;

/// Longest accepted symbol, in bytes.
const MAX_SYMBOL_LEN: usize = 32;

/// Canonical form of a caller-supplied symbol.
///
/// Rejects empty or malformed symbols; the result is stable across
/// spelling variants (`sh600519` and `600519.SS` map to the same key).
pub fn canonical_symbol(symbol: &str, asset_class: AssetClass) -> Result<String, MarketDataError> {
    let trimmed = symbol.trim();
    if trimmed.is_empty() {
        return Err(MarketDataError::InvalidSymbol("empty symbol".to_string()));
    }
    if trimmed.len() > MAX_SYMBOL_LEN {
        return Err(MarketDataError::InvalidSymbol(format!(
            "symbol too long: {}",
            trimmed
        )));
    }

    match asset_class {
        AssetClass::Equity => {
            let upper = trimmed.to_ascii_uppercase();
            if upper
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || ".-^=".contains(c))
            {
                Ok(upper)
            } else {
                Err(MarketDataError::InvalidSymbol(trimmed.to_string()))
            }
        }
        AssetClass::AShare => AShareCode::parse(trimmed).map(|code| code.canonical()),
        AssetClass::Crypto => CryptoPair::parse(trimmed).map(|pair| pair.canonical()),
    }
}
