//! Synthetic placeholder quotes.
//!
//! When no provider answers and nothing is cached, the service can hand out
//! a clearly labeled simulated quote. Values are derived from an md5 seed of
//! the symbol, so the same symbol always yields the same placeholder.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;

use crate::errors::MarketDataError;
use crate::models::{AssetClass, Quote, Reliability, SIMULATED_SOURCE};

/// Per-symbol RNG seed from the first eight bytes of the md5 digest.
pub fn symbol_seed(symbol: &str, asset_class: AssetClass) -> u64 {
    let digest = md5::compute(format!("{}:{}", asset_class.as_str(), symbol));
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest.0[..8]);
    u64::from_be_bytes(bytes)
}

/// Price range in cents for each asset class.
fn price_range_cents(asset_class: AssetClass) -> (i64, i64) {
    match asset_class {
        AssetClass::Equity => (1_000, 50_000),
        AssetClass::AShare => (500, 20_000),
        AssetClass::Crypto => (10, 5_000_000),
    }
}

/// Deterministic simulated quote for `symbol`.
pub fn synthetic_quote(symbol: &str, asset_class: AssetClass) -> Result<Quote, MarketDataError> {
    let mut rng = StdRng::seed_from_u64(symbol_seed(symbol, asset_class));

    let (low, high) = price_range_cents(asset_class);
    let price = Decimal::new(rng.gen_range(low..=high), 2);

    // Daily move within +/- 3.00 %
    let change_percent = Decimal::new(rng.gen_range(-300i64..=300), 2);
    let change = (price * change_percent / Decimal::ONE_HUNDRED).round_dp(2);
    let volume = rng.gen_range(1_000u64..=1_000_000);

    Ok(
        Quote::new(symbol, asset_class, price, SIMULATED_SOURCE, Reliability::Simulated)?
            .with_change(change, change_percent)
            .with_volume(volume)
            .with_real_time(false),
    )
}
