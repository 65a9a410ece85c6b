//! Raw provider record to canonical [`Quote`] conversion.
//!
//! The normalizer is pure: the same [`RawQuote`] always yields the same
//! quote. Field names are looked up through per-provider alias tables
//! ([`fields`]), then the [`GENERIC`] table; missing change figures are
//! derived from the previous close when the provider reports one.

mod fields;
mod values;

pub use fields::{spec_for, FieldSpec, GENERIC};
pub use values::{parse_decimal, parse_timestamp, NumberValue};

use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::errors::NormalizeError;
use crate::models::{AssetClass, Quote, RawQuote, Reliability};

/// Decimal places kept for derived percentages.
const PERCENT_DP: u32 = 4;

/// Convert a provider record into a verified quote for `symbol`.
pub fn normalize(
    raw: &RawQuote,
    symbol: &str,
    asset_class: AssetClass,
) -> Result<Quote, NormalizeError> {
    let provider = raw.provider.as_ref();
    let table = spec_for(provider);
    let reader = FieldReader { raw, provider };

    let price = reader
        .decimal("price", table.price, GENERIC.price)?
        .ok_or_else(|| NormalizeError::MissingPrice {
            provider: provider.to_string(),
        })?;
    if price <= Decimal::ZERO {
        return Err(NormalizeError::NonPositivePrice {
            provider: provider.to_string(),
            price: price.to_string(),
        });
    }

    let explicit_change = reader.decimal("change", table.change, GENERIC.change)?;
    let explicit_percent =
        reader.decimal("change_percent", table.change_percent, GENERIC.change_percent)?;
    let previous_close = reader
        .decimal("previous_close", table.previous_close, GENERIC.previous_close)?
        .filter(|prev| *prev > Decimal::ZERO);

    let (change, change_percent) =
        derive_change(price, explicit_change, explicit_percent, previous_close);

    let volume = reader
        .decimal("volume", table.volume, GENERIC.volume)?
        .map(|v| scale_volume(v, price, table))
        .unwrap_or(0);

    let timestamp = first_value(raw, table.timestamp)
        .or_else(|| first_value(raw, GENERIC.timestamp))
        .and_then(|value| parse_timestamp(value, table.local_offset))
        .unwrap_or(raw.fetched_at);

    let quote = Quote::new(symbol, asset_class, price, provider, Reliability::Verified)
        .map_err(|_| NormalizeError::NonPositivePrice {
            provider: provider.to_string(),
            price: price.to_string(),
        })?
        .with_change(change, change_percent)
        .with_volume(volume)
        .with_timestamp(timestamp);

    Ok(quote)
}

struct FieldReader<'a> {
    raw: &'a RawQuote,
    provider: &'a str,
}

impl FieldReader<'_> {
    /// First present alias as a decimal, provider aliases before generic
    /// ones; blanks count as absent.
    fn decimal(
        &self,
        field: &'static str,
        aliases: &[&str],
        generic: &[&str],
    ) -> Result<Option<Decimal>, NormalizeError> {
        for alias in aliases.iter().chain(generic) {
            let Some(value) = self.raw.fields.get(*alias) else {
                continue;
            };
            match parse_decimal(value) {
                NumberValue::Present(d) => return Ok(Some(d)),
                NumberValue::Blank => continue,
                NumberValue::Invalid(text) => {
                    return Err(NormalizeError::InvalidNumber {
                        provider: self.provider.to_string(),
                        field,
                        value: text,
                    })
                }
            }
        }
        Ok(None)
    }
}

fn first_value<'a>(raw: &'a RawQuote, aliases: &[&str]) -> Option<&'a Value> {
    aliases.iter().find_map(|alias| raw.fields.get(*alias))
}

/// Fill in whichever of change and change percent the provider omitted.
///
/// Figures that would overflow a `Decimal` are left underived (zero).
fn derive_change(
    price: Decimal,
    change: Option<Decimal>,
    percent: Option<Decimal>,
    previous_close: Option<Decimal>,
) -> (Decimal, Decimal) {
    let reference = previous_close.or_else(|| {
        change
            .and_then(|c| price.checked_sub(c))
            .or_else(|| percent.and_then(|p| implied_previous_close(price, p)))
            .filter(|prev| *prev > Decimal::ZERO)
    });

    let change = change
        .or_else(|| reference.and_then(|prev| price.checked_sub(prev)))
        .unwrap_or(Decimal::ZERO);

    let percent = percent
        .or_else(|| {
            reference
                .and_then(|prev| change.checked_div(prev))
                .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
                .map(|pct| pct.round_dp(PERCENT_DP))
        })
        .unwrap_or(Decimal::ZERO);

    (change.normalize(), percent.normalize())
}

/// `price / (1 + percent / 100)`, when that is a representable positive value.
fn implied_previous_close(price: Decimal, percent: Decimal) -> Option<Decimal> {
    let factor = percent
        .checked_div(Decimal::ONE_HUNDRED)
        .and_then(|p| Decimal::ONE.checked_add(p))?;
    if factor <= Decimal::ZERO {
        return None;
    }
    price.checked_div(factor)
}

/// Volume in units, saturating at `u64::MAX`; negative volumes count as zero.
fn scale_volume(volume: Decimal, price: Decimal, table: &FieldSpec) -> u64 {
    if volume <= Decimal::ZERO {
        return 0;
    }
    let units = if table.volume_is_notional {
        volume.checked_div(price)
    } else {
        volume.checked_mul(Decimal::from(table.volume_multiplier))
    };
    units
        .and_then(|u| u.floor().to_u64())
        .unwrap_or(u64::MAX)
}
