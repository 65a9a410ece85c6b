//! Provider field alias tables.
//!
//! Each provider names its fields differently. A [`FieldSpec`] lists, per
//! canonical field, the provider-native keys to look for, in order. Providers
//! without a dedicated field table fall back to [`GENERIC`].

use std::collections::HashMap;

use chrono::FixedOffset;
use lazy_static::lazy_static;

/// China Standard Time, used by mainland spot-market feeds for naive times.
const CHINA_OFFSET_SECS: i32 = 8 * 3600;

/// Field lookup rules for one provider.
#[derive(Clone, Debug)]
pub struct FieldSpec {
    pub price: &'static [&'static str],
    pub change: &'static [&'static str],
    pub change_percent: &'static [&'static str],
    pub previous_close: &'static [&'static str],
    pub volume: &'static [&'static str],
    pub timestamp: &'static [&'static str],
    /// Shares per reported volume unit (A-share feeds report lots of 100).
    pub volume_multiplier: u32,
    /// Volume is reported in quote currency and must be divided by price.
    pub volume_is_notional: bool,
    /// Offset for naive date/time strings; UTC when unset.
    pub local_offset: Option<FixedOffset>,
}

/// Aliases used when no provider-specific table exists.
pub const GENERIC: FieldSpec = FieldSpec {
    price: &["price", "last", "lastPrice", "close", "current", "c"],
    change: &["change", "priceChange", "d"],
    change_percent: &["change_percent", "changePercent", "priceChangePercent", "dp"],
    previous_close: &["previous_close", "previousClose", "prevClose", "pre_close", "pc"],
    volume: &["volume", "vol", "v"],
    timestamp: &["timestamp", "time", "ts", "t"],
    volume_multiplier: 1,
    volume_is_notional: false,
    local_offset: None,
};

fn china_offset() -> Option<FixedOffset> {
    FixedOffset::east_opt(CHINA_OFFSET_SECS)
}

lazy_static! {
    static ref SPECS: HashMap<&'static str, FieldSpec> = HashMap::from([
        (
            "FINNHUB",
            FieldSpec {
                price: &["c"],
                change: &["d"],
                change_percent: &["dp"],
                previous_close: &["pc"],
                volume: &[],
                timestamp: &["t"],
                ..GENERIC
            },
        ),
        (
            "YAHOO",
            FieldSpec {
                price: &["regularMarketPrice"],
                change: &[],
                change_percent: &[],
                previous_close: &["chartPreviousClose", "previousClose"],
                volume: &["regularMarketVolume"],
                timestamp: &["regularMarketTime"],
                ..GENERIC
            },
        ),
        (
            "ALPHA_VANTAGE",
            FieldSpec {
                price: &["05. price"],
                change: &["09. change"],
                change_percent: &["10. change percent"],
                previous_close: &["08. previous close"],
                volume: &["06. volume"],
                timestamp: &["07. latest trading day"],
                ..GENERIC
            },
        ),
        (
            "TUSHARE",
            FieldSpec {
                price: &["close"],
                change: &["change"],
                change_percent: &["pct_chg"],
                previous_close: &["pre_close"],
                volume: &["vol"],
                timestamp: &["trade_date"],
                volume_multiplier: 100,
                local_offset: china_offset(),
                ..GENERIC
            },
        ),
        (
            "EASTMONEY",
            FieldSpec {
                price: &["f43"],
                change: &["f169"],
                change_percent: &["f170"],
                previous_close: &["f60"],
                volume: &["f47"],
                timestamp: &["f86"],
                volume_multiplier: 100,
                local_offset: china_offset(),
                ..GENERIC
            },
        ),
        (
            "SINA",
            FieldSpec {
                price: &["price"],
                change: &[],
                change_percent: &[],
                previous_close: &["pre_close"],
                volume: &["volume"],
                timestamp: &["datetime"],
                local_offset: china_offset(),
                ..GENERIC
            },
        ),
        (
            "TENCENT",
            FieldSpec {
                price: &["price"],
                change: &["change"],
                change_percent: &["change_pct"],
                previous_close: &["prev_close"],
                volume: &["volume_lots"],
                timestamp: &["timestamp"],
                volume_multiplier: 100,
                local_offset: china_offset(),
                ..GENERIC
            },
        ),
        (
            "BINANCE",
            FieldSpec {
                price: &["lastPrice"],
                change: &["priceChange"],
                change_percent: &["priceChangePercent"],
                previous_close: &["prevClosePrice"],
                volume: &["volume"],
                timestamp: &["closeTime"],
                ..GENERIC
            },
        ),
        (
            "OKX",
            FieldSpec {
                price: &["last"],
                change: &[],
                change_percent: &[],
                previous_close: &["open24h"],
                volume: &["vol24h"],
                timestamp: &["ts"],
                ..GENERIC
            },
        ),
        (
            "COINBASE",
            FieldSpec {
                price: &["last"],
                change: &[],
                change_percent: &[],
                previous_close: &["open"],
                volume: &["volume"],
                timestamp: &["time"],
                ..GENERIC
            },
        ),
        (
            "KRAKEN",
            FieldSpec {
                price: &["last"],
                change: &[],
                change_percent: &[],
                previous_close: &["open"],
                volume: &["volume"],
                timestamp: &[],
                ..GENERIC
            },
        ),
        (
            "COINGECKO",
            FieldSpec {
                price: &["price"],
                change: &[],
                change_percent: &["24h_change"],
                previous_close: &[],
                volume: &["24h_vol"],
                timestamp: &["last_updated_at"],
                volume_is_notional: true,
                ..GENERIC
            },
        ),
    ]);
}

/// Field table for a provider, falling back to the generic aliases.
pub fn spec_for(provider: &str) -> &'static FieldSpec {
    SPECS.get(provider).unwrap_or(&GENERIC)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_provider_table() {
        let spec = spec_for("FINNHUB");
        assert_eq!(spec.price, &["c"]);
        assert_eq!(spec.volume_multiplier, 1);
    }

    #[test]
    fn test_a_share_specs_scale_lots() {
        assert_eq!(spec_for("TENCENT").volume_multiplier, 100);
        assert_eq!(spec_for("EASTMONEY").volume_multiplier, 100);
        assert_eq!(spec_for("SINA").volume_multiplier, 1);
        assert!(spec_for("TUSHARE").local_offset.is_some());
    }

    #[test]
    fn test_unknown_provider_uses_generic() {
        let spec = spec_for("SOMETHING_NEW");
        assert!(spec.price.contains(&"price"));
        assert!(spec.local_offset.is_none());
    }
}
