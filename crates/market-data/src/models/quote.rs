use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::asset_class::AssetClass;
use crate::errors::MarketDataError;

/// Provenance tag carried by every quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Reliability {
    /// Freshly fetched from a live provider and validated
    Verified,
    /// Previously verified data served after every provider failed
    Fallback,
    /// Fabricated placeholder with no trading meaning
    Simulated,
}

/// Canonical market data quote
///
/// Quotes are immutable once built; the consuming `with_*` methods are only
/// meant for assembling a quote before it is handed out.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Quote {
    symbol: String,
    asset_class: AssetClass,
    price: Decimal,
    change: Decimal,
    change_percent: Decimal,
    volume: u64,
    timestamp: DateTime<Utc>,
    source: String,
    is_real_time: bool,
    reliability: Reliability,
}

impl Quote {
    /// Create a quote with the minimal required fields.
    ///
    /// Non-simulated quotes must carry a strictly positive price.
    pub fn new(
        symbol: impl Into<String>,
        asset_class: AssetClass,
        price: Decimal,
        source: impl Into<String>,
        reliability: Reliability,
    ) -> Result<Self, MarketDataError> {
        let symbol = symbol.into();
        if reliability != Reliability::Simulated && price <= Decimal::ZERO {
            return Err(MarketDataError::ValidationFailed {
                message: format!("Non-positive price {} for {}", price, symbol),
            });
        }

        Ok(Self {
            symbol,
            asset_class,
            price,
            change: Decimal::ZERO,
            change_percent: Decimal::ZERO,
            volume: 0,
            timestamp: Utc::now(),
            source: source.into(),
            is_real_time: reliability == Reliability::Verified,
            reliability,
        })
    }

    pub fn with_change(mut self, change: Decimal, change_percent: Decimal) -> Self {
        self.change = change;
        self.change_percent = change_percent;
        self
    }

    pub fn with_volume(mut self, volume: u64) -> Self {
        self.volume = volume;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_real_time(mut self, is_real_time: bool) -> Self {
        self.is_real_time = is_real_time;
        self
    }

    /// Re-label a previously verified quote as served from fallback storage.
    pub fn into_fallback(mut self) -> Self {
        if self.reliability == Reliability::Verified {
            self.reliability = Reliability::Fallback;
        }
        self.is_real_time = false;
        self
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn asset_class(&self) -> AssetClass {
        self.asset_class
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn change(&self) -> Decimal {
        self.change
    }

    pub fn change_percent(&self) -> Decimal {
        self.change_percent
    }

    pub fn volume(&self) -> u64 {
        self.volume
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Identifier of the adapter (or fallback) that produced the quote.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_real_time(&self) -> bool {
        self.is_real_time
    }

    pub fn reliability(&self) -> Reliability {
        self.reliability
    }

    /// True when the quote carries no trading meaning.
    pub fn is_simulated(&self) -> bool {
        self.reliability == Reliability::Simulated
    }
}
