use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::MarketDataError;

/// Coarse asset classification that selects the provider list and
/// normalization rules for a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetClass {
    /// Exchange-traded equities outside mainland China (e.g. AAPL)
    Equity,
    /// China A-shares listed in Shanghai or Shenzhen (e.g. 600519.SS)
    AShare,
    /// Cryptocurrency pairs (e.g. BTC-USD)
    Crypto,
}

impl AssetClass {
    /// All asset classes, in a stable order.
    pub const ALL: [AssetClass; 3] = [AssetClass::Equity, AssetClass::AShare, AssetClass::Crypto];

    /// Stable identifier used in cache keys and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equity => "EQUITY",
            Self::AShare => "A_SHARE",
            Self::Crypto => "CRYPTO",
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetClass {
    type Err = MarketDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "EQUITY" | "STOCK" | "US" => Ok(Self::Equity),
            "A_SHARE" | "ASHARE" | "CN" | "CHINA" => Ok(Self::AShare),
            "CRYPTO" | "CRYPTOCURRENCY" => Ok(Self::Crypto),
            other => Err(MarketDataError::InvalidAssetClass(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_asset_class_aliases() {
        assert_eq!("equity".parse::<AssetClass>().unwrap(), AssetClass::Equity);
        assert_eq!("a-share".parse::<AssetClass>().unwrap(), AssetClass::AShare);
        assert_eq!("ASHARE".parse::<AssetClass>().unwrap(), AssetClass::AShare);
        assert_eq!(" Crypto ".parse::<AssetClass>().unwrap(), AssetClass::Crypto);
    }

    #[test]
    fn test_parse_unknown_asset_class() {
        let err = "bond".parse::<AssetClass>().unwrap_err();
        assert!(matches!(err, MarketDataError::InvalidAssetClass(ref s) if s == "BOND"));
    }

    #[test]
    fn test_display_matches_serde() {
        let json = serde_json::to_string(&AssetClass::AShare).unwrap();
        assert_eq!(json, "\"A_SHARE\"");
        assert_eq!(AssetClass::AShare.to_string(), "A_SHARE");
    }
}
