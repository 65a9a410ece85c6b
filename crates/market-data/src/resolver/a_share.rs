//! China A-share code parsing and provider symbol formats.
//!
//! Accepted inputs: `600519.SS`, `600519.SH`, `000001.SZ`, `430047.BJ`,
//! `sh600519`, `SZ000001` and bare six-digit codes. Bare codes are assigned
//! to an exchange by their leading digit.

use std::fmt;

use crate::errors::MarketDataError;

/// Mainland exchange listing an A-share.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ChinaExchange {
    Shanghai,
    Shenzhen,
    Beijing,
}

impl ChinaExchange {
    /// Two-letter market prefix used by Sina and Tencent (`sh`, `sz`, `bj`).
    pub fn market_prefix(&self) -> &'static str {
        match self {
            Self::Shanghai => "sh",
            Self::Shenzhen => "sz",
            Self::Beijing => "bj",
        }
    }

    /// Suffix of the canonical symbol (Yahoo convention).
    pub fn canonical_suffix(&self) -> &'static str {
        match self {
            Self::Shanghai => "SS",
            Self::Shenzhen => "SZ",
            Self::Beijing => "BJ",
        }
    }

    /// Suffix used by Tushare `ts_code`.
    pub fn tushare_suffix(&self) -> &'static str {
        match self {
            Self::Shanghai => "SH",
            Self::Shenzhen => "SZ",
            Self::Beijing => "BJ",
        }
    }

    /// Market id used by Eastmoney `secid` (`1` Shanghai, `0` otherwise).
    pub fn eastmoney_market(&self) -> u8 {
        match self {
            Self::Shanghai => 1,
            Self::Shenzhen | Self::Beijing => 0,
        }
    }

    /// Infer the exchange from the first digit of a bare code.
    fn from_code(code: &str) -> Option<Self> {
        match code.as_bytes().first()? {
            b'5' | b'6' | b'9' => Some(Self::Shanghai),
            b'0' | b'1' | b'2' | b'3' => Some(Self::Shenzhen),
            b'4' | b'8' => Some(Self::Beijing),
            _ => None,
        }
    }

    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "SS" | "SH" | "SHA" => Some(Self::Shanghai),
            "SZ" | "SZA" => Some(Self::Shenzhen),
            "BJ" => Some(Self::Beijing),
            _ => None,
        }
    }
}

/// Parsed A-share listing: exchange plus six-digit code.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct AShareCode {
    pub exchange: ChinaExchange,
    pub code: String,
}

impl AShareCode {
    pub fn parse(symbol: &str) -> Result<Self, MarketDataError> {
        let upper = symbol.trim().to_ascii_uppercase();
        let invalid = || MarketDataError::InvalidSymbol(format!("Not an A-share code: {}", symbol));

        let (code, exchange) = if let Some((code, suffix)) = upper.split_once('.') {
            (code.to_string(), ChinaExchange::from_suffix(suffix))
        } else if let Some(prefix) = upper.get(..2).filter(|p| p.chars().all(|c| c.is_ascii_alphabetic())) {
            let exchange = match prefix {
                "SH" => Some(ChinaExchange::Shanghai),
                "SZ" => Some(ChinaExchange::Shenzhen),
                "BJ" => Some(ChinaExchange::Beijing),
                _ => None,
            };
            (upper[2..].to_string(), exchange)
        } else {
            (upper.clone(), ChinaExchange::from_code(&upper))
        };

        if code.len() != 6 || !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let exchange = exchange.ok_or_else(invalid)?;

        Ok(Self { exchange, code })
    }

    /// `600519.SS` style symbol used as the cache key.
    pub fn canonical(&self) -> String {
        format!("{}.{}", self.code, self.exchange.canonical_suffix())
    }

    /// `sh600519` style symbol (Sina, Tencent).
    pub fn prefixed(&self) -> String {
        format!("{}{}", self.exchange.market_prefix(), self.code)
    }

    /// `1.600519` style security id (Eastmoney).
    pub fn eastmoney_secid(&self) -> String {
        format!("{}.{}", self.exchange.eastmoney_market(), self.code)
    }

    /// `600519.SH` style code (Tushare).
    pub fn tushare_code(&self) -> String {
        format!("{}.{}", self.code, self.exchange.tushare_suffix())
    }
}

impl fmt::Display for AShareCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_suffixed_codes() {
        let moutai = AShareCode::parse("600519.SS").unwrap();
        assert_eq!(moutai.exchange, ChinaExchange::Shanghai);
        assert_eq!(moutai.code, "600519");

        let same = AShareCode::parse("600519.sh").unwrap();
        assert_eq!(same, moutai);

        let pingan = AShareCode::parse("000001.SZ").unwrap();
        assert_eq!(pingan.exchange, ChinaExchange::Shenzhen);
    }

    #[test]
    fn test_parse_prefixed_and_bare_codes() {
        assert_eq!(
            AShareCode::parse("sz000001").unwrap().exchange,
            ChinaExchange::Shenzhen
        );
        assert_eq!(
            AShareCode::parse("601318").unwrap().exchange,
            ChinaExchange::Shanghai
        );
        assert_eq!(
            AShareCode::parse("300750").unwrap().exchange,
            ChinaExchange::Shenzhen
        );
        assert_eq!(
            AShareCode::parse("430047").unwrap().exchange,
            ChinaExchange::Beijing
        );
    }

    #[test]
    fn test_rejects_malformed_codes() {
        assert!(AShareCode::parse("AAPL").is_err());
        assert!(AShareCode::parse("60051").is_err());
        assert!(AShareCode::parse("600519.HK").is_err());
        assert!(AShareCode::parse("xx600519").is_err());
        assert!(AShareCode::parse("").is_err());
    }

    #[test]
    fn test_provider_formats() {
        let code = AShareCode::parse("600519.SS").unwrap();
        assert_eq!(code.canonical(), "600519.SS");
        assert_eq!(code.prefixed(), "sh600519");
        assert_eq!(code.eastmoney_secid(), "1.600519");
        assert_eq!(code.tushare_code(), "600519.SH");

        let code = AShareCode::parse("000001.SZ").unwrap();
        assert_eq!(code.prefixed(), "sz000001");
        assert_eq!(code.eastmoney_secid(), "0.000001");
        assert_eq!(code.tushare_code(), "000001.SZ");
    }
}
