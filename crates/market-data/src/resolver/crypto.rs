//! Crypto pair parsing and exchange-specific pair formats.

use std::collections::HashMap;
use std::fmt;

use lazy_static::lazy_static;

use crate::errors::MarketDataError;

/// Quote currencies recognised when a pair is written without separator.
const KNOWN_QUOTES: &[&str] = &["USDT", "USDC", "BUSD", "USD", "EUR", "GBP", "BTC", "ETH"];

/// Quote currency assumed for bare base symbols (`BTC`).
const DEFAULT_QUOTE: &str = "USD";

lazy_static! {
    /// CoinGecko coin ids for the most traded bases.
    static ref COINGECKO_IDS: HashMap<&'static str, &'static str> = HashMap::from([
        ("BTC", "bitcoin"),
        ("ETH", "ethereum"),
        ("BNB", "binancecoin"),
        ("SOL", "solana"),
        ("XRP", "ripple"),
        ("ADA", "cardano"),
        ("DOGE", "dogecoin"),
        ("DOT", "polkadot"),
        ("AVAX", "avalanche-2"),
        ("MATIC", "matic-network"),
        ("LINK", "chainlink"),
        ("LTC", "litecoin"),
        ("TRX", "tron"),
        ("ATOM", "cosmos"),
        ("UNI", "uniswap"),
        ("USDT", "tether"),
        ("USDC", "usd-coin"),
    ]);
}

/// Base/quote crypto pair such as BTC-USD.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct CryptoPair {
    pub base: String,
    pub quote: String,
}

impl CryptoPair {
    /// Parse `BTC-USD`, `BTC/USDT`, `BTC_USDT`, `BTCUSDT` or bare `BTC`.
    pub fn parse(symbol: &str) -> Result<Self, MarketDataError> {
        let upper = symbol.trim().to_ascii_uppercase();
        let invalid = || MarketDataError::InvalidSymbol(format!("Not a crypto pair: {}", symbol));

        if upper.is_empty() || !upper.chars().all(|c| c.is_ascii_alphanumeric() || "-/_".contains(c)) {
            return Err(invalid());
        }

        let (base, quote) = match upper.split_once(|c| c == '-' || c == '/' || c == '_') {
            Some((base, quote)) => (base.to_string(), quote.to_string()),
            None => split_concatenated(&upper),
        };

        let is_code =
            |part: &str| !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric());
        if !is_code(&base) || !is_code(&quote) {
            return Err(invalid());
        }

        Ok(Self { base, quote })
    }

    /// `BTC-USD` style symbol used as the cache key.
    pub fn canonical(&self) -> String {
        format!("{}-{}", self.base, self.quote)
    }

    /// Stablecoin quote used by exchanges without fiat USD books.
    fn usd_as_tether(&self) -> &str {
        if self.quote == "USD" {
            "USDT"
        } else {
            &self.quote
        }
    }

    /// `BTCUSDT` (Binance).
    pub fn binance_symbol(&self) -> String {
        format!("{}{}", self.base, self.usd_as_tether())
    }

    /// `BTC-USDT` (OKX).
    pub fn okx_inst_id(&self) -> String {
        format!("{}-{}", self.base, self.usd_as_tether())
    }

    /// `BTC-USD` (Coinbase Exchange).
    pub fn coinbase_product(&self) -> String {
        let quote = if self.quote == "USDT" { "USD" } else { &self.quote };
        format!("{}-{}", self.base, quote)
    }

    /// `XBTUSD` (Kraken uses legacy codes for a few assets).
    pub fn kraken_pair(&self) -> String {
        let base = match self.base.as_str() {
            "BTC" => "XBT",
            "DOGE" => "XDG",
            other => other,
        };
        format!("{}{}", base, self.quote)
    }

    /// CoinGecko coin id, when the base is known.
    pub fn coingecko_id(&self) -> Option<&'static str> {
        COINGECKO_IDS.get(self.base.as_str()).copied()
    }

    /// Lower-case CoinGecko `vs_currency`.
    pub fn coingecko_vs_currency(&self) -> String {
        let quote = match self.quote.as_str() {
            "USDT" | "USDC" | "BUSD" => "USD",
            other => other,
        };
        quote.to_ascii_lowercase()
    }
}

impl fmt::Display for CryptoPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

fn split_concatenated(symbol: &str) -> (String, String) {
    for quote in KNOWN_QUOTES {
        if let Some(base) = symbol.strip_suffix(quote) {
            if !base.is_empty() {
                return (base.to_string(), quote.to_string());
            }
        }
    }
    (symbol.to_string(), DEFAULT_QUOTE.to_string())
}
