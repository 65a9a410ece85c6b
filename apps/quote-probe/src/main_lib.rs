use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{bail, Context};
use serde::Serialize;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use quotehub_market_data::{
    AssetClass, CacheStatsSnapshot, FetchContext, Quote, QuoteService, QuoteServiceConfig,
};

/// Whole-run deadline for one probe invocation.
const PROBE_DEADLINE: Duration = Duration::from_secs(30);

pub fn init_tracing() {
    let log_format = std::env::var("QUOTEHUB_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

/// Parsed command line: `quote-probe <asset-class> <symbol>...`
pub struct ProbeArgs {
    pub asset_class: AssetClass,
    pub symbols: Vec<String>,
}

impl ProbeArgs {
    pub fn parse(mut args: impl Iterator<Item = String>) -> anyhow::Result<Self> {
        let Some(class) = args.next() else {
            bail!("usage: quote-probe <equity|a-share|crypto> <symbol>...");
        };
        let asset_class: AssetClass = class
            .parse()
            .with_context(|| format!("unknown asset class '{}'", class))?;
        let symbols: Vec<String> = args.collect();
        if symbols.is_empty() {
            bail!("no symbols given");
        }
        Ok(Self {
            asset_class,
            symbols,
        })
    }
}

#[derive(Serialize)]
struct ProbeReport {
    asset_class: AssetClass,
    quotes: BTreeMap<String, Quote>,
    cache_stats: CacheStatsSnapshot,
}

/// Fetch every requested symbol and render the report as pretty JSON.
pub async fn run(args: ProbeArgs) -> anyhow::Result<String> {
    let config = QuoteServiceConfig::from_env()?;
    tracing::debug!("Probe configuration: {:?}", config);
    let service = QuoteService::from_config(&config)?;

    let ctx = FetchContext::with_timeout(PROBE_DEADLINE);
    let quotes = service
        .batch_get_quotes(&ctx, &args.symbols, args.asset_class)
        .await;
    tracing::info!(
        "Fetched {}/{} {} quotes",
        quotes.len(),
        args.symbols.len(),
        args.asset_class
    );

    let report = ProbeReport {
        asset_class: args.asset_class,
        quotes: quotes.into_iter().collect(),
        cache_stats: service.cache_stats(),
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> impl Iterator<Item = String> {
        items
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn test_parse_args() {
        let parsed = ProbeArgs::parse(args(&["crypto", "BTC-USD", "ETH"])).unwrap();
        assert_eq!(parsed.asset_class, AssetClass::Crypto);
        assert_eq!(parsed.symbols, vec!["BTC-USD", "ETH"]);
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(ProbeArgs::parse(args(&[])).is_err());
        assert!(ProbeArgs::parse(args(&["bonds", "X"])).is_err());
        assert!(ProbeArgs::parse(args(&["equity"])).is_err());
    }
}
