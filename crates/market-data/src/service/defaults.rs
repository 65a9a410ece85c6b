//! Built-in provider wiring.

use std::sync::Arc;

use log::info;

use crate::config::ProviderSettings;
use crate::models::AssetClass;
use crate::provider::alpha_vantage::AlphaVantageProvider;
use crate::provider::binance::BinanceProvider;
use crate::provider::coinbase::CoinbaseProvider;
use crate::provider::coingecko::CoinGeckoProvider;
use crate::provider::eastmoney::EastmoneyProvider;
use crate::provider::finnhub::FinnhubProvider;
use crate::provider::kraken::KrakenProvider;
use crate::provider::okx::OkxProvider;
use crate::provider::sina::SinaProvider;
use crate::provider::tencent::TencentProvider;
use crate::provider::tushare::TushareProvider;
use crate::provider::yahoo::YahooProvider;
use crate::provider::ProviderAdapter;
use crate::registry::ProviderRoutes;

/// Routes over the built-in adapters.
///
/// Keyless adapters are always present. Keyed adapters join only when their
/// credential is set; Finnhub and Tushare then lead their lists, Alpha
/// Vantage trails (its free tier allows 25 calls a day).
pub fn default_routes(settings: &ProviderSettings) -> ProviderRoutes {
    let mut equity: Vec<Arc<dyn ProviderAdapter>> = Vec::new();
    if let Some(key) = settings.finnhub_api_key() {
        equity.push(Arc::new(FinnhubProvider::new(key.to_string())));
    }
    equity.push(Arc::new(YahooProvider::new()));
    if let Some(key) = settings.alpha_vantage_api_key() {
        equity.push(Arc::new(AlphaVantageProvider::new(key.to_string())));
    }

    let mut a_share: Vec<Arc<dyn ProviderAdapter>> = Vec::new();
    if let Some(token) = settings.tushare_token() {
        a_share.push(Arc::new(TushareProvider::new(token.to_string())));
    }
    a_share.push(Arc::new(EastmoneyProvider::new()));
    a_share.push(Arc::new(SinaProvider::new()));
    a_share.push(Arc::new(TencentProvider::new()));

    let crypto: Vec<Arc<dyn ProviderAdapter>> = vec![
        Arc::new(BinanceProvider::new()),
        Arc::new(OkxProvider::new()),
        Arc::new(CoinbaseProvider::new()),
        Arc::new(KrakenProvider::new()),
        Arc::new(CoinGeckoProvider::new()),
    ];

    let routes = ProviderRoutes::new()
        .with_route(AssetClass::Equity, equity)
        .with_route(AssetClass::AShare, a_share)
        .with_route(AssetClass::Crypto, crypto);
    info!("Default provider routes: {:?}", routes);
    routes
}
