//! Tencent Finance quote provider implementation.
//!
//! China A-shares via qt.gtimg.cn. The payload is a `~`-separated record:
//!
//! ```text
//! v_sh600519="1~贵州茅台~600519~1700.00~1680.00~1690.00~25000~...~20240105150003~20.00~1.19~...";
//! ```
//!
//! Unknown codes answer `v_pv_none_match="1";`.

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::ProviderFailure;
use crate::models::{AssetClass, ProviderResult, RawQuote};
use crate::provider::{parse_error, ProviderAdapter, ProviderHttp};
use crate::registry::RateLimitConfig;
use crate::resolver::AShareCode;

const BASE_URL: &str = "https://qt.gtimg.cn";
const PROVIDER_ID: &str = "TENCENT";

/// Positions in the `~`-separated record.
const COLUMNS: &[(usize, &str)] = &[
    (3, "price"),
    (4, "prev_close"),
    (5, "open"),
    (6, "volume_lots"),
    (30, "timestamp"),
    (31, "change"),
    (32, "change_pct"),
    (33, "high"),
    (34, "low"),
];
const MIN_COLUMNS: usize = 35;

/// Tencent Finance quote provider.
pub struct TencentProvider {
    http: ProviderHttp,
    base_url: String,
}

impl TencentProvider {
    pub fn new() -> Self {
        Self {
            http: ProviderHttp::new(PROVIDER_ID),
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl Default for TencentProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_qt(body: &str) -> ProviderResult {
    if body.contains("pv_none_match") {
        return Err(ProviderFailure::EmptyResponse {
            provider: PROVIDER_ID.to_string(),
        });
    }

    let payload = body
        .split_once('"')
        .and_then(|(_, rest)| rest.rsplit_once('"'))
        .map(|(inner, _)| inner)
        .ok_or_else(|| parse_error(PROVIDER_ID, "No quoted payload in response"))?;

    let columns: Vec<&str> = payload.split('~').collect();
    if columns.len() < MIN_COLUMNS {
        return Err(parse_error(
            PROVIDER_ID,
            format!("Expected at least {} columns, got {}", MIN_COLUMNS, columns.len()),
        ));
    }

    let mut raw = RawQuote::new(PROVIDER_ID.into());
    for (index, name) in COLUMNS {
        raw.insert(*name, Value::from(columns[*index].trim()));
    }
    Ok(raw)
}

#[async_trait]
impl ProviderAdapter for TencentProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn asset_classes(&self) -> &'static [AssetClass] {
        &[AssetClass::AShare]
    }

    fn rate_limit(&self) -> RateLimitConfig {
        RateLimitConfig::default()
    }

    fn supports(&self, symbol: &str) -> bool {
        AShareCode::parse(symbol).is_ok()
    }

    async fn fetch(&self, symbol: &str) -> ProviderResult {
        let code = AShareCode::parse(symbol).map_err(|e| parse_error(PROVIDER_ID, e.to_string()))?;
        let url = format!("{}/q={}", self.base_url, code.prefixed());
        let body = self.http.get_text(&url, &[]).await?;
        parse_qt(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> String {
        let mut columns: Vec<String> = vec![
            "1", "贵州茅台", "600519", "1700.00", "1680.00", "1690.00", "25000",
        ]
        .into_iter()
        .map(String::from)
        .collect();
        columns.resize(30, "0".to_string());
        columns.extend(
            ["20240105150003", "20.00", "1.19", "1710.00", "1685.00", "1700.00/25000/4250000000"]
                .map(String::from),
        );
        format!("v_sh600519=\"{}\";", columns.join("~"))
    }

    #[test]
    fn test_parse_qt() {
        let raw = parse_qt(&sample()).unwrap();
        assert_eq!(raw.get("price"), Some(&json!("1700.00")));
        assert_eq!(raw.get("prev_close"), Some(&json!("1680.00")));
        assert_eq!(raw.get("volume_lots"), Some(&json!("25000")));
        assert_eq!(raw.get("timestamp"), Some(&json!("20240105150003")));
        assert_eq!(raw.get("change_pct"), Some(&json!("1.19")));
    }

    #[test]
    fn test_parse_no_match() {
        assert!(matches!(
            parse_qt("v_pv_none_match=\"1\";"),
            Err(ProviderFailure::EmptyResponse { .. })
        ));
    }

    #[test]
    fn test_parse_short_record() {
        assert!(matches!(
            parse_qt("v_sh600519=\"1~贵州茅台~600519\";"),
            Err(ProviderFailure::ParseError { .. })
        ));
    }

    #[tokio::test]
    #[ignore = "requires network access"]
    async fn test_live_quote() {
        let raw = TencentProvider::new().fetch("000001.SZ").await.unwrap();
        assert!(raw.get("price").is_some());
    }
}
