//! Sina Finance quote provider implementation.
//!
//! China A-shares via hq.sinajs.cn. The endpoint answers with a JavaScript
//! assignment holding a comma-separated record:
//!
//! ```text
//! var hq_str_sh600519="贵州茅台,1690.000,1680.000,1700.000,...,2024-01-05,15:00:03,00";
//! ```
//!
//! Requests without a Sina Referer are rejected with 403.

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::ProviderFailure;
use crate::models::{AssetClass, ProviderResult, RawQuote};
use crate::provider::{parse_error, ProviderAdapter, ProviderHttp, DEFAULT_HTTP_TIMEOUT};
use crate::registry::RateLimitConfig;
use crate::resolver::AShareCode;

const BASE_URL: &str = "https://hq.sinajs.cn";
const PROVIDER_ID: &str = "SINA";
const REFERER: &str = "https://finance.sina.com.cn";

/// Positions in the comma-separated record.
const COLUMNS: &[(usize, &str)] = &[
    (1, "open"),
    (2, "pre_close"),
    (3, "price"),
    (4, "high"),
    (5, "low"),
    (8, "volume"),
    (9, "amount"),
];
const DATE_COLUMN: usize = 30;
const TIME_COLUMN: usize = 31;

/// Sina Finance quote provider.
pub struct SinaProvider {
    http: ProviderHttp,
    base_url: String,
}

impl SinaProvider {
    pub fn new() -> Self {
        Self {
            http: ProviderHttp::with_headers(
                PROVIDER_ID,
                DEFAULT_HTTP_TIMEOUT,
                &[("referer", REFERER)],
            ),
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl Default for SinaProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Contents between the first and last double quote.
fn quoted_payload(body: &str) -> Option<&str> {
    let start = body.find('"')?;
    let end = body.rfind('"')?;
    (end > start).then(|| &body[start + 1..end])
}

fn parse_hq(body: &str) -> ProviderResult {
    let payload = quoted_payload(body)
        .ok_or_else(|| parse_error(PROVIDER_ID, "No quoted payload in response"))?;

    // Unknown codes come back as hq_str_xxx=""
    if payload.trim().is_empty() {
        return Err(ProviderFailure::EmptyResponse {
            provider: PROVIDER_ID.to_string(),
        });
    }

    let columns: Vec<&str> = payload.split(',').collect();
    if columns.len() <= TIME_COLUMN {
        return Err(parse_error(
            PROVIDER_ID,
            format!("Expected at least {} columns, got {}", TIME_COLUMN + 1, columns.len()),
        ));
    }

    let mut raw = RawQuote::new(PROVIDER_ID.into());
    for (index, name) in COLUMNS {
        raw.insert(*name, Value::from(columns[*index].trim()));
    }
    raw.insert(
        "datetime",
        format!("{} {}", columns[DATE_COLUMN].trim(), columns[TIME_COLUMN].trim()),
    );
    Ok(raw)
}

#[async_trait]
impl ProviderAdapter for SinaProvider {
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
        let url = format!("{}/list={}", self.base_url, code.prefixed());
        let body = self.http.get_text(&url, &[]).await?;
        parse_hq(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> String {
        let mut columns = vec![
            "贵州茅台", "1690.000", "1680.000", "1700.000", "1710.000", "1685.000",
            "1699.990", "1700.000", "2500000", "4250000000.000",
        ];
        columns.extend(std::iter::repeat("0").take(20));
        columns.extend(["2024-01-05", "15:00:03", "00"]);
        format!("var hq_str_sh600519=\"{}\";\n", columns.join(","))
    }

    #[test]
    fn test_parse_hq() {
        let raw = parse_hq(&sample()).unwrap();
        assert_eq!(raw.provider, "SINA");
        assert_eq!(raw.get("price"), Some(&json!("1700.000")));
        assert_eq!(raw.get("pre_close"), Some(&json!("1680.000")));
        assert_eq!(raw.get("volume"), Some(&json!("2500000")));
        assert_eq!(raw.get("datetime"), Some(&json!("2024-01-05 15:00:03")));
    }

    #[test]
    fn test_parse_unknown_code() {
        assert!(matches!(
            parse_hq("var hq_str_sh999999=\"\";"),
            Err(ProviderFailure::EmptyResponse { .. })
        ));
    }

    #[test]
    fn test_parse_truncated_record() {
        assert!(matches!(
            parse_hq("var hq_str_sh600519=\"贵州茅台,1690.000\";"),
            Err(ProviderFailure::ParseError { .. })
        ));
        assert!(matches!(
            parse_hq("Forbidden"),
            Err(ProviderFailure::ParseError { .. })
        ));
    }

    #[tokio::test]
    #[ignore = "requires network access"]
    async fn test_live_quote() {
        let raw = SinaProvider::new().fetch("600519.SS").await.unwrap();
        assert!(raw.get("price").is_some());
    }
}
