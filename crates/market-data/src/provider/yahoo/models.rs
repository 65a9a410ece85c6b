//! Yahoo Finance API response models.
//!
//! Only the v8 chart endpoint is used; its `meta` block carries the latest
//! regular-market figures and is kept loosely typed for the normalizer.

use serde::Deserialize;
use serde_json::{Map, Value};

/// Main response wrapper for the chart API
#[derive(Debug, Deserialize)]
pub struct YahooChartResponse {
    pub chart: YahooChart,
}

/// Chart container
#[derive(Debug, Deserialize)]
pub struct YahooChart {
    #[serde(default)]
    pub result: Option<Vec<YahooChartResult>>,
    #[serde(default)]
    pub error: Option<YahooChartError>,
}

/// Individual result from the chart API
#[derive(Debug, Deserialize)]
pub struct YahooChartResult {
    #[serde(default)]
    pub meta: Map<String, Value>,
    // Note: timestamp and indicators exist but only meta is needed for the latest quote
}

/// Error block returned for unknown or delisted symbols
#[derive(Debug, Deserialize)]
pub struct YahooChartError {
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
}
