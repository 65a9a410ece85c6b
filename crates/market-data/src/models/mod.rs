//! Market data models
//!
//! This module contains the core data types for quote acquisition:
//! - `types` - Type aliases and constants for identifiers (ProviderId)
//! - `asset_class` - Coarse asset classification (AssetClass)
//! - `quote` - Canonical quote and its provenance tag (Quote, Reliability)
//! - `raw` - Provider-native intermediate records (RawQuote, ProviderResult)

mod asset_class;
mod quote;
mod raw;
mod types;

pub use asset_class::AssetClass;
pub use quote::{Quote, Reliability};
pub use raw::{ProviderResult, RawQuote};
pub use types::{ProviderId, SIMULATED_SOURCE};
