use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::types::ProviderId;
use crate::errors::ProviderFailure;

/// Provider-native fields extracted by an adapter, before normalization.
///
/// Field names are whatever the provider calls them (`c`, `lastPrice`,
/// `05. price`, ...); the normalizer owns the mapping to canonical fields.
#[derive(Clone, Debug, PartialEq)]
pub struct RawQuote {
    /// Adapter that produced the record
    pub provider: ProviderId,
    /// Loosely-typed provider fields
    pub fields: Map<String, Value>,
    /// Time the adapter received the payload
    pub fetched_at: DateTime<Utc>,
}

impl RawQuote {
    pub fn new(provider: ProviderId) -> Self {
        Self {
            provider,
            fields: Map::new(),
            fetched_at: Utc::now(),
        }
    }

    /// Build a record from an already-decoded JSON object.
    pub fn from_object(provider: ProviderId, fields: Map<String, Value>) -> Self {
        Self {
            provider,
            fields,
            fetched_at: Utc::now(),
        }
    }

    pub fn with_fetched_at(mut self, fetched_at: DateTime<Utc>) -> Self {
        self.fetched_at = fetched_at;
        self
    }

    /// Insert a field, skipping JSON nulls.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let value = value.into();
        if !value.is_null() {
            self.fields.insert(key.into(), value);
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Outcome of a single adapter call.
pub type ProviderResult = Result<RawQuote, ProviderFailure>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::borrow::Cow;

    #[test]
    fn test_insert_skips_null() {
        let mut raw = RawQuote::new(Cow::Borrowed("TEST"));
        raw.insert("price", json!(1.5));
        raw.insert("volume", Value::Null);

        assert_eq!(raw.get("price"), Some(&json!(1.5)));
        assert!(raw.get("volume").is_none());
        assert!(!raw.is_empty());
    }
}
