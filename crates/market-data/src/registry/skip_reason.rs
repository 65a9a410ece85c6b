//! Skip reason tracking for provider selection diagnostics.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use super::rate_limiter::DenyReason;
use crate::models::ProviderId;

/// Why a provider was skipped without being called.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// Provider does not serve this asset class.
    AssetClassMismatch,

    /// Provider cannot translate this symbol.
    SymbolUnsupported,

    /// Rate limiter denied the call.
    RateLimited {
        retry_after: Duration,
        reason: DenyReason,
    },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AssetClassMismatch => f.write_str("asset class not served"),
            Self::SymbolUnsupported => f.write_str("symbol not supported"),
            Self::RateLimited {
                retry_after,
                reason,
            } => write!(
                f,
                "rate limited ({:?}, retry in {}ms)",
                reason,
                retry_after.as_millis()
            ),
        }
    }
}

/// Record of a single provider attempt during a fetch.
#[derive(Clone, Debug)]
pub struct ProviderAttempt {
    pub provider_id: ProviderId,
    pub skipped: Option<SkipReason>,
    pub error: Option<String>,
    pub success: bool,
    pub elapsed: Option<Duration>,
}

/// Per-provider outcome summary, serializable for diagnostics output.
#[derive(Clone, Debug, Serialize)]
pub struct AttemptSummary {
    pub provider: String,
    pub outcome: String,
}

/// Detailed result of a fetch operation with skip diagnostics.
#[derive(Clone, Debug, Default)]
pub struct FetchDiagnostics {
    pub attempts: Vec<ProviderAttempt>,
}

impl FetchDiagnostics {
    pub fn new() -> Self {
        Self {
            attempts: Vec::new(),
        }
    }

    pub fn record_skip(&mut self, provider_id: ProviderId, reason: SkipReason) {
        self.attempts.push(ProviderAttempt {
            provider_id,
            skipped: Some(reason),
            error: None,
            success: false,
            elapsed: None,
        });
    }

    pub fn record_error(&mut self, provider_id: ProviderId, error: String, elapsed: Duration) {
        self.attempts.push(ProviderAttempt {
            provider_id,
            skipped: None,
            error: Some(error),
            success: false,
            elapsed: Some(elapsed),
        });
    }

    pub fn record_success(&mut self, provider_id: ProviderId, elapsed: Duration) {
        self.attempts.push(ProviderAttempt {
            provider_id,
            skipped: None,
            error: None,
            success: true,
            elapsed: Some(elapsed),
        });
    }

    /// Summary for logging/debugging.
    pub fn summary(&self) -> String {
        if self.attempts.is_empty() {
            return "no providers attempted".to_string();
        }
        self.attempts
            .iter()
            .map(|a| format!("{}: {}", a.provider_id, outcome(a)))
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    pub fn to_summaries(&self) -> Vec<AttemptSummary> {
        self.attempts
            .iter()
            .map(|a| AttemptSummary {
                provider: a.provider_id.to_string(),
                outcome: outcome(a),
            })
            .collect()
    }

    /// Check if any provider succeeded.
    pub fn has_success(&self) -> bool {
        self.attempts.iter().any(|a| a.success)
    }

    /// Providers actually called, in call order.
    pub fn called(&self) -> Vec<&ProviderId> {
        self.attempts
            .iter()
            .filter(|a| a.skipped.is_none())
            .map(|a| &a.provider_id)
            .collect()
    }

    /// Get all skip reasons.
    pub fn skip_reasons(&self) -> Vec<(&ProviderId, &SkipReason)> {
        self.attempts
            .iter()
            .filter_map(|a| a.skipped.as_ref().map(|s| (&a.provider_id, s)))
            .collect()
    }

    /// Get all errors.
    pub fn errors(&self) -> Vec<(&ProviderId, &str)> {
        self.attempts
            .iter()
            .filter_map(|a| a.error.as_ref().map(|e| (&a.provider_id, e.as_str())))
            .collect()
    }
}

fn outcome(attempt: &ProviderAttempt) -> String {
    if attempt.success {
        "SUCCESS".to_string()
    } else if let Some(skip) = &attempt.skipped {
        format!("SKIPPED ({})", skip)
    } else if let Some(err) = &attempt.error {
        format!("ERROR ({})", err)
    } else {
        "UNKNOWN".to_string()
    }
}
