//! Provider orchestration module.
//!
//! This module coordinates quote providers, including:
//! - Ordered provider routes per asset class
//! - Sequential failover with per-call timeouts
//! - Rate limiting and exponential backoff per provider
//! - Quote data validation
//! - Diagnostic tracking for debugging provider selection

mod orchestrator;
mod rate_limiter;
mod routes;
mod skip_reason;
mod validator;

pub use orchestrator::{FetchOrchestrator, DEFAULT_CALL_TIMEOUT};
pub use rate_limiter::{Acquire, DenyReason, RateLimitConfig, RateLimitSnapshot, RateLimiter};
pub use routes::ProviderRoutes;
pub use skip_reason::{AttemptSummary, FetchDiagnostics, ProviderAttempt, SkipReason};
pub use validator::{QuoteValidator, ValidationIssue, ValidationSeverity, ValidatorConfig};
