use std::borrow::Cow;

/// Provider identifier - mostly static constants
pub type ProviderId = Cow<'static, str>;

/// Source label for quotes fabricated by the synthetic fallback
pub const SIMULATED_SOURCE: &str = "SIMULATED";
