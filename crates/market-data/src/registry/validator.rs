//! Quote data validation.
//!
//! Validates normalized quotes before the orchestrator accepts them:
//! - Positive price within a sanity ceiling (hard)
//! - Zero volume (soft)
//! - Daily move beyond the asset class's plausible range (soft)
//! - Timestamps from the future (soft)

use chrono::{Duration as ChronoDuration, Utc};
use log::warn;
use rust_decimal::Decimal;

use crate::errors::MarketDataError;
use crate::models::{AssetClass, Quote};

/// Validation severity levels.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValidationSeverity {
    /// Hard failure - reject quote, try next provider.
    Hard,
    /// Soft warning - accept quote but log warning.
    Soft,
}

/// Validation result details.
#[derive(Clone, Debug)]
pub struct ValidationIssue {
    /// Severity of the issue.
    pub severity: ValidationSeverity,
    /// Description of the issue.
    pub message: String,
}

/// Quote validator configuration.
#[derive(Clone, Debug)]
pub struct ValidatorConfig {
    /// Maximum allowed price value (for sanity check).
    pub max_price: Decimal,
    /// Whether to warn on zero volume.
    pub warn_on_zero_volume: bool,
    /// Largest plausible absolute daily move for equities, in percent.
    pub equity_move_limit: Decimal,
    /// Same for A-shares (exchange limit-up/limit-down is 10-20%).
    pub a_share_move_limit: Decimal,
    /// Same for crypto.
    pub crypto_move_limit: Decimal,
    /// Tolerated clock skew for provider timestamps.
    pub max_future_skew: ChronoDuration,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            max_price: Decimal::from(1_000_000_000i64),
            warn_on_zero_volume: true,
            equity_move_limit: Decimal::from(50),
            a_share_move_limit: Decimal::from(20),
            crypto_move_limit: Decimal::from(80),
            max_future_skew: ChronoDuration::minutes(10),
        }
    }
}

impl ValidatorConfig {
    fn move_limit(&self, asset_class: AssetClass) -> Decimal {
        match asset_class {
            AssetClass::Equity => self.equity_move_limit,
            AssetClass::AShare => self.a_share_move_limit,
            AssetClass::Crypto => self.crypto_move_limit,
        }
    }
}

/// Quote data validator.
#[derive(Clone, Debug, Default)]
pub struct QuoteValidator {
    config: ValidatorConfig,
}

impl QuoteValidator {
    /// Create a new validator with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a validator with custom configuration.
    pub fn with_config(config: ValidatorConfig) -> Self {
        Self { config }
    }

    /// Validate a quote.
    ///
    /// Returns Ok(()) if the quote is acceptable. Warnings are logged but do
    /// not cause rejection.
    pub fn validate(&self, quote: &Quote) -> Result<(), MarketDataError> {
        let issues = self.inspect(quote);

        let errors: Vec<_> = issues
            .iter()
            .filter(|i| i.severity == ValidationSeverity::Hard)
            .map(|i| i.message.as_str())
            .collect();

        if !errors.is_empty() {
            return Err(MarketDataError::ValidationFailed {
                message: errors.join("; "),
            });
        }

        for issue in issues.iter().filter(|i| i.severity == ValidationSeverity::Soft) {
            warn!(
                "Quote validation warning for {} from {}: {}",
                quote.symbol(),
                quote.source(),
                issue.message
            );
        }

        Ok(())
    }

    /// Collect every issue without logging.
    pub fn inspect(&self, quote: &Quote) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        self.validate_price(quote, &mut issues);
        self.validate_volume(quote, &mut issues);
        self.validate_move(quote, &mut issues);
        self.validate_timestamp(quote, &mut issues);
        issues
    }

    fn validate_price(&self, quote: &Quote, issues: &mut Vec<ValidationIssue>) {
        if quote.price() <= Decimal::ZERO {
            issues.push(ValidationIssue {
                severity: ValidationSeverity::Hard,
                message: format!("Non-positive price: {}", quote.price()),
            });
        }
        if quote.price() > self.config.max_price {
            issues.push(ValidationIssue {
                severity: ValidationSeverity::Hard,
                message: format!(
                    "Price {} exceeds sanity limit {}",
                    quote.price(),
                    self.config.max_price
                ),
            });
        }
    }

    fn validate_volume(&self, quote: &Quote, issues: &mut Vec<ValidationIssue>) {
        if self.config.warn_on_zero_volume && quote.volume() == 0 {
            issues.push(ValidationIssue {
                severity: ValidationSeverity::Soft,
                message: "Zero volume (market may be closed)".to_string(),
            });
        }
    }

    fn validate_move(&self, quote: &Quote, issues: &mut Vec<ValidationIssue>) {
        let limit = self.config.move_limit(quote.asset_class());
        if quote.change_percent().abs() > limit {
            issues.push(ValidationIssue {
                severity: ValidationSeverity::Soft,
                message: format!(
                    "Change {}% exceeds {}% plausibility range for {}",
                    quote.change_percent(),
                    limit,
                    quote.asset_class()
                ),
            });
        }
    }

    fn validate_timestamp(&self, quote: &Quote, issues: &mut Vec<ValidationIssue>) {
        if quote.timestamp() > Utc::now() + self.config.max_future_skew {
            issues.push(ValidationIssue {
                severity: ValidationSeverity::Soft,
                message: format!("Timestamp {} is in the future", quote.timestamp()),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Reliability;
    use rust_decimal_macros::dec;

    fn make_quote(asset_class: AssetClass, price: Decimal, pct: Decimal, volume: u64) -> Quote {
        Quote::new("TEST", asset_class, price, "TEST", Reliability::Verified)
            .unwrap()
            .with_change(Decimal::ZERO, pct)
            .with_volume(volume)
    }

    fn has(issues: &[ValidationIssue], severity: ValidationSeverity, text: &str) -> bool {
        issues
            .iter()
            .any(|i| i.severity == severity && i.message.contains(text))
    }

    #[test]
    fn test_valid_quote() {
        let validator = QuoteValidator::new();
        let quote = make_quote(AssetClass::Equity, dec!(100), dec!(1.5), 1000);

        assert!(validator.validate(&quote).is_ok());
        assert!(validator.inspect(&quote).is_empty());
    }

    #[test]
    fn test_absurd_price_rejected() {
        let validator = QuoteValidator::new();
        let quote = make_quote(AssetClass::Crypto, dec!(2000000000), dec!(0), 10);

        let result = validator.validate(&quote);
        match result {
            Err(MarketDataError::ValidationFailed { message }) => {
                assert!(message.contains("exceeds sanity limit"));
            }
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn test_simulated_zero_price_rejected() {
        let validator = QuoteValidator::new();
        let quote = Quote::new("X", AssetClass::Equity, dec!(0), "SIMULATED", Reliability::Simulated)
            .unwrap();
        assert!(validator.validate(&quote).is_err());
    }

    #[test]
    fn test_zero_volume_is_soft() {
        let validator = QuoteValidator::new();
        let quote = make_quote(AssetClass::Equity, dec!(100), dec!(0), 0);

        assert!(validator.validate(&quote).is_ok());
        assert!(has(&validator.inspect(&quote), ValidationSeverity::Soft, "Zero volume"));
    }

    #[test]
    fn test_move_limits_per_asset_class() {
        let validator = QuoteValidator::new();

        // 25% is implausible for an A-share but fine for equities and crypto
        let a_share = make_quote(AssetClass::AShare, dec!(10), dec!(25), 100);
        let equity = make_quote(AssetClass::Equity, dec!(10), dec!(25), 100);
        let crypto = make_quote(AssetClass::Crypto, dec!(10), dec!(-25), 100);

        assert!(has(&validator.inspect(&a_share), ValidationSeverity::Soft, "plausibility"));
        assert!(validator.inspect(&equity).is_empty());
        assert!(validator.inspect(&crypto).is_empty());
        assert!(validator.validate(&a_share).is_ok());
    }

    #[test]
    fn test_future_timestamp_warns() {
        let validator = QuoteValidator::new();
        let quote = make_quote(AssetClass::Equity, dec!(10), dec!(0), 100)
            .with_timestamp(Utc::now() + ChronoDuration::hours(2));
        assert!(has(&validator.inspect(&quote), ValidationSeverity::Soft, "future"));
    }

    #[test]
    fn test_custom_config() {
        let validator = QuoteValidator::with_config(ValidatorConfig {
            warn_on_zero_volume: false,
            max_price: dec!(50),
            ..ValidatorConfig::default()
        });
        let quote = make_quote(AssetClass::Equity, dec!(60), dec!(0), 0);
        let issues = validator.inspect(&quote);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, ValidationSeverity::Hard);
    }
}
