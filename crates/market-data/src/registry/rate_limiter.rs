//! Sliding-window rate limiter with exponential backoff for provider services.
//!
//! Each external service gets its own request log covering the last hour,
//! from which both the per-minute and per-hour counts are derived. Failed
//! calls push the service into an exponentially growing backoff period,
//! during which every acquisition is denied. A successful call clears it.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use serde::Serialize;

/// Length of the short accounting window.
const MINUTE: Duration = Duration::from_secs(60);

/// Length of the long accounting window.
const HOUR: Duration = Duration::from_secs(3600);

/// Default rate limit: 60 requests per minute.
const DEFAULT_REQUESTS_PER_MINUTE: u32 = 60;

/// Default rate limit: 2000 requests per hour.
const DEFAULT_REQUESTS_PER_HOUR: u32 = 2000;

/// Backoff after the first consecutive failure.
const DEFAULT_BASE_BACKOFF: Duration = Duration::from_secs(1);

/// Upper bound for the backoff delay.
const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(300);

/// Rate limiter configuration for a service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum requests in any 60 second window.
    pub requests_per_minute: u32,
    /// Maximum requests in any 3600 second window.
    pub requests_per_hour: u32,
    /// Backoff applied after the first consecutive failure.
    pub base_backoff: Duration,
    /// Cap on the backoff delay.
    pub max_backoff: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: DEFAULT_REQUESTS_PER_MINUTE,
            requests_per_hour: DEFAULT_REQUESTS_PER_HOUR,
            base_backoff: DEFAULT_BASE_BACKOFF,
            max_backoff: DEFAULT_MAX_BACKOFF,
        }
    }
}

impl RateLimitConfig {
    /// Convenience constructor for window limits with default backoff.
    pub fn per_window(requests_per_minute: u32, requests_per_hour: u32) -> Self {
        Self {
            requests_per_minute,
            requests_per_hour,
            ..Default::default()
        }
    }

    /// Backoff delay after `consecutive_errors` failures in a row.
    ///
    /// `min(base * 2^(errors-1), max)`; zero when there were no errors.
    pub fn backoff_delay(&self, consecutive_errors: u32) -> Duration {
        if consecutive_errors == 0 {
            return Duration::ZERO;
        }
        let exponent = (consecutive_errors - 1).min(31);
        self.base_backoff
            .saturating_mul(2u32.saturating_pow(exponent))
            .min(self.max_backoff)
    }
}

/// Why an acquisition was denied.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum DenyReason {
    /// The 60 second window is saturated.
    MinuteWindow,
    /// The 3600 second window is saturated.
    HourWindow,
    /// The service is backing off after consecutive failures.
    Backoff,
}

/// Result of [`RateLimiter::try_acquire`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Acquire {
    /// The request may proceed; it has been counted against both windows.
    Granted,
    /// The request must not be sent now.
    Denied {
        /// Time until the blocking condition clears (always > 0).
        retry_after: Duration,
        /// The blocking condition.
        reason: DenyReason,
    },
}

impl Acquire {
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }

    /// Remaining wait; zero when granted.
    pub fn retry_after(&self) -> Duration {
        match self {
            Self::Granted => Duration::ZERO,
            Self::Denied { retry_after, .. } => *retry_after,
        }
    }
}

/// Read-only view of a service's rate-limit state.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct RateLimitSnapshot {
    pub service: String,
    pub requests_last_minute: u32,
    pub requests_last_hour: u32,
    pub consecutive_errors: u32,
    /// Remaining backoff; zero when not backing off.
    pub backoff_remaining: Duration,
}

/// Accounting state for a single service.
#[derive(Debug)]
struct ServiceState {
    config: RateLimitConfig,
    /// Grant times within the last hour, oldest first.
    requests: VecDeque<Instant>,
    consecutive_errors: u32,
    backoff_until: Option<Instant>,
}

impl ServiceState {
    fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            requests: VecDeque::new(),
            consecutive_errors: 0,
            backoff_until: None,
        }
    }

    /// Drop grants that fell out of the hour window.
    fn prune(&mut self, now: Instant) {
        while let Some(oldest) = self.requests.front() {
            if now.saturating_duration_since(*oldest) >= HOUR {
                self.requests.pop_front();
            } else {
                break;
            }
        }
    }

    /// Grants within the last minute, and the oldest of them.
    fn minute_window(&self, now: Instant) -> (u32, Option<Instant>) {
        let mut count = 0u32;
        let mut oldest = None;
        for at in self.requests.iter().rev() {
            if now.saturating_duration_since(*at) >= MINUTE {
                break;
            }
            count += 1;
            oldest = Some(*at);
        }
        (count, oldest)
    }

    fn try_acquire(&mut self, now: Instant) -> Acquire {
        self.prune(now);

        if let Some(until) = self.backoff_until {
            if now < until {
                return Acquire::Denied {
                    retry_after: until - now,
                    reason: DenyReason::Backoff,
                };
            }
        }

        let (minute_count, minute_oldest) = self.minute_window(now);
        if minute_count >= self.config.requests_per_minute {
            let retry_after = minute_oldest
                .map(|at| (at + MINUTE).saturating_duration_since(now))
                .unwrap_or(MINUTE);
            return Acquire::Denied {
                retry_after: retry_after.max(Duration::from_millis(1)),
                reason: DenyReason::MinuteWindow,
            };
        }

        if self.requests.len() as u32 >= self.config.requests_per_hour {
            let retry_after = self
                .requests
                .front()
                .map(|at| (*at + HOUR).saturating_duration_since(now))
                .unwrap_or(HOUR);
            return Acquire::Denied {
                retry_after: retry_after.max(Duration::from_millis(1)),
                reason: DenyReason::HourWindow,
            };
        }

        self.requests.push_back(now);
        Acquire::Granted
    }

    fn record_outcome(&mut self, success: bool, now: Instant) {
        if success {
            self.consecutive_errors = 0;
            self.backoff_until = None;
        } else {
            self.consecutive_errors = self.consecutive_errors.saturating_add(1);
            self.backoff_until = Some(now + self.config.backoff_delay(self.consecutive_errors));
        }
    }

    fn snapshot(&mut self, service: &str, now: Instant) -> RateLimitSnapshot {
        self.prune(now);
        let (minute_count, _) = self.minute_window(now);
        RateLimitSnapshot {
            service: service.to_string(),
            requests_last_minute: minute_count,
            requests_last_hour: self.requests.len() as u32,
            consecutive_errors: self.consecutive_errors,
            backoff_remaining: self
                .backoff_until
                .map(|until| until.saturating_duration_since(now))
                .unwrap_or(Duration::ZERO),
        }
    }
}

/// Per-service rate limiter.
///
/// Thread-safe limiter that keeps one [`ServiceState`] per service name.
/// States are created on demand with the default configuration, or with a
/// per-service override registered through [`configure`](Self::configure).
/// Locks are only held for in-memory bookkeeping, never across I/O.
pub struct RateLimiter {
    /// Per-service accounting state.
    services: Mutex<HashMap<String, ServiceState>>,
    /// Per-service configuration overrides.
    configs: Mutex<HashMap<String, RateLimitConfig>>,
    /// Configuration for services without an override.
    default_config: RateLimitConfig,
}

impl RateLimiter {
    /// Create a new rate limiter with default settings.
    pub fn new() -> Self {
        Self::with_default_config(RateLimitConfig::default())
    }

    /// Create a rate limiter whose unconfigured services use `config`.
    pub fn with_default_config(config: RateLimitConfig) -> Self {
        Self {
            services: Mutex::new(HashMap::new()),
            configs: Mutex::new(HashMap::new()),
            default_config: config,
        }
    }

    /// Lock the services mutex, recovering from poison if necessary.
    ///
    /// Worst case after a poisoned lock is slightly off accounting, which is
    /// preferable to panicking on the request path.
    fn lock_services(&self) -> MutexGuard<'_, HashMap<String, ServiceState>> {
        self.services.lock().unwrap_or_else(|poisoned| {
            warn!("Rate limiter services mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Lock the configs mutex, recovering from poison if necessary.
    fn lock_configs(&self) -> MutexGuard<'_, HashMap<String, RateLimitConfig>> {
        self.configs.lock().unwrap_or_else(|poisoned| {
            warn!("Rate limiter configs mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Configure limits for a specific service.
    ///
    /// Existing accounting for the service is discarded.
    pub fn configure(&self, service: &str, config: RateLimitConfig) {
        let mut configs = self.lock_configs();
        configs.insert(service.to_string(), config);
        drop(configs); // Release configs lock before acquiring services lock

        let mut services = self.lock_services();
        services.remove(service);
    }

    /// Whether the service has an explicit configuration.
    pub fn is_configured(&self, service: &str) -> bool {
        self.lock_configs().contains_key(service)
    }

    /// Try to acquire a request slot for the service without waiting.
    pub fn try_acquire(&self, service: &str) -> Acquire {
        self.try_acquire_at(service, Instant::now())
    }

    pub(crate) fn try_acquire_at(&self, service: &str, now: Instant) -> Acquire {
        let config = self.config_for(service);
        let mut services = self.lock_services();
        let state = services
            .entry(service.to_string())
            .or_insert_with(|| ServiceState::new(config));

        let outcome = state.try_acquire(now);
        match outcome {
            Acquire::Granted => debug!("Rate limiter: granted request for '{}'", service),
            Acquire::Denied { retry_after, reason } => debug!(
                "Rate limiter: denied '{}' ({:?}), retry after {:?}",
                service, reason, retry_after
            ),
        }
        outcome
    }

    /// Record the network outcome of a call made after a granted acquisition.
    pub fn record_outcome(&self, service: &str, success: bool) {
        self.record_outcome_at(service, success, Instant::now());
    }

    pub(crate) fn record_outcome_at(&self, service: &str, success: bool, now: Instant) {
        let config = self.config_for(service);
        let mut services = self.lock_services();
        let state = services
            .entry(service.to_string())
            .or_insert_with(|| ServiceState::new(config));

        let was_backing_off = state.consecutive_errors > 0;
        state.record_outcome(success, now);

        if success {
            if was_backing_off {
                info!("Rate limiter: '{}' recovered, backoff cleared", service);
            }
        } else {
            warn!(
                "Rate limiter: '{}' failed {} time(s) in a row, backing off for {:?}",
                service,
                state.consecutive_errors,
                state.config.backoff_delay(state.consecutive_errors)
            );
        }
    }

    /// Current accounting for a service.
    pub fn state(&self, service: &str) -> RateLimitSnapshot {
        self.state_at(service, Instant::now())
    }

    pub(crate) fn state_at(&self, service: &str, now: Instant) -> RateLimitSnapshot {
        let mut services = self.lock_services();
        match services.get_mut(service) {
            Some(state) => state.snapshot(service, now),
            None => RateLimitSnapshot {
                service: service.to_string(),
                requests_last_minute: 0,
                requests_last_hour: 0,
                consecutive_errors: 0,
                backoff_remaining: Duration::ZERO,
            },
        }
    }

    /// Reset the accounting for a service.
    pub fn reset(&self, service: &str) {
        let mut services = self.lock_services();
        services.remove(service);
    }

    /// Configuration that applies to a service.
    fn config_for(&self, service: &str) -> RateLimitConfig {
        let configs = self.lock_configs();
        configs
            .get(service)
            .cloned()
            .unwrap_or_else(|| self.default_config.clone())
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
