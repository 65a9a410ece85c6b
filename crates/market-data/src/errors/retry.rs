/// Classification for failover policy.
///
/// Used to determine how the orchestrator should respond to a failed attempt.
///
/// # Behavior Summary
///
/// | Class | Try Next Provider? | Record Rate Limiter Failure? |
/// |-------|-------------------|------------------------------|
/// | `Never` | No | No |
/// | `FailoverWithPenalty` | Yes | Yes (starts or extends backoff) |
/// | `NextProvider` | Yes | No |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Never retry - invalid request, cancellation, or terminal failure.
    /// Asking another provider won't help.
    Never,

    /// Failover to next provider and record a failed outcome for this service.
    ///
    /// Used for transport-level failures: timeouts, connection errors and
    /// remote rate limiting (429). The failed outcome grows the service's
    /// exponential backoff, so the provider is skipped by subsequent requests
    /// until the backoff elapses.
    FailoverWithPenalty,

    /// Try next provider without recording any penalty.
    ///
    /// Used when the provider answered but the payload was unusable
    /// (empty, unparsable, implausible). The network call itself succeeded.
    NextProvider,
}
