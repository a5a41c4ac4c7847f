//! # Backoff policy for waits between attempts.
//!
//! [`BackoffPolicy`] computes how long to wait on attempt `n`:
//! `first × factor^n`, clamped to `max`, then jittered. The base is derived from the
//! attempt number alone, so jitter never feeds back into later attempts.
//!
//! It drives two places:
//! - the per-attempt wait window of [`SubmitPolicy`](crate::SubmitPolicy) while the queue is full;
//! - the pause between resends of [`SendErrorPolicy::Retry`](crate::SendErrorPolicy::Retry).
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use diagstream::{BackoffPolicy, JitterPolicy};
//!
//! let backoff = BackoffPolicy::exponential(Duration::from_millis(10), 2.0, Duration::from_millis(50));
//!
//! assert_eq!(backoff.next(0), Duration::from_millis(10));
//! assert_eq!(backoff.next(2), Duration::from_millis(40));
//! assert_eq!(backoff.next(3), Duration::from_millis(50)); // capped
//!
//! let constant = BackoffPolicy::constant(Duration::from_secs(1));
//! assert_eq!(constant.next(9_999), Duration::from_secs(1));
//! assert_eq!(constant.jitter, JitterPolicy::None);
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Delay schedule indexed by attempt number.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackoffPolicy {
    /// Delay for attempt 0.
    pub first: Duration,
    /// Upper bound for any computed delay.
    pub max: Duration,
    /// Multiplicative growth factor (`1.0` = constant).
    pub factor: f64,
    /// Randomization applied after clamping.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// Constant one-second delay without jitter.
    fn default() -> Self {
        Self::constant(Duration::from_secs(1))
    }
}

impl BackoffPolicy {
    /// The same `delay` for every attempt.
    pub fn constant(delay: Duration) -> Self {
        Self {
            first: delay,
            max: delay,
            factor: 1.0,
            jitter: JitterPolicy::None,
        }
    }

    /// `first × factor^n`, capped at `max`.
    pub fn exponential(first: Duration, factor: f64, max: Duration) -> Self {
        Self {
            first,
            max,
            factor,
            jitter: JitterPolicy::None,
        }
    }

    /// Replaces the jitter policy.
    pub fn with_jitter(mut self, jitter: JitterPolicy) -> Self {
        self.jitter = jitter;
        self
    }

    /// Computes the delay for `attempt` (0-indexed).
    ///
    /// Non-finite or negative intermediate values clamp to [`BackoffPolicy::max`].
    pub fn next(&self, attempt: u32) -> Duration {
        let exp = attempt.min(i32::MAX as u32) as i32;
        let secs = self.first.as_secs_f64() * self.factor.powi(exp);

        let base = if !secs.is_finite() || secs < 0.0 || secs > self.max.as_secs_f64() {
            self.max
        } else {
            Duration::from_secs_f64(secs)
        };
        self.jitter.apply(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attempt_zero_returns_first() {
        let policy = BackoffPolicy::exponential(
            Duration::from_millis(100),
            2.0,
            Duration::from_secs(30),
        );
        assert_eq!(policy.next(0), Duration::from_millis(100));
    }

    #[test]
    fn test_exponential_growth() {
        let policy = BackoffPolicy::exponential(
            Duration::from_millis(100),
            2.0,
            Duration::from_secs(30),
        );
        assert_eq!(policy.next(1), Duration::from_millis(200));
        assert_eq!(policy.next(2), Duration::from_millis(400));
        assert_eq!(policy.next(4), Duration::from_millis(1600));
    }

    #[test]
    fn test_constant_never_grows() {
        let policy = BackoffPolicy::constant(Duration::from_millis(500));
        for attempt in [0, 1, 10, 9_999] {
            assert_eq!(policy.next(attempt), Duration::from_millis(500));
        }
    }

    #[test]
    fn test_first_exceeds_max() {
        let policy =
            BackoffPolicy::exponential(Duration::from_secs(10), 2.0, Duration::from_secs(5));
        assert_eq!(policy.next(0), Duration::from_secs(5));
    }

    #[test]
    fn test_overflow_clamps_to_max() {
        let policy = BackoffPolicy::exponential(
            Duration::from_millis(100),
            2.0,
            Duration::from_secs(10),
        );
        assert_eq!(policy.next(u32::MAX), Duration::from_secs(10));
    }

    #[test]
    fn test_jitter_stays_under_capped_base() {
        let policy = BackoffPolicy::exponential(
            Duration::from_millis(100),
            2.0,
            Duration::from_secs(1),
        )
        .with_jitter(JitterPolicy::Full);
        for attempt in 0..20 {
            assert!(policy.next(attempt) <= Duration::from_secs(1));
        }
    }
}
