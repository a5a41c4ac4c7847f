//! # Submit policy: how long a producer waits on a full queue.
//!
//! Each attempt races queue capacity against the caller's cancellation and a wait
//! window of `backoff.next(attempt)`. A window that elapses counts as one failed
//! attempt and emits an informational "queue full" diagnostic. After
//! `max_attempts` windows the submit is rejected.
//!
//! ```text
//! attempt 0 ──► reserve │ cancel │ shutdown │ window(0) elapsed ──► info, attempt 1
//! attempt 1 ──► reserve │ cancel │ shutdown │ window(1) elapsed ──► info, attempt 2
//! ...
//! attempt N-1 elapsed ──► error RetriesExhausted
//! ```

use std::time::Duration;

use crate::policies::backoff::BackoffPolicy;

/// Retry ceiling and wait schedule for enqueueing into a full queue.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SubmitPolicy {
    /// Number of wait windows before giving up (clamped to at least 1).
    pub max_attempts: u32,
    /// Length of each wait window.
    pub backoff: BackoffPolicy,
}

impl Default for SubmitPolicy {
    /// 10 000 attempts of one second each.
    fn default() -> Self {
        Self {
            max_attempts: 10_000,
            backoff: BackoffPolicy::default(),
        }
    }
}

impl SubmitPolicy {
    /// Shorthand for a constant window.
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            max_attempts,
            backoff: BackoffPolicy::constant(window),
        }
    }

    /// Attempt ceiling clamped to a minimum of 1.
    #[inline]
    pub fn attempts_clamped(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ceiling() {
        let policy = SubmitPolicy::default();
        assert_eq!(policy.max_attempts, 10_000);
        assert_eq!(policy.backoff.next(0), Duration::from_secs(1));
    }

    #[test]
    fn test_zero_attempts_clamped() {
        assert_eq!(SubmitPolicy::new(0, Duration::from_millis(1)).attempts_clamped(), 1);
    }
}
