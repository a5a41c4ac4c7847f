//! # What the worker does when the stream rejects a send.
//!
//! Delivery is at-most-once. The worker never cancels a send in flight; the policy
//! only decides what happens *after* a send returned an error.
//!
//! ```text
//! send(task) ── Ok ──► next task
//!      └─ Err ──► DropAndContinue ─► error diagnostic, next task
//!             ├─► Retry { attempts, backoff } ─► sleep, resend … then drop
//!             └─► Abort ─► error diagnostic, discard every later task (still drained)
//! ```

use crate::policies::backoff::BackoffPolicy;

/// Reaction to a failed `StreamClient::send`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum SendErrorPolicy {
    /// Report the failure, lose that task, keep forwarding the rest (default).
    #[default]
    DropAndContinue,
    /// Resend up to `attempts` more times, pausing `backoff.next(n)` before resend `n`.
    Retry {
        attempts: u32,
        backoff: BackoffPolicy,
    },
    /// Stop forwarding. Remaining tasks are dequeued and discarded so producers never block.
    Abort,
}

impl SendErrorPolicy {
    /// Number of resends allowed after the first failure.
    pub fn resends(&self) -> u32 {
        match self {
            SendErrorPolicy::Retry { attempts, .. } => *attempts,
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_only_retry_allows_resends() {
        let retry = SendErrorPolicy::Retry {
            attempts: 4,
            backoff: BackoffPolicy::constant(Duration::from_millis(1)),
        };
        assert_eq!(retry.resends(), 4);
        assert_eq!(SendErrorPolicy::DropAndContinue.resends(), 0);
        assert_eq!(SendErrorPolicy::Abort.resends(), 0);
        assert_eq!(SendErrorPolicy::default(), SendErrorPolicy::DropAndContinue);
    }
}
