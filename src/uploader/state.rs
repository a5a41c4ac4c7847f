//! # Uploader lifecycle state and counters.
//!
//! ```text
//! Idle ──run_uploader_worker()──► Running ──shutdown_and_wait()──► Draining ──worker exit──► Closed
//!   └──────────────────shutdown_and_wait() (starts the worker)─────────┘
//! ```
//!
//! Transitions only move forward; there is no way back from `Closed`.

use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};

/// Lifecycle state of a [`StreamUploader`](crate::StreamUploader).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum UploaderState {
    /// Created; tasks may be queued but nothing dequeues them.
    Idle,
    /// Worker is consuming the queue.
    Running,
    /// Queue closed for new tasks; worker is draining what is buffered.
    Draining,
    /// Worker exited and the stream was closed.
    Closed,
}

impl UploaderState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => UploaderState::Idle,
            1 => UploaderState::Running,
            2 => UploaderState::Draining,
            _ => UploaderState::Closed,
        }
    }
}

/// Forward-only atomic state.
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) fn new() -> Self {
        Self(AtomicU8::new(UploaderState::Idle as u8))
    }

    pub(crate) fn get(&self) -> UploaderState {
        UploaderState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Moves to `to` unless the current state is already later; returns the previous state.
    pub(crate) fn advance(&self, to: UploaderState) -> UploaderState {
        UploaderState::from_u8(self.0.fetch_max(to as u8, Ordering::AcqRel))
    }
}

/// Point-in-time copy of an uploader's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploaderStatsSnapshot {
    /// Tasks accepted into the queue.
    pub submitted: u64,
    /// Submits that returned `false`.
    pub rejected: u64,
    /// Submit wait windows that elapsed on a full queue.
    pub retries: u64,
    /// Tasks the stream acknowledged as sent.
    pub sent: u64,
    /// Tasks lost to a send error.
    pub failed: u64,
    /// Tasks discarded without a send (after an abort).
    pub dropped: u64,
    /// Idle heartbeats emitted by the worker.
    pub idle_ticks: u64,
}

#[derive(Default)]
pub(crate) struct UploaderStats {
    submitted: AtomicU64,
    rejected: AtomicU64,
    retries: AtomicU64,
    sent: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
    idle_ticks: AtomicU64,
}

macro_rules! bump {
    ($($name:ident => $field:ident),* $(,)?) => {
        $(
            #[inline]
            pub(crate) fn $name(&self) {
                self.$field.fetch_add(1, Ordering::Relaxed);
            }
        )*
    };
}

impl UploaderStats {
    bump! {
        on_submitted => submitted,
        on_rejected => rejected,
        on_retry => retries,
        on_sent => sent,
        on_failed => failed,
        on_dropped => dropped,
        on_idle_tick => idle_ticks,
    }

    pub(crate) fn snapshot(&self) -> UploaderStatsSnapshot {
        UploaderStatsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            sent: self.sent.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            idle_ticks: self.idle_ticks.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_never_moves_backwards() {
        let cell = StateCell::new();
        assert_eq!(cell.get(), UploaderState::Idle);

        assert_eq!(cell.advance(UploaderState::Draining), UploaderState::Idle);
        assert_eq!(cell.advance(UploaderState::Running), UploaderState::Draining);
        assert_eq!(cell.get(), UploaderState::Draining);

        cell.advance(UploaderState::Closed);
        assert_eq!(cell.get(), UploaderState::Closed);
    }

    #[test]
    fn test_stats_snapshot() {
        let stats = UploaderStats::default();
        stats.on_submitted();
        stats.on_submitted();
        stats.on_sent();
        stats.on_retry();

        let snap = stats.snapshot();
        assert_eq!(snap.submitted, 2);
        assert_eq!(snap.sent, 1);
        assert_eq!(snap.retries, 1);
        assert_eq!(snap.failed, 0);
    }
}
