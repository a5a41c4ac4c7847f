//! # Static configuration for channels and uploaders.
//!
//! Provides [`ChannelConfig`] and [`UploaderConfig`]: plain structs with public fields
//! and sensible defaults. Prefer the clamped accessors over reading raw fields so
//! sentinel handling (`0` capacities, zero ticks) stays in one place.
//!
//! ## Sentinel values
//! - `queue_capacity = 0` → clamped to 1
//! - `idle_tick = 0s` → clamped to 1ms

use std::sync::Arc;
use std::time::Duration;

use crate::policies::{SendErrorPolicy, SubmitPolicy};

/// Configuration of one diagnostic channel.
#[derive(Clone, Debug)]
pub struct ChannelConfig {
    /// Name used in logs and in the origin of synthesized diagnostics.
    pub name: Arc<str>,
    /// Capacity of the delivery queue between `send` and the sink.
    ///
    /// `send` waits for room when the queue is full; batches are never dropped.
    pub queue_capacity: usize,
}

impl ChannelConfig {
    /// Default configuration with the given name.
    pub fn named(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Queue capacity clamped to a minimum of 1.
    #[inline]
    pub fn queue_capacity_clamped(&self) -> usize {
        self.queue_capacity.max(1)
    }
}

impl Default for ChannelConfig {
    /// - `name = "root"`
    /// - `queue_capacity = 1024`
    fn default() -> Self {
        Self {
            name: Arc::from("root"),
            queue_capacity: 1024,
        }
    }
}

/// Configuration of one stream uploader.
///
/// ## Field semantics
/// - `name`: log correlation and diagnostic origin
/// - `queue_capacity`: bounded FIFO size between submitters and the worker
/// - `idle_tick`: period of heartbeat diagnostics while the queue is empty
/// - `submit`: retry ceiling and wait windows when the queue is full
/// - `on_send_error`: worker reaction when the stream rejects a send
#[derive(Clone, Debug)]
pub struct UploaderConfig {
    pub name: Arc<str>,
    pub queue_capacity: usize,
    pub idle_tick: Duration,
    pub submit: SubmitPolicy,
    pub on_send_error: SendErrorPolicy,
}

impl UploaderConfig {
    /// Default configuration with the given name.
    pub fn named(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Queue capacity clamped to a minimum of 1.
    #[inline]
    pub fn queue_capacity_clamped(&self) -> usize {
        self.queue_capacity.max(1)
    }

    /// Idle tick clamped to a minimum of 1ms (`tokio::time::interval` rejects zero).
    #[inline]
    pub fn idle_tick_clamped(&self) -> Duration {
        self.idle_tick.max(Duration::from_millis(1))
    }
}

impl Default for UploaderConfig {
    /// - `name = "uploader"`
    /// - `queue_capacity = 1024`
    /// - `idle_tick = 1s`
    /// - `submit = SubmitPolicy::default()` (10 000 × 1s)
    /// - `on_send_error = SendErrorPolicy::DropAndContinue`
    fn default() -> Self {
        Self {
            name: Arc::from("uploader"),
            queue_capacity: 1024,
            idle_tick: Duration::from_secs(1),
            submit: SubmitPolicy::default(),
            on_send_error: SendErrorPolicy::default(),
        }
    }
}
