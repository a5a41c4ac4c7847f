//! # Diagnostic sink trait.
//!
//! Provides [`Sink`], the consumer side of a [`Channel`](crate::Channel): whatever
//! renders or records diagnostic batches (console printer, log file, telemetry).
//!
//! Each channel gets:
//! - **Dedicated delivery worker** (one tokio task per channel)
//! - **Bounded queue** between `send` and the sink
//! - **Panic isolation** (a panicking sink receives a synthesized `Fatal` batch instead)
//!
//! ## Rules
//! - Batches are delivered sequentially, in `send` order, never concurrently.
//! - `index` is zero-based and strictly increasing per channel.
//! - A slow sink back-pressures its own channel's `send`, nothing else.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use diagstream::{Diagnostics, Sink};
//!
//! struct Printer;
//!
//! #[async_trait]
//! impl Sink for Printer {
//!     async fn accept(&self, index: u64, batch: &Diagnostics) {
//!         println!("#{index}\n{batch}");
//!     }
//!
//!     fn name(&self) -> &'static str { "printer" }
//! }
//! ```

use async_trait::async_trait;

use crate::diagnostics::Diagnostics;

/// Consumer of diagnostic batches.
///
/// ### Implementation requirements
/// - Use async I/O; avoid blocking the executor.
/// - Handle errors internally; a panic is caught but the batch it was rendering is lost.
#[async_trait]
pub trait Sink: Send + Sync + 'static {
    /// Consumes one batch.
    ///
    /// Called from the channel's delivery worker, not in the producer context.
    async fn accept(&self, index: u64, batch: &Diagnostics);

    /// Returns the sink name used in logs and synthesized panic diagnostics.
    ///
    /// The default uses `type_name::<Self>()`; override it with something short.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Sink that ignores everything; used by forward-only child channels.
pub(crate) struct Discard;

#[async_trait]
impl Sink for Discard {
    async fn accept(&self, _index: u64, _batch: &Diagnostics) {}

    fn name(&self) -> &'static str {
        "discard"
    }
}
