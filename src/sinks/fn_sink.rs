//! # Function-backed sink (`FnSink`)
//!
//! [`FnSink`] wraps a closure `F: Fn(u64, &Diagnostics)`. The closure runs on the
//! channel's delivery worker, so it must be quick; use shared state through `Arc<...>`
//! captured explicitly.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use diagstream::{Diagnostics, FnSink, Sink};
//!
//! let seen = Arc::new(AtomicUsize::new(0));
//! let counter = Arc::clone(&seen);
//! let sink = FnSink::arc("counter", move |_index, batch: &Diagnostics| {
//!     counter.fetch_add(batch.len(), Ordering::Relaxed);
//! });
//! assert_eq!(sink.name(), "counter");
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::channel::Sink;
use crate::diagnostics::Diagnostics;

/// Closure-backed [`Sink`].
pub struct FnSink<F> {
    name: &'static str,
    f: F,
}

impl<F> FnSink<F> {
    /// Creates a new function-backed sink.
    pub fn new(name: &'static str, f: F) -> Self {
        Self { name, f }
    }

    /// Creates the sink and returns it as a shared handle.
    pub fn arc(name: &'static str, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F> Sink for FnSink<F>
where
    F: Fn(u64, &Diagnostics) + Send + Sync + 'static,
{
    async fn accept(&self, index: u64, batch: &Diagnostics) {
        (self.f)(index, batch);
    }

    fn name(&self) -> &'static str {
        self.name
    }
}
