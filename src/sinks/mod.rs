//! # Built-in sinks
//!
//! - [`FnSink`]: wraps a closure `Fn(index, &batch)`.
//! - [`MemorySink`]: records every batch (tests, deferred rendering).
//! - [`LogSink`]: renders batches through `tracing` _(feature `logging`)_.

mod fn_sink;
#[cfg(feature = "logging")]
mod log;
mod memory;

pub use fn_sink::FnSink;
#[cfg(feature = "logging")]
pub use log::LogSink;
pub use memory::MemorySink;
