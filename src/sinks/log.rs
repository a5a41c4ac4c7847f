//! # LogSink: renders batches through `tracing`
//!
//! Each diagnostic becomes one `tracing` event at the matching level (`Fatal` maps to
//! `error` with `fatal = true`). Install any subscriber (e.g. `tracing-subscriber`'s
//! `fmt` layer) to see the output.
//!
//! ## Example output
//! ```text
//! INFO diagstream::sinks::log: installing provider index=0 origin="installer"
//! WARN diagstream::sinks::log: queue full, retrying index=3 origin="uploader" code="upload_queue_full"
//! ERROR diagstream::sinks::log: transport: broken pipe index=7 origin="uploader" code="upload_transport"
//! ```

use async_trait::async_trait;

use crate::channel::Sink;
use crate::diagnostics::{Diagnostics, Severity};

/// Diagnostic renderer backed by `tracing`.
#[derive(Default)]
pub struct LogSink;

impl LogSink {
    /// Construct a new [`LogSink`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Sink for LogSink {
    async fn accept(&self, index: u64, batch: &Diagnostics) {
        for d in batch {
            let origin = d.origin.as_deref().unwrap_or("-");
            let code = d.code.unwrap_or("-");
            let msg = &*d.message;
            match d.severity {
                Severity::Trace => tracing::trace!(index, origin, code, "{msg}"),
                Severity::Debug => tracing::debug!(index, origin, code, "{msg}"),
                Severity::Info => tracing::info!(index, origin, code, "{msg}"),
                Severity::Warn => tracing::warn!(index, origin, code, "{msg}"),
                Severity::Error => tracing::error!(index, origin, code, "{msg}"),
                Severity::Fatal => tracing::error!(index, origin, code, fatal = true, "{msg}"),
            }
        }
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
