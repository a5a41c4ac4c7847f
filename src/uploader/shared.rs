//! State shared between an uploader's handles and its worker.
//!
//! The worker holds only [`Core`], never the queue sender, so dropping every
//! `StreamUploader` handle closes the queue and lets the worker finish on its own.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::channel::Channel;
use crate::config::UploaderConfig;
use crate::diagnostics::{Diagnostic, Diagnostics, Severity};
use crate::error::UploadError;
use crate::uploader::state::{StateCell, UploaderStats};

/// Static configuration of an uploader plus the channel it reports to.
#[derive(Clone, Debug)]
pub struct UploaderOptions {
    pub config: UploaderConfig,
    pub channel: Channel,
}

impl UploaderOptions {
    pub fn new(config: UploaderConfig, channel: Channel) -> Self {
        Self { config, channel }
    }

    /// Uploader name.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Effective queue capacity.
    pub fn queue_capacity(&self) -> usize {
        self.config.queue_capacity_clamped()
    }
}

pub(crate) struct Core<Resp> {
    pub(crate) options: UploaderOptions,
    pub(crate) state: StateCell,
    pub(crate) stats: UploaderStats,
    /// Cancelled by the first `shutdown_and_wait`.
    pub(crate) closing: CancellationToken,
    /// `Some(final diagnostics)` once the worker has exited.
    pub(crate) done: watch::Sender<Option<Diagnostics>>,
    pub(crate) response: Mutex<Option<Resp>>,
}

impl<Resp> Core<Resp> {
    pub(crate) fn new(options: UploaderOptions) -> Self {
        let (done, _) = watch::channel(None);
        Self {
            options,
            state: StateCell::new(),
            stats: UploaderStats::default(),
            closing: CancellationToken::new(),
            done,
            response: Mutex::new(None),
        }
    }

    pub(crate) fn name(&self) -> &Arc<str> {
        &self.options.config.name
    }

    /// Builds a diagnostic coded with the error's label.
    pub(crate) fn error_diag(&self, severity: Severity, err: &UploadError, detail: String) -> Diagnostic {
        Diagnostic::new(severity, format!("{detail}: {}", err.as_message())).with_code(err.as_label())
    }

    /// Sends a batch to the attached channel, stamped with this uploader's name.
    ///
    /// Best-effort: a closed channel is logged, never propagated.
    pub(crate) async fn emit(&self, batch: Diagnostics) {
        if batch.is_empty() {
            return;
        }
        let batch = batch.with_origin(Arc::clone(self.name()));
        if let Err(err) = self.options.channel.send(batch).await {
            tracing::warn!(uploader = %self.name(), error = %err, "diagnostic dropped");
        }
    }

    /// Like [`emit`](Self::emit) but never waits; a saturated channel drops the batch.
    pub(crate) fn try_emit(&self, batch: Diagnostics) {
        if batch.is_empty() {
            return;
        }
        let batch = batch.with_origin(Arc::clone(self.name()));
        if let Err(err) = self.options.channel.try_send(batch) {
            tracing::debug!(uploader = %self.name(), reason = err.as_label(), "diagnostic not emitted");
        }
    }

    pub(crate) fn store_response(&self, resp: Resp) {
        *self.response.lock().unwrap_or_else(PoisonError::into_inner) = Some(resp);
    }

    pub(crate) fn take_response(&self) -> Option<Resp> {
        self.response
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}
