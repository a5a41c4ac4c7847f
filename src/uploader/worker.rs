//! # UploadWorker: the single consumer of an uploader's queue.
//!
//! ## Loop
//! ```text
//! loop {
//!   select! (biased) {
//!     closing.cancelled() (once) ─► rx.close()           (buffered tasks stay readable)
//!     rx.recv()  ─► Some(task)   ─► forward(task)        (send + SendErrorPolicy)
//!                ─► None         ─► break                (closed and drained)
//!     idle tick  ─► heartbeat diagnostic (running idle count)
//!   }
//! }
//! close_and_recv() exactly once ─► report ─► state = Closed ─► done
//! ```
//!
//! ## Rules
//! - Exactly one worker per uploader: FIFO forwarding order.
//! - A send in flight is never cancelled.
//! - Send failures are reported, never returned; the loop keeps draining.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::diagnostics::{Diagnostic, Diagnostics, Severity};
use crate::error::UploadError;
use crate::policies::SendErrorPolicy;
use crate::uploader::client::StreamClient;
use crate::uploader::shared::Core;
use crate::uploader::state::UploaderState;
use crate::uploader::task::UploadTask;

pub(crate) struct UploadWorker<C: StreamClient, Id> {
    pub(crate) core: Arc<Core<C::Response>>,
    pub(crate) client: C,
    pub(crate) rx: mpsc::Receiver<UploadTask<Id, C::Request>>,
    /// Set after a failure under `SendErrorPolicy::Abort`.
    aborted: bool,
}

impl<C, Id> UploadWorker<C, Id>
where
    C: StreamClient,
    Id: std::fmt::Debug + Send + Sync + 'static,
{
    pub(crate) fn new(
        core: Arc<Core<C::Response>>,
        client: C,
        rx: mpsc::Receiver<UploadTask<Id, C::Request>>,
    ) -> Self {
        Self {
            core,
            client,
            rx,
            aborted: false,
        }
    }

    pub(crate) async fn run(mut self) {
        let core = Arc::clone(&self.core);
        let tick = core.options.config.idle_tick_clamped();
        let mut ticker = time::interval_at(Instant::now() + tick, tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut idle: u64 = 0;
        let mut closing = false;
        tracing::debug!(uploader = %core.name(), "worker started");

        loop {
            tokio::select! {
                biased;
                _ = core.closing.cancelled(), if !closing => {
                    closing = true;
                    self.rx.close();
                    tracing::debug!(uploader = %core.name(), "queue closed, draining");
                }
                next = self.rx.recv() => match next {
                    Some(task) => {
                        self.forward(task).await;
                        ticker.reset();
                    }
                    None => break,
                },
                _ = ticker.tick() => {
                    idle += 1;
                    core.stats.on_idle_tick();
                    core.emit(Diagnostics::from(
                        Diagnostic::debug(format!("uploader {} idle, heartbeat {idle}", core.name()))
                            .with_code("upload_idle"),
                    ))
                    .await;
                }
            }
        }

        let summary = self.close_stream().await;
        core.state.advance(UploaderState::Closed);
        core.done.send_replace(Some(summary));
        tracing::debug!(uploader = %core.name(), "worker exited");
    }

    /// Sends one task, applying the configured [`SendErrorPolicy`] on failure.
    async fn forward(&mut self, task: UploadTask<Id, C::Request>) {
        let core = Arc::clone(&self.core);
        if self.aborted {
            core.stats.on_dropped();
            let d = core.error_diag(
                Severity::Error,
                &UploadError::Aborted,
                format!("task {:?} discarded", task.task_id),
            );
            core.emit(d.into()).await;
            return;
        }

        let policy = core.options.config.on_send_error;
        let mut resend: u32 = 0;
        loop {
            let err = match self.client.send(&task.request).await {
                Ok(()) => {
                    core.stats.on_sent();
                    return;
                }
                Err(err) => err,
            };
            tracing::warn!(
                uploader = %core.name(),
                task_id = ?task.task_id,
                attempt = resend + 1,
                error = %err,
                "stream send failed"
            );

            let resends = policy.resends();
            match policy {
                SendErrorPolicy::Retry { backoff, .. } if resend < resends => {
                    let delay = backoff.next(resend);
                    resend += 1;
                    core.emit(Diagnostics::from(
                        Diagnostic::info(format!(
                            "task {:?} send failed ({err}), resend {resend}/{resends} in {delay:?}",
                            task.task_id
                        ))
                        .with_code("upload_resend"),
                    ))
                    .await;
                    time::sleep(delay).await;
                    continue;
                }
                SendErrorPolicy::Abort => self.aborted = true,
                _ => {}
            }
            core.stats.on_failed();
            let transport = UploadError::Transport {
                error: err.to_string(),
            };
            let d = core.error_diag(
                Severity::Error,
                &transport,
                format!("task {:?} lost", task.task_id),
            );
            core.emit(d.into()).await;
            return;
        }
    }

    /// Closes the stream exactly once and reports the outcome.
    async fn close_stream(&mut self) -> Diagnostics {
        let core = Arc::clone(&self.core);
        let stats = core.stats.snapshot();
        let mut out = Diagnostics::new();

        match self.client.close_and_recv().await {
            Ok(resp) => {
                core.store_response(resp);
                out.push(
                    Diagnostic::info(format!(
                        "uploader {} closed stream: sent={} failed={} dropped={}",
                        core.name(),
                        stats.sent,
                        stats.failed,
                        stats.dropped
                    ))
                    .with_code("upload_closed"),
                );
            }
            Err(err) => {
                tracing::warn!(uploader = %core.name(), error = %err, "stream close failed");
                let transport = UploadError::Transport {
                    error: err.to_string(),
                };
                out.push(core.error_diag(
                    Severity::Error,
                    &transport,
                    format!("uploader {} failed to close stream", core.name()),
                ));
            }
        }

        let out = out.with_origin(Arc::clone(core.name()));
        core.emit(out.clone()).await;
        out
    }
}
