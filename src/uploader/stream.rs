//! # StreamUploader: bounded queue in front of one outbound stream.
//!
//! Many producers call [`StreamUploader::submit`]; one worker forwards tasks onto the
//! [`StreamClient`] in enqueue order; [`StreamUploader::shutdown_and_wait`] drains the
//! queue before the stream is closed.
//!
//! ## Architecture
//! ```text
//!   producer 1 ──┐
//!   producer 2 ──┼──► submit(ctx, id, req) ──► [bounded queue] ──► UploadWorker ──► client.send(req)
//!   producer N ──┘        │                                           │
//!                         │ queue full: wait window, info diag        ├─ idle tick ─► heartbeat diag
//!                         │ ctx cancelled / shutdown: error diag      └─ drained ──► client.close_and_recv()
//!                         ▼                                                         │
//!                      Channel ◄──────────────── diagnostics ───────────────────────┘
//! ```
//!
//! ## Shutdown race
//! `shutdown_and_wait` cancels an internal token before the worker closes the queue.
//! Submitters check that token ahead of queue capacity on every attempt, so any
//! submit that starts waiting after shutdown began returns `false`. A submit that had
//! already reserved a slot completes, and its task is drained like any other.
//!
//! ## Example
//! ```rust
//! # use async_trait::async_trait;
//! # use diagstream::StreamClient;
//! # struct Null;
//! # #[async_trait]
//! # impl StreamClient for Null {
//! #     type Request = u32; type Response = (); type Error = std::io::Error;
//! #     async fn send(&mut self, _r: &u32) -> Result<(), std::io::Error> { Ok(()) }
//! #     async fn close_and_recv(&mut self) -> Result<(), std::io::Error> { Ok(()) }
//! # }
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! use diagstream::{Channel, MemorySink, StreamUploader, UploaderState};
//! use tokio_util::sync::CancellationToken;
//!
//! let sink = MemorySink::arc();
//! let channel = Channel::new(sink.clone());
//! let uploader = StreamUploader::builder(Null, channel.clone())
//!     .name("metrics")
//!     .queue_capacity(8)
//!     .build();
//!
//! uploader.run_uploader_worker();
//! let ctx = CancellationToken::new();
//! let (accepted, _) = uploader.submit(&ctx, "task-1", 42).await;
//! assert!(accepted);
//!
//! let report = uploader.shutdown_and_wait(&ctx).await;
//! assert!(!report.has_error());
//! assert_eq!(uploader.state(), UploaderState::Closed);
//!
//! channel.sender_wait_and_close().await;
//! # }
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::channel::Channel;
use crate::config::UploaderConfig;
use crate::diagnostics::{Diagnostic, Diagnostics, Severity};
use crate::error::UploadError;
use crate::uploader::builder::UploaderBuilder;
use crate::uploader::client::StreamClient;
use crate::uploader::shared::{Core, UploaderOptions};
use crate::uploader::state::{UploaderState, UploaderStatsSnapshot};
use crate::uploader::task::UploadTask;
use crate::uploader::worker::UploadWorker;

/// Result of one enqueue attempt.
enum Attempt<'a, T> {
    Reserved(mpsc::Permit<'a, T>),
    Rejected(UploadError),
    WindowElapsed,
}

/// Parts moved into the worker when it starts.
struct Parts<C: StreamClient, Id> {
    client: C,
    rx: mpsc::Receiver<UploadTask<Id, C::Request>>,
}

struct Shared<C: StreamClient, Id> {
    core: Arc<Core<C::Response>>,
    tx: mpsc::Sender<UploadTask<Id, C::Request>>,
    parts: Mutex<Option<Parts<C, Id>>>,
    shutdown_started: AtomicBool,
    /// Set once a `shutdown_and_wait` call has returned the final report.
    report_taken: AtomicBool,
}

/// Cloneable handle to a bounded, single-worker stream uploader.
///
/// Construction does not spawn anything; call [`run_uploader_worker`](Self::run_uploader_worker)
/// inside a Tokio runtime to start forwarding.
pub struct StreamUploader<C: StreamClient, Id> {
    shared: Arc<Shared<C, Id>>,
}

impl<C: StreamClient, Id> Clone for StreamUploader<C, Id> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<C, Id> StreamUploader<C, Id>
where
    C: StreamClient,
    Id: fmt::Debug + Send + Sync + 'static,
{
    /// Creates an idle uploader.
    pub fn new(client: C, options: UploaderOptions) -> Self {
        let (tx, rx) = mpsc::channel(options.config.queue_capacity_clamped());
        Self {
            shared: Arc::new(Shared {
                core: Arc::new(Core::new(options)),
                tx,
                parts: Mutex::new(Some(Parts { client, rx })),
                shutdown_started: AtomicBool::new(false),
                report_taken: AtomicBool::new(false),
            }),
        }
    }

    /// Creates an idle uploader from a config and the channel it reports to.
    pub fn with_config(client: C, config: UploaderConfig, channel: Channel) -> Self {
        Self::new(client, UploaderOptions::new(config, channel))
    }

    /// Starts a builder with default configuration.
    pub fn builder(client: C, channel: Channel) -> UploaderBuilder<C, Id> {
        UploaderBuilder::new(client, channel)
    }

    /// Static configuration and the attached channel.
    pub fn options(&self) -> &UploaderOptions {
        &self.shared.core.options
    }

    /// Current lifecycle state.
    pub fn state(&self) -> UploaderState {
        self.shared.core.state.get()
    }

    /// Counters since creation.
    pub fn stats(&self) -> UploaderStatsSnapshot {
        self.shared.core.stats.snapshot()
    }

    /// Final acknowledgement from `close_and_recv`, once, after the uploader closed.
    pub fn take_response(&self) -> Option<C::Response> {
        self.shared.core.take_response()
    }

    /// Enqueues one task.
    ///
    /// Returns `(true, empty)` once the task is in the queue. Otherwise returns
    /// `(false, diagnostics)` with one error-level entry coded with the
    /// [`UploadError`] label; the same entry is emitted on the channel (without waiting
    /// for room once `ctx` is cancelled).
    ///
    /// ### Flow
    /// 1. Pre-cancelled `ctx` or closing uploader → reject immediately (no retries).
    /// 2. For each attempt `n < max_attempts`, race:
    ///    `ctx` cancelled │ shutdown │ queue slot │ window `backoff.next(n)`.
    /// 3. An elapsed window emits an info "queue full" diagnostic and retries.
    /// 4. All windows elapsed → reject with `RetriesExhausted`.
    pub async fn submit(
        &self,
        ctx: &CancellationToken,
        task_id: Id,
        request: C::Request,
    ) -> (bool, Diagnostics) {
        let core = &self.shared.core;
        if ctx.is_cancelled() {
            return self.reject(ctx, UploadError::Canceled, &task_id).await;
        }
        if core.closing.is_cancelled() {
            return self.reject(ctx, UploadError::ShuttingDown, &task_id).await;
        }

        let policy = core.options.config.submit;
        let attempts = policy.attempts_clamped();
        for attempt in 0..attempts {
            let window = policy.backoff.next(attempt);
            let outcome = tokio::select! {
                biased;
                _ = ctx.cancelled() => Attempt::Rejected(UploadError::Canceled),
                _ = core.closing.cancelled() => Attempt::Rejected(UploadError::ShuttingDown),
                permit = self.shared.tx.reserve() => match permit {
                    Ok(permit) => Attempt::Reserved(permit),
                    Err(_) => Attempt::Rejected(UploadError::QueueClosed),
                },
                _ = time::sleep(window) => Attempt::WindowElapsed,
            };

            match outcome {
                Attempt::Reserved(permit) => {
                    permit.send(UploadTask::new(task_id, request));
                    core.stats.on_submitted();
                    return (true, Diagnostics::new());
                }
                Attempt::Rejected(err) => return self.reject(ctx, err, &task_id).await,
                Attempt::WindowElapsed => {
                    core.stats.on_retry();
                    core.emit(Diagnostics::from(
                        Diagnostic::info(format!(
                            "queue full, task {task_id:?} waiting (attempt {}/{attempts})",
                            attempt + 1
                        ))
                        .with_code("upload_queue_full"),
                    ))
                    .await;
                }
            }
        }

        self.reject(ctx, UploadError::RetriesExhausted { attempts }, &task_id)
            .await
    }

    /// Counts and reports a rejection. A cancelled `ctx` never waits on the channel.
    async fn reject(
        &self,
        ctx: &CancellationToken,
        err: UploadError,
        task_id: &Id,
    ) -> (bool, Diagnostics) {
        let core = &self.shared.core;
        core.stats.on_rejected();
        tracing::debug!(uploader = %core.name(), task_id = ?task_id, reason = err.as_label(), "submit rejected");

        let batch = Diagnostics::from(core.error_diag(
            Severity::Error,
            &err,
            format!("task {task_id:?} not accepted"),
        ))
        .with_origin(Arc::clone(core.name()));
        if ctx.is_cancelled() {
            core.try_emit(batch.clone());
        } else {
            core.emit(batch.clone()).await;
        }
        (false, batch)
    }

    /// Starts the single worker (fire-and-forget).
    ///
    /// A second call does not spawn another consumer; it emits a warning diagnostic.
    /// Must be called inside a Tokio runtime.
    pub fn run_uploader_worker(&self) {
        if self.start_worker() {
            return;
        }
        let core = Arc::clone(&self.shared.core);
        let err = if core.state.get() >= UploaderState::Draining {
            UploadError::ShuttingDown
        } else {
            UploadError::AlreadyRunning
        };
        tracing::warn!(uploader = %core.name(), reason = err.as_label(), "worker not started");
        tokio::spawn(async move {
            let d = core.error_diag(Severity::Warn, &err, "run_uploader_worker ignored".to_string());
            core.emit(d.into()).await;
        });
    }

    /// Spawns the worker if it has not been spawned yet. Returns `true` if it did.
    fn start_worker(&self) -> bool {
        let parts = self
            .shared
            .parts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(Parts { client, rx }) = parts else {
            return false;
        };

        let core = Arc::clone(&self.shared.core);
        core.state.advance(UploaderState::Running);
        tokio::spawn(UploadWorker::<C, Id>::new(core, client, rx).run());
        true
    }

    /// Closes the queue, waits for the worker to drain it and close the stream.
    ///
    /// Returns the worker's final diagnostics (stream close outcome) to the first call
    /// that observes completion. An uploader that was never started is started here so
    /// buffered tasks are still forwarded.
    ///
    /// ### Edge cases
    /// - `ctx` cancelled before the worker finishes: error `upload_shutdown_canceled`;
    ///   the worker keeps draining in the background. Calling again waits for the rest
    ///   and returns the final report.
    /// - Call after the report was already returned: warning `upload_already_shut_down`.
    /// - Concurrent calls: one receives the report, the others return empty.
    pub async fn shutdown_and_wait(&self, ctx: &CancellationToken) -> Diagnostics {
        let core = &self.shared.core;
        let first = !self.shared.shutdown_started.swap(true, Ordering::AcqRel);
        let mut out = Diagnostics::new();

        if first {
            tracing::debug!(uploader = %core.name(), "shutdown requested");
            core.state.advance(UploaderState::Draining);
            // Cancel first: blocked submitters must observe shutdown before a slot frees.
            core.closing.cancel();
            self.start_worker();
        } else if self.shared.report_taken.load(Ordering::Acquire) {
            let d = core.error_diag(
                Severity::Warn,
                &UploadError::AlreadyShutDown,
                "shutdown_and_wait called again".to_string(),
            );
            let batch = Diagnostics::from(d).with_origin(Arc::clone(core.name()));
            core.emit(batch.clone()).await;
            out.extend(batch);
            return out;
        }

        let mut done = core.done.subscribe();
        let finished = tokio::select! {
            biased;
            res = done.wait_for(Option::is_some) => {
                Some(res.ok().and_then(|summary| summary.clone()).unwrap_or_default())
            }
            _ = ctx.cancelled() => None,
        };

        match finished {
            Some(summary) => {
                if !self.shared.report_taken.swap(true, Ordering::AcqRel) {
                    out.extend(summary);
                }
            }
            None => {
                let d = core.error_diag(
                    Severity::Error,
                    &UploadError::ShutdownCanceled,
                    format!("uploader {} still draining", core.name()),
                );
                let batch = Diagnostics::from(d).with_origin(Arc::clone(core.name()));
                core.try_emit(batch.clone());
                out.extend(batch);
            }
        }
        out
    }
}

impl<C: StreamClient, Id> fmt::Debug for StreamUploader<C, Id> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = &self.shared.core;
        f.debug_struct("StreamUploader")
            .field("name", core.name())
            .field("state", &core.state.get())
            .field("stats", &core.stats.snapshot())
            .finish()
    }
}
