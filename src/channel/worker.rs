//! # Per-channel delivery worker.
//!
//! ```text
//! send(batch) ──► [bounded queue] ──► worker ──► sink.accept(index, &batch)
//!                                        └─► panic caught → sink.accept(index, &fatal)
//! ```
//!
//! The worker runs until the queue is closed and empty, then flips the `drained`
//! flag that `sender_wait_and_close` and `receiver_wait` wait on.
//!
//! **Warning**: `AssertUnwindSafe` is used, so a sink that panics while holding a
//! lock on its own state may leave that state inconsistent. Channel bookkeeping is
//! not affected.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::FutureExt;
use tokio::sync::{mpsc, watch};

use crate::channel::sink::Sink;
use crate::diagnostics::{Diagnostic, Diagnostics};

/// One queued batch with the index assigned at send time.
pub(crate) struct Delivery {
    pub index: u64,
    pub batch: Arc<Diagnostics>,
}

pub(crate) struct DeliveryWorker {
    pub channel: Arc<str>,
    pub sink: Arc<dyn Sink>,
    pub rx: mpsc::Receiver<Delivery>,
    pub delivered: Arc<AtomicU64>,
    pub drained: watch::Sender<bool>,
}

impl DeliveryWorker {
    pub(crate) async fn run(mut self) {
        while let Some(Delivery { index, batch }) = self.rx.recv().await {
            let fut = self.sink.accept(index, batch.as_ref());
            if let Err(panic_err) = AssertUnwindSafe(fut).catch_unwind().await {
                let info = panic_message(&*panic_err);
                tracing::error!(
                    channel = %self.channel,
                    sink = self.sink.name(),
                    index,
                    "sink panicked: {info}"
                );
                self.deliver_replacement(index, &info).await;
            }
            self.delivered.fetch_add(1, Ordering::AcqRel);
        }
        tracing::debug!(channel = %self.channel, "delivery worker drained");
        self.drained.send_replace(true);
    }

    /// Hands the sink a fatal batch in place of the one it failed to render.
    async fn deliver_replacement(&self, index: u64, info: &str) {
        let replacement = Diagnostics::from(
            Diagnostic::fatal(format!(
                "sink {} panicked while rendering batch {index}: {info}",
                self.sink.name()
            ))
            .with_origin(Arc::clone(&self.channel))
            .with_code("sink_panicked"),
        );
        let fut = self.sink.accept(index, &replacement);
        if AssertUnwindSafe(fut).catch_unwind().await.is_err() {
            tracing::error!(
                channel = %self.channel,
                sink = self.sink.name(),
                index,
                "sink panicked again on the replacement batch; dropping it"
            );
        }
    }
}

fn panic_message(any: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = any.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = any.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
