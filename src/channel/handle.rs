//! # Hierarchical diagnostic channel.
//!
//! [`Channel`] moves [`Diagnostics`] batches from any number of producers to one
//! [`Sink`]. Channels can spawn children; a child delivers to its own sink **and**
//! forwards every batch to each ancestor, which assigns its own index.
//!
//! ## Architecture
//! ```text
//!   producer A ──┐                        ┌──► root worker ──► root sink
//!   producer B ──┼─► root.send(batch) ────┤
//!                │                        │
//!   subsystem ───┴─► child.send(batch) ───┼──► child worker ──► child sink
//!                                         └──► root queue (forwarded, root index)
//! ```
//!
//! ## Shutdown protocol
//! - Producer side: [`Channel::sender_wait_and_close`] waits for open children, closes
//!   writes, waits until every queued batch reached the sink.
//! - Consumer side: [`Channel::receiver_wait`] waits until children are closed, the
//!   channel is closed and the queue is drained.
//! - Dropping the last handle of an unclosed child releases it from the parent; its
//!   batches were already forwarded at send time.
//!
//! ## Rules
//! - `send` after close fails with [`ChannelError::Closed`] and is logged at error level.
//! - A send is all-or-nothing across the chain: every queue is checked and reserved
//!   before the batch is handed to any of them.
//! - Indices are assigned under the ingress lock: callback order == index order.
//! - A batch is shared (`Arc`) across the hierarchy, never split or merged.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::sync::{Mutex, mpsc, watch};

use crate::channel::sink::{Discard, Sink};
use crate::channel::worker::{Delivery, DeliveryWorker};
use crate::config::ChannelConfig;
use crate::diagnostics::Diagnostics;
use crate::error::ChannelError;
use crate::sinks::FnSink;

/// Write side of the queue plus the next index to hand out.
struct Ingress {
    tx: Option<mpsc::Sender<Delivery>>,
    next_index: u64,
}

struct Inner {
    name: Arc<str>,
    ingress: Mutex<Ingress>,
    /// Number of children that have not closed yet.
    children: watch::Sender<usize>,
    /// Counter used to derive default child names.
    spawned_children: AtomicU64,
    drained: watch::Receiver<bool>,
    delivered: Arc<AtomicU64>,
    write_closed: AtomicBool,
    /// Set once the parent has been told this channel is done.
    released: AtomicBool,
    parent: Option<Channel>,
}

impl Inner {
    fn closed_error(&self) -> ChannelError {
        ChannelError::Closed {
            channel: Arc::clone(&self.name),
        }
    }

    fn full_error(&self) -> ChannelError {
        ChannelError::Full {
            channel: Arc::clone(&self.name),
        }
    }

    fn release_parent(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(parent) = &self.parent {
            parent.inner.children.send_modify(|n| *n = n.saturating_sub(1));
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.release_parent();
    }
}

/// Cloneable handle to a diagnostic channel.
///
/// All clones share the same queue, counter and sink. Construction spawns the
/// delivery worker, so it must happen inside a Tokio runtime.
#[derive(Clone)]
pub struct Channel {
    inner: Arc<Inner>,
}

impl Channel {
    /// Creates a root channel with the default [`ChannelConfig`].
    pub fn new(sink: Arc<dyn Sink>) -> Self {
        Self::with_config(ChannelConfig::default(), sink)
    }

    /// Creates a root channel with an explicit configuration.
    pub fn with_config(cfg: ChannelConfig, sink: Arc<dyn Sink>) -> Self {
        Self::spawn(cfg, sink, None, false)
    }

    /// Creates a root channel whose sink is a plain closure.
    ///
    /// ```rust
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// use diagstream::{Channel, Diagnostic, Diagnostics};
    ///
    /// let ch = Channel::from_fn(|index, batch: &Diagnostics| println!("{index}: {batch}"));
    /// ch.send(Diagnostics::from(Diagnostic::info("hello"))).await.unwrap();
    /// ch.sender_wait_and_close().await;
    /// assert_eq!(ch.delivered(), 1);
    /// # }
    /// ```
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(u64, &Diagnostics) + Send + Sync + 'static,
    {
        Self::new(FnSink::arc("fn", f))
    }

    /// Spawns the delivery worker. A `closed` channel starts with writes already shut.
    fn spawn(cfg: ChannelConfig, sink: Arc<dyn Sink>, parent: Option<Channel>, closed: bool) -> Self {
        let (tx, rx) = mpsc::channel(cfg.queue_capacity_clamped());
        let (drained_tx, drained_rx) = watch::channel(false);
        let (children, _) = watch::channel(0usize);
        let delivered = Arc::new(AtomicU64::new(0));

        let worker = DeliveryWorker {
            channel: Arc::clone(&cfg.name),
            sink,
            rx,
            delivered: Arc::clone(&delivered),
            drained: drained_tx,
        };
        tokio::spawn(worker.run());

        Self {
            inner: Arc::new(Inner {
                name: cfg.name,
                ingress: Mutex::new(Ingress {
                    tx: (!closed).then_some(tx),
                    next_index: 0,
                }),
                children,
                spawned_children: AtomicU64::new(0),
                drained: drained_rx,
                delivered,
                write_closed: AtomicBool::new(closed),
                released: AtomicBool::new(closed),
                parent,
            }),
        }
    }

    /// Sends one batch to this channel's sink and to every ancestor.
    ///
    /// Waits for queue room when the channel (or an ancestor) is saturated. Each call
    /// is atomic: either every channel in the chain gets the batch or none does, and
    /// concurrent producers interleave whole batches only. Dropping the future before
    /// it resolves sends nothing.
    ///
    /// ### Errors
    /// [`ChannelError::Closed`] if this channel or an ancestor is closed for writes.
    pub async fn send(&self, batch: Diagnostics) -> Result<(), ChannelError> {
        // Locks are taken child to root, the same order for every sender.
        let mut locked = Vec::new();
        for ch in self.chain() {
            let ingress = ch.inner.ingress.lock().await;
            if ingress.tx.is_none() {
                return Err(self.rejected(ch));
            }
            locked.push((ch, ingress));
        }

        let mut permits = Vec::with_capacity(locked.len());
        for (ch, ingress) in &locked {
            let Some(tx) = ingress.tx.as_ref() else {
                return Err(self.rejected(ch));
            };
            match tx.reserve().await {
                Ok(permit) => permits.push((ingress.next_index, permit)),
                Err(_) => return Err(self.rejected(ch)),
            }
        }

        commit(permits, Arc::new(batch));
        for (_, ingress) in &mut locked {
            ingress.next_index += 1;
        }
        Ok(())
    }

    /// Non-blocking [`send`](Self::send).
    ///
    /// ### Errors
    /// - [`ChannelError::Full`] when a queue in the chain has no room or another send
    ///   currently holds it; nothing is delivered.
    /// - [`ChannelError::Closed`] as for `send`.
    pub fn try_send(&self, batch: Diagnostics) -> Result<(), ChannelError> {
        let mut locked = Vec::new();
        for ch in self.chain() {
            let Ok(ingress) = ch.inner.ingress.try_lock() else {
                return Err(ch.inner.full_error());
            };
            if ingress.tx.is_none() {
                return Err(self.rejected(ch));
            }
            locked.push((ch, ingress));
        }

        let mut permits = Vec::with_capacity(locked.len());
        for (ch, ingress) in &locked {
            let Some(tx) = ingress.tx.as_ref() else {
                return Err(self.rejected(ch));
            };
            match tx.try_reserve() {
                Ok(permit) => permits.push((ingress.next_index, permit)),
                Err(mpsc::error::TrySendError::Full(())) => return Err(ch.inner.full_error()),
                Err(mpsc::error::TrySendError::Closed(())) => return Err(self.rejected(ch)),
            }
        }

        commit(permits, Arc::new(batch));
        for (_, ingress) in &mut locked {
            ingress.next_index += 1;
        }
        Ok(())
    }

    /// This channel, then each ancestor up to the root.
    fn chain(&self) -> impl Iterator<Item = &Channel> {
        std::iter::successors(Some(self), |ch| ch.inner.parent.as_ref())
    }

    fn rejected(&self, at: &Channel) -> ChannelError {
        tracing::error!(
            channel = %at.inner.name,
            origin = %self.inner.name,
            "batch sent after close; this is a producer bug"
        );
        at.inner.closed_error()
    }

    /// Creates a forward-only child: its batches reach every ancestor's sink.
    pub fn make_child_channel(&self) -> Channel {
        self.make_child_channel_with(self.child_config(), Arc::new(Discard))
    }

    /// Creates a child with its own sink in addition to forwarding to ancestors.
    ///
    /// Under a channel that is already closed (itself or an ancestor) the child starts
    /// closed: every `send` on it fails and it does not count as an open child.
    pub fn make_child_channel_with(&self, cfg: ChannelConfig, sink: Arc<dyn Sink>) -> Channel {
        if self.chain().any(Channel::is_closed) {
            tracing::error!(
                channel = %self.inner.name,
                child = %cfg.name,
                "child created under a closed channel; it starts closed"
            );
            return Self::spawn(cfg, sink, Some(self.clone()), true);
        }
        self.inner.children.send_modify(|n| *n += 1);
        Self::spawn(cfg, sink, Some(self.clone()), false)
    }

    fn child_config(&self) -> ChannelConfig {
        let n = self.inner.spawned_children.fetch_add(1, Ordering::Relaxed);
        ChannelConfig::named(format!("{}/{n}", self.inner.name))
    }

    /// Producer-side completion: no more batches will be sent.
    ///
    /// 1. Waits until every child has closed (children forward into this queue).
    /// 2. Closes the channel for writes.
    /// 3. Waits until the sink has received every queued batch.
    ///
    /// Calling it again is a no-op that waits on the same drain.
    pub async fn sender_wait_and_close(&self) {
        self.wait_children().await;
        {
            let mut ingress = self.inner.ingress.lock().await;
            if ingress.tx.take().is_some() {
                tracing::debug!(channel = %self.inner.name, sent = ingress.next_index, "closed for writes");
            }
            self.inner.write_closed.store(true, Ordering::Release);
        }
        self.wait_drained().await;
        self.inner.release_parent();
    }

    /// Consumer-side completion: waits until children and this channel are closed and
    /// every batch reached the sink.
    pub async fn receiver_wait(&self) {
        self.wait_children().await;
        self.wait_drained().await;
    }

    async fn wait_children(&self) {
        let mut rx = self.inner.children.subscribe();
        let _ = rx.wait_for(|open| *open == 0).await;
    }

    async fn wait_drained(&self) {
        let mut rx = self.inner.drained.clone();
        // Err means the worker is gone, which also means nothing is left to deliver.
        let _ = rx.wait_for(|drained| *drained).await;
    }

    /// Channel name (children default to `parent/N`).
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// `true` once `sender_wait_and_close` has closed writes.
    pub fn is_closed(&self) -> bool {
        self.inner.write_closed.load(Ordering::Acquire)
    }

    /// Number of batches handed to the sink so far.
    pub fn delivered(&self) -> u64 {
        self.inner.delivered.load(Ordering::Acquire)
    }

    /// Number of children that have not closed yet.
    pub fn open_children(&self) -> usize {
        *self.inner.children.borrow()
    }
}

/// Hands every reserved slot the same batch under its channel's index.
fn commit(permits: Vec<(u64, mpsc::Permit<'_, Delivery>)>, batch: Arc<Diagnostics>) {
    for (index, permit) in permits {
        permit.send(Delivery {
            index,
            batch: Arc::clone(&batch),
        });
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("name", &self.inner.name)
            .field("closed", &self.is_closed())
            .field("delivered", &self.delivered())
            .field("parent", &self.inner.parent.as_ref().map(Channel::name))
            .finish()
    }
}
