//! Common test utilities: a recording fake stream and channel helpers.

#![allow(dead_code)] // Not every helper is used by every test file

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use diagstream::{Channel, ChannelConfig, Diagnostic, Diagnostics, MemorySink, Sink, StreamClient};
use tokio::sync::{Notify, Semaphore};

/// What the fake stream observed, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Send(u32),
    Failed(u32),
    Close,
}

#[derive(Debug, thiserror::Error)]
#[error("fake transport: {0}")]
pub struct FakeError(pub String);

/// In-memory `StreamClient` that records every call.
///
/// - `fail(req, n)`: the next `n` sends of `req` fail (`u32::MAX` = always)
/// - `gated()`: every send waits for a permit on `gate`
/// - `fail_close()`: `close_and_recv` returns an error
pub struct RecordingClient {
    pub events: Arc<Mutex<Vec<Event>>>,
    failures: Arc<Mutex<HashMap<u32, u32>>>,
    gate: Option<Arc<Semaphore>>,
    fail_close: bool,
    sent: usize,
}

impl RecordingClient {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            failures: Arc::new(Mutex::new(HashMap::new())),
            gate: None,
            fail_close: false,
            sent: 0,
        }
    }

    pub fn fail(self, request: u32, times: u32) -> Self {
        self.failures.lock().unwrap().insert(request, times);
        self
    }

    /// Returns the client and the semaphore that releases its sends.
    pub fn gated(mut self) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        self.gate = Some(Arc::clone(&gate));
        (self, gate)
    }

    pub fn fail_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub fn log(&self) -> Arc<Mutex<Vec<Event>>> {
        Arc::clone(&self.events)
    }
}

#[async_trait]
impl StreamClient for RecordingClient {
    type Request = u32;
    type Response = usize;
    type Error = FakeError;

    async fn send(&mut self, request: &u32) -> Result<(), FakeError> {
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        let should_fail = {
            let mut failures = self.failures.lock().unwrap();
            match failures.get_mut(request) {
                Some(left) if *left > 0 => {
                    if *left != u32::MAX {
                        *left -= 1;
                    }
                    true
                }
                _ => false,
            }
        };
        if should_fail {
            self.events.lock().unwrap().push(Event::Failed(*request));
            return Err(FakeError(format!("request {request} rejected")));
        }
        self.events.lock().unwrap().push(Event::Send(*request));
        self.sent += 1;
        Ok(())
    }

    async fn close_and_recv(&mut self) -> Result<usize, FakeError> {
        self.events.lock().unwrap().push(Event::Close);
        if self.fail_close {
            return Err(FakeError("stream reset".into()));
        }
        Ok(self.sent)
    }
}

/// Sink that takes one `gate` permit per batch before recording it.
///
/// `entered` fires each time a batch reaches the sink, before the gate.
pub struct GatedSink {
    pub inner: MemorySink,
    pub gate: Arc<Semaphore>,
    pub entered: Arc<Notify>,
}

impl GatedSink {
    pub fn arc() -> Arc<Self> {
        Arc::new(Self {
            inner: MemorySink::new(),
            gate: Arc::new(Semaphore::new(0)),
            entered: Arc::new(Notify::new()),
        })
    }
}

#[async_trait]
impl Sink for GatedSink {
    async fn accept(&self, index: u64, batch: &Diagnostics) {
        self.entered.notify_one();
        self.gate.acquire().await.unwrap().forget();
        self.inner.accept(index, batch).await;
    }

    fn name(&self) -> &'static str {
        "gated"
    }
}

/// Root channel with a single-slot queue in front of a [`GatedSink`].
pub fn gated_channel() -> (Channel, Arc<GatedSink>) {
    let sink = GatedSink::arc();
    let channel = Channel::with_config(
        ChannelConfig {
            queue_capacity: 1,
            ..ChannelConfig::named("gated")
        },
        sink.clone(),
    );
    (channel, sink)
}

/// Root channel recording into a fresh [`MemorySink`].
pub fn recording_channel() -> (Channel, Arc<MemorySink>) {
    let sink = MemorySink::arc();
    let channel = Channel::with_config(ChannelConfig::named("test"), sink.clone());
    (channel, sink)
}

/// Diagnostics in `sink` carrying `code`.
pub fn with_code(sink: &MemorySink, code: &str) -> Vec<Diagnostic> {
    sink.diagnostics()
        .into_iter()
        .filter(|d| d.code == Some(code))
        .collect()
}

pub fn events(log: &Arc<Mutex<Vec<Event>>>) -> Vec<Event> {
    log.lock().unwrap().clone()
}

/// Short window so exhaustion tests stay fast.
pub fn short_window() -> Duration {
    Duration::from_millis(20)
}
