//! # Example: upload_pipeline
//!
//! Wires a root diagnostic channel rendered through `tracing`, a child channel for an
//! indexing job, and a stream uploader pushing records onto an in-memory "remote".
//!
//! ## Flow
//! ```text
//! indexer ──► child.send() ──► root Channel ──► LogSink ──► tracing fmt
//! producers ──► StreamUploader::submit() ──► [queue: 4] ──► worker ──► MemoryStream
//!                                   └─ diagnostics ──► root Channel
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example upload_pipeline
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use diagstream::{
    Channel, ChannelConfig, Diagnostic, Diagnostics, LogSink, SendErrorPolicy, StreamClient,
    StreamUploader, SubmitPolicy,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Fake remote that acknowledges with the number of bytes it received.
struct MemoryStream {
    bytes: usize,
    delay: Duration,
}

#[derive(Debug, thiserror::Error)]
#[error("remote rejected record: {0}")]
struct RemoteError(String);

#[async_trait]
impl StreamClient for MemoryStream {
    type Request = String;
    type Response = usize;
    type Error = RemoteError;

    async fn send(&mut self, request: &String) -> Result<(), RemoteError> {
        tokio::time::sleep(self.delay).await;
        if request.contains("corrupt") {
            return Err(RemoteError(request.clone()));
        }
        self.bytes += request.len();
        Ok(())
    }

    async fn close_and_recv(&mut self) -> Result<usize, RemoteError> {
        Ok(self.bytes)
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let root = Channel::with_config(ChannelConfig::named("pipeline"), Arc::new(LogSink::new()));

    // Background job reporting through its own child channel.
    let indexer = root.make_child_channel();
    let job = tokio::spawn(async move {
        for step in 1..=3 {
            let mut batch = Diagnostics::new();
            batch.add_info(format!("indexed shard {step}/3"));
            if step == 2 {
                batch.push(Diagnostic::warn("shard 2 had stale entries").with_code("stale_shard"));
            }
            if let Err(err) = indexer.send(batch.with_origin("indexer")).await {
                eprintln!("indexer: {err}");
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        indexer.sender_wait_and_close().await;
    });

    let uploader: StreamUploader<MemoryStream, String> = StreamUploader::builder(
        MemoryStream {
            bytes: 0,
            delay: Duration::from_millis(5),
        },
        root.clone(),
    )
    .name("records")
    .queue_capacity(4)
    .idle_tick(Duration::from_millis(200))
    .submit_policy(SubmitPolicy::new(50, Duration::from_millis(10)))
    .on_send_error(SendErrorPolicy::DropAndContinue)
    .build();
    uploader.run_uploader_worker();

    let ctx = CancellationToken::new();
    let mut producers = Vec::new();
    for p in 0..3 {
        let uploader = uploader.clone();
        let ctx = ctx.clone();
        producers.push(tokio::spawn(async move {
            for i in 0..8 {
                let body = if p == 1 && i == 4 {
                    "corrupt".to_string()
                } else {
                    format!("record {p}-{i}")
                };
                let (ok, diags) = uploader.submit(&ctx, format!("{p}-{i}"), body).await;
                if !ok {
                    eprintln!("{diags}");
                }
            }
        }));
    }
    for p in producers {
        let _ = p.await;
    }

    let report = uploader.shutdown_and_wait(&ctx).await;
    println!("shutdown report:\n{report}");
    println!("stats: {:?}", uploader.stats());
    println!("remote acknowledged {:?} bytes", uploader.take_response());

    let _ = job.await;
    root.sender_wait_and_close().await;
    println!("root channel delivered {} batches", root.delivered());
}
