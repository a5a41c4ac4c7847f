//! # diagstream
//!
//! **diagstream** moves two kinds of traffic out of long-running async work:
//! diagnostics (progress, warnings, errors) to whoever is watching, and bulk records
//! onto a persistent outbound stream under backpressure.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!    background op #1        background op #2           producers (N)
//!          │                        │                        │
//!          │ child.send(batch)      │ root.send(batch)       │ submit(ctx, id, req)
//!          ▼                        ▼                        ▼
//!  ┌───────────────┐        ┌───────────────┐        ┌──────────────────┐
//!  │ child Channel │──fwd──►│ root Channel  │◄─diag──│  StreamUploader  │
//!  │ (own index)   │        │ (own index)   │        │ [bounded queue]  │
//!  └──────┬────────┘        └──────┬────────┘        └────────┬─────────┘
//!         ▼                        ▼                          ▼
//!   delivery worker          delivery worker             UploadWorker
//!         ▼                        ▼                          ▼
//!   child Sink::accept       root Sink::accept         StreamClient::send
//!                          (LogSink, MemorySink, ...)  StreamClient::close_and_recv
//! ```
//!
//! ### Lifecycle
//! ```text
//! Channel::new(sink) ─► send(batch)* ─► sender_wait_and_close() ─► receiver_wait()
//!
//! StreamUploader: Idle ─► run_uploader_worker() ─► Running
//!   ├─► submit(): queue slot │ wait window (info diag) │ ctx cancelled │ shutdown
//!   └─► shutdown_and_wait(): Draining ─► drain queue ─► close_and_recv() once ─► Closed
//! ```
//!
//! ## Features
//! | Area            | Description                                                 | Key types / traits                         |
//! |-----------------|-------------------------------------------------------------|--------------------------------------------|
//! | **Diagnostics** | Severity-tagged records grouped into atomic batches.        | [`Diagnostic`], [`Diagnostics`]            |
//! | **Channels**    | Ordered, indexed, hierarchical delivery to a sink.          | [`Channel`], [`Sink`]                      |
//! | **Uploads**     | Bounded FIFO in front of one outbound stream.               | [`StreamUploader`], [`StreamClient`]       |
//! | **Policies**    | Submit wait windows, send-error handling, backoff, jitter.  | [`SubmitPolicy`], [`SendErrorPolicy`]      |
//! | **Errors**      | Typed errors; labels double as diagnostic codes.            | [`ChannelError`], [`UploadError`]          |
//! | **Configuration** | Plain structs with defaults.                              | [`ChannelConfig`], [`UploaderConfig`]      |
//!
//! ## Optional features
//! - `logging` (default): exports [`LogSink`], which renders batches through `tracing`.
//!
//! ## Example
//! ```rust
//! use diagstream::{Channel, Diagnostics, MemorySink};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), diagstream::ChannelError> {
//!     let sink = MemorySink::arc();
//!     let root = Channel::new(sink.clone());
//!     let child = root.make_child_channel();
//!
//!     child.send(Diagnostics::new().with(diagstream::Diagnostic::info("indexing"))).await?;
//!     root.send(Diagnostics::new().with(diagstream::Diagnostic::warn("slow disk"))).await?;
//!
//!     child.sender_wait_and_close().await;
//!     root.sender_wait_and_close().await;
//!
//!     assert_eq!(sink.indices(), vec![0, 1]);
//!     Ok(())
//! }
//! ```

mod channel;
mod config;
mod diagnostics;
mod error;
mod policies;
mod sinks;
mod uploader;

// ---- Public re-exports ----

pub use channel::{Channel, Sink};
pub use config::{ChannelConfig, UploaderConfig};
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::{ChannelError, UploadError};
pub use policies::{BackoffPolicy, JitterPolicy, SendErrorPolicy, SubmitPolicy};
pub use sinks::{FnSink, MemorySink};
pub use uploader::{
    StreamClient, StreamUploader, UploadTask, UploaderBuilder, UploaderOptions, UploaderState,
    UploaderStatsSnapshot,
};

// Optional: built-in sink that renders batches through `tracing`.
// Enabled by default; disable with `--no-default-features`.
#[cfg(feature = "logging")]
pub use sinks::LogSink;
