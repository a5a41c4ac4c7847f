//! Reliable streaming upload under backpressure.
//!
//! ## Contents
//! - [`StreamClient`] transport seam: `send` per request, `close_and_recv` once
//! - [`UploadTask`] one `(task_id, request)` pair
//! - [`StreamUploader`] cloneable handle: submit / run worker / shutdown
//! - [`UploaderBuilder`] non-default configuration
//! - [`UploaderState`], [`UploaderStatsSnapshot`] observability
//! - `worker` the single queue consumer
//!
//! ## Quick reference
//! ```text
//! StreamUploader::builder(client, channel).build()
//! up.run_uploader_worker()           spawn the one consumer
//! up.submit(&ctx, id, req).await     (accepted, diagnostics)
//! up.shutdown_and_wait(&ctx).await   drain, close stream, final diagnostics
//! up.take_response()                 acknowledgement from close_and_recv
//! ```

mod builder;
mod client;
mod shared;
mod state;
mod stream;
mod task;
mod worker;

pub use builder::UploaderBuilder;
pub use client::StreamClient;
pub use shared::UploaderOptions;
pub use state::{UploaderState, UploaderStatsSnapshot};
pub use stream::StreamUploader;
pub use task::UploadTask;
