//! Error types used by diagnostic channels and stream uploaders.
//!
//! This module defines two main error enums:
//!
//! - [`ChannelError`]: misuse of a diagnostic [`Channel`](crate::Channel).
//! - [`UploadError`]: failures observed by a [`StreamUploader`](crate::StreamUploader).
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging/metrics.
//! Upload errors are never returned as `Err` from the uploader's public surface;
//! they are turned into [`Diagnostic`](crate::Diagnostic)s whose `code` is the label.

use std::sync::Arc;

use thiserror::Error;

/// # Errors produced by a diagnostic channel.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// A batch was sent after the channel (or the ancestor it forwards to) was closed for writes.
    ///
    /// This is a producer bug: the batch is rejected instead of being dropped silently.
    #[error("channel {channel:?} is closed for writes")]
    Closed {
        /// Name of the channel that rejected the batch.
        channel: Arc<str>,
    },

    /// A non-blocking send found a queue in the chain saturated (or held by another send).
    #[error("channel {channel:?} is full")]
    Full {
        /// Name of the channel that had no room.
        channel: Arc<str>,
    },
}

impl ChannelError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use diagstream::ChannelError;
    ///
    /// let err = ChannelError::Closed { channel: "root".into() };
    /// assert_eq!(err.as_label(), "channel_closed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ChannelError::Closed { .. } => "channel_closed",
            ChannelError::Full { .. } => "channel_full",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ChannelError::Closed { channel } => format!("send after close on channel={channel}"),
            ChannelError::Full { channel } => format!("no room on channel={channel}"),
        }
    }
}

/// # Errors observed by a stream uploader.
///
/// Submission errors (`Canceled`, `ShuttingDown`, `QueueClosed`, `RetriesExhausted`)
/// mean the task was not accepted. Transport errors mean an accepted task was lost.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    /// The caller's context was cancelled before the task could be enqueued.
    #[error("submit cancelled by caller context")]
    Canceled,

    /// The uploader is draining or closed; no new tasks are accepted.
    #[error("uploader is shutting down")]
    ShuttingDown,

    /// The queue was closed while waiting for capacity.
    #[error("upload queue closed")]
    QueueClosed,

    /// The queue stayed full for every allowed attempt.
    #[error("upload queue full after {attempts} attempts")]
    RetriesExhausted {
        /// Number of attempts made before giving up.
        attempts: u32,
    },

    /// A worker is already consuming this uploader's queue.
    #[error("uploader worker already running")]
    AlreadyRunning,

    /// `shutdown_and_wait` was called more than once.
    #[error("uploader already shut down")]
    AlreadyShutDown,

    /// The shutdown wait was cancelled before the worker finished draining.
    #[error("shutdown wait cancelled before the worker finished")]
    ShutdownCanceled,

    /// The stream client rejected a send or the final close.
    #[error("transport error: {error}")]
    Transport {
        /// The underlying error message.
        error: String,
    },

    /// The worker stopped forwarding after a send failure; the task was discarded.
    #[error("forwarding aborted after an earlier send failure")]
    Aborted,
}

impl UploadError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use diagstream::UploadError;
    ///
    /// let err = UploadError::RetriesExhausted { attempts: 3 };
    /// assert_eq!(err.as_label(), "upload_retries_exhausted");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            UploadError::Canceled => "upload_canceled",
            UploadError::ShuttingDown => "upload_shutting_down",
            UploadError::QueueClosed => "upload_queue_closed",
            UploadError::RetriesExhausted { .. } => "upload_retries_exhausted",
            UploadError::AlreadyRunning => "upload_worker_already_running",
            UploadError::AlreadyShutDown => "upload_already_shut_down",
            UploadError::ShutdownCanceled => "upload_shutdown_canceled",
            UploadError::Transport { .. } => "upload_transport",
            UploadError::Aborted => "upload_aborted",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            UploadError::Transport { error } => format!("transport: {error}"),
            UploadError::RetriesExhausted { attempts } => {
                format!("queue still full after {attempts} attempts")
            }
            other => other.to_string(),
        }
    }

    /// Indicates whether the task may be accepted if submitted again later.
    ///
    /// Only back-pressure (`RetriesExhausted`) and caller cancellation are transient;
    /// a draining or closed uploader never accepts again.
    ///
    /// # Example
    /// ```
    /// use diagstream::UploadError;
    ///
    /// assert!(UploadError::RetriesExhausted { attempts: 1 }.is_transient());
    /// assert!(!UploadError::ShuttingDown.is_transient());
    /// ```
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            UploadError::RetriesExhausted { .. } | UploadError::Canceled
        )
    }
}
