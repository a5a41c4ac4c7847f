//! Retry and failure policies.
//!
//! ## Contents
//! - [`BackoffPolicy`]   how wait delays evolve (first / factor / max + jitter)
//! - [`JitterPolicy`]    randomization on top of a delay
//! - [`SubmitPolicy`]    retry ceiling and wait windows for a full upload queue
//! - [`SendErrorPolicy`] worker reaction to a failed stream send
//!
//! ## Quick wiring
//! ```text
//! UploaderConfig { submit: SubmitPolicy, on_send_error: SendErrorPolicy, .. }
//!      ├─► StreamUploader::submit uses submit.backoff.next(attempt) as the wait window
//!      └─► uploader worker applies on_send_error after a failed send
//! ```
//!
//! ## Defaults
//! - `SubmitPolicy::default()` → 10 000 attempts × constant 1s window.
//! - `SendErrorPolicy::DropAndContinue`.
//! - `JitterPolicy::None`.

mod backoff;
mod jitter;
mod send_error;
mod submit;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
pub use send_error::SendErrorPolicy;
pub use submit::SubmitPolicy;
