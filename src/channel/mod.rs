//! Diagnostic channels: handle, sink trait and delivery worker.
//!
//! ## Contents
//! - [`Channel`] cloneable producer handle with parent/child composition
//! - [`Sink`] consumer trait (one async `accept(index, &batch)`)
//! - `worker` one delivery task per channel, panic-isolated
//!
//! ## Quick reference
//! ```text
//! Channel::new(sink)            root channel, worker spawned
//! ch.send(batch).await          enqueue to ch and every ancestor
//! ch.make_child_channel()       child forwarding to ch
//! ch.sender_wait_and_close()    producer: done sending, wait for delivery
//! ch.receiver_wait()            consumer: wait for children + drain
//! ```

mod handle;
mod sink;
mod worker;

pub use handle::Channel;
pub use sink::Sink;
