//! # Transport stream abstraction.
//!
//! [`StreamClient`] is the only thing the uploader needs from the wire: push one more
//! message on an open stream, then close it and read the final acknowledgement.
//! gRPC client-streaming calls, framed sockets and message-queue producers all fit.
//!
//! The worker owns the client exclusively, so implementations need no locking.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use diagstream::StreamClient;
//!
//! struct Stdout { lines: usize }
//!
//! #[async_trait]
//! impl StreamClient for Stdout {
//!     type Request = String;
//!     type Response = usize;
//!     type Error = std::io::Error;
//!
//!     async fn send(&mut self, request: &String) -> Result<(), std::io::Error> {
//!         println!("{request}");
//!         self.lines += 1;
//!         Ok(())
//!     }
//!
//!     async fn close_and_recv(&mut self) -> Result<usize, std::io::Error> {
//!         Ok(self.lines)
//!     }
//! }
//! ```

use async_trait::async_trait;

/// Outbound stream the uploader forwards tasks onto.
#[async_trait]
pub trait StreamClient: Send + 'static {
    /// One message on the stream.
    type Request: Send + Sync + 'static;
    /// Final acknowledgement returned when the stream is closed.
    type Response: Send + 'static;
    /// Transport failure.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Sends one message. Never cancelled mid-flight by the uploader.
    ///
    /// Takes the request by reference so a failed send can be retried.
    async fn send(&mut self, request: &Self::Request) -> Result<(), Self::Error>;

    /// Signals end-of-stream and waits for the peer's response. Called exactly once.
    async fn close_and_recv(&mut self) -> Result<Self::Response, Self::Error>;
}
