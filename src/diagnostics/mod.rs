//! Diagnostic data model.
//!
//! ## Contents
//! - [`Severity`] trace → fatal ordering
//! - [`Diagnostic`] one immutable record (severity, message, origin, code, timestamp)
//! - [`Diagnostics`] an ordered batch produced atomically by one operation

mod batch;
mod diagnostic;

pub use batch::Diagnostics;
pub use diagnostic::{Diagnostic, Severity};
