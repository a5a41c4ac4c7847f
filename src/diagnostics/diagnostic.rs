//! # Single diagnostic records.
//!
//! A [`Diagnostic`] is one reported fact: a [`Severity`], a formatted message,
//! and optional metadata naming where it came from.
//!
//! ## Example
//! ```rust
//! use diagstream::{Diagnostic, Severity};
//!
//! let d = Diagnostic::warn("disk almost full")
//!     .with_origin("installer")
//!     .with_code("disk_low");
//!
//! assert_eq!(d.severity, Severity::Warn);
//! assert_eq!(d.origin.as_deref(), Some("installer"));
//! assert_eq!(d.code, Some("disk_low"));
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

/// Severity of a diagnostic, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Severity {
    /// Returns the lowercase name used in rendered output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "trace",
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        }
    }

    /// `true` for `Error` and `Fatal`.
    #[inline]
    pub fn is_error(&self) -> bool {
        *self >= Severity::Error
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One leveled, human-readable status record.
///
/// Immutable once built; the `with_*` builders consume and return `self`.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// How severe the record is.
    pub severity: Severity,
    /// Formatted message.
    pub message: Arc<str>,
    /// Component that produced the record, if known.
    pub origin: Option<Arc<str>>,
    /// Stable machine-readable code (usually an error label).
    pub code: Option<&'static str>,
    /// Wall-clock creation time.
    pub at: SystemTime,
}

impl Diagnostic {
    /// Creates a diagnostic with the given severity and message.
    pub fn new(severity: Severity, message: impl Into<Arc<str>>) -> Self {
        Self {
            severity,
            message: message.into(),
            origin: None,
            code: None,
            at: SystemTime::now(),
        }
    }

    #[inline]
    pub fn trace(message: impl Into<Arc<str>>) -> Self {
        Self::new(Severity::Trace, message)
    }

    #[inline]
    pub fn debug(message: impl Into<Arc<str>>) -> Self {
        Self::new(Severity::Debug, message)
    }

    #[inline]
    pub fn info(message: impl Into<Arc<str>>) -> Self {
        Self::new(Severity::Info, message)
    }

    #[inline]
    pub fn warn(message: impl Into<Arc<str>>) -> Self {
        Self::new(Severity::Warn, message)
    }

    #[inline]
    pub fn error(message: impl Into<Arc<str>>) -> Self {
        Self::new(Severity::Error, message)
    }

    #[inline]
    pub fn fatal(message: impl Into<Arc<str>>) -> Self {
        Self::new(Severity::Fatal, message)
    }

    /// Attaches the originating component name.
    #[inline]
    pub fn with_origin(mut self, origin: impl Into<Arc<str>>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Attaches a stable code.
    #[inline]
    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.severity)?;
        if let Some(origin) = &self.origin {
            write!(f, " {origin}:")?;
        }
        write!(f, " {}", self.message)?;
        if let Some(code) = self.code {
            write!(f, " ({code})")?;
        }
        Ok(())
    }
}
