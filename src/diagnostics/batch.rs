//! # Diagnostic batches.
//!
//! [`Diagnostics`] is an ordered group of [`Diagnostic`]s produced atomically by one
//! logical operation. Channels move whole batches: a batch is never split or merged
//! in transit.

use std::fmt;
use std::sync::Arc;

use super::diagnostic::{Diagnostic, Severity};

/// Ordered batch of diagnostics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Creates an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    /// Builder form of [`push`](Self::push).
    #[inline]
    pub fn with(mut self, diagnostic: Diagnostic) -> Self {
        self.push(diagnostic);
        self
    }

    /// Appends a diagnostic of the given severity built from `message`.
    pub fn add(&mut self, severity: Severity, message: impl Into<Arc<str>>) -> &mut Self {
        self.push(Diagnostic::new(severity, message));
        self
    }

    pub fn add_debug(&mut self, message: impl Into<Arc<str>>) -> &mut Self {
        self.add(Severity::Debug, message)
    }

    pub fn add_info(&mut self, message: impl Into<Arc<str>>) -> &mut Self {
        self.add(Severity::Info, message)
    }

    pub fn add_warn(&mut self, message: impl Into<Arc<str>>) -> &mut Self {
        self.add(Severity::Warn, message)
    }

    pub fn add_error(&mut self, message: impl Into<Arc<str>>) -> &mut Self {
        self.add(Severity::Error, message)
    }

    pub fn add_fatal(&mut self, message: impl Into<Arc<str>>) -> &mut Self {
        self.add(Severity::Fatal, message)
    }

    /// Appends every diagnostic of `other`, preserving order.
    pub fn extend(&mut self, other: Diagnostics) -> &mut Self {
        self.items.extend(other.items);
        self
    }

    /// Stamps `origin` on every entry that does not have one yet.
    pub fn with_origin(mut self, origin: impl Into<Arc<str>>) -> Self {
        let origin = origin.into();
        for d in self.items.iter_mut().filter(|d| d.origin.is_none()) {
            d.origin = Some(Arc::clone(&origin));
        }
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.items.iter()
    }

    /// `true` if any entry is `Error` or `Fatal`.
    pub fn has_error(&self) -> bool {
        self.items.iter().any(|d| d.severity.is_error())
    }

    /// Highest severity in the batch, `None` when empty.
    pub fn max_severity(&self) -> Option<Severity> {
        self.items.iter().map(|d| d.severity).max()
    }

    /// Returns the first entry carrying `code`.
    pub fn find_code(&self, code: &str) -> Option<&Diagnostic> {
        self.items.iter().find(|d| d.code == Some(code))
    }
}

impl From<Diagnostic> for Diagnostics {
    fn from(d: Diagnostic) -> Self {
        Self { items: vec![d] }
    }
}

impl FromIterator<Diagnostic> for Diagnostics {
    fn from_iter<I: IntoIterator<Item = Diagnostic>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, d) in self.items.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{d}")?;
        }
        Ok(())
    }
}
