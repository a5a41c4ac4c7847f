//! # In-memory recording sink
//!
//! [`MemorySink`] keeps every `(index, batch)` it receives, in delivery order.
//! Useful for tests and for callers that render diagnostics after the fact.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::channel::Sink;
use crate::diagnostics::{Diagnostic, Diagnostics};

/// Sink that records batches.
#[derive(Default)]
pub struct MemorySink {
    records: Mutex<Vec<(u64, Diagnostics)>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(u64, Diagnostics)>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of everything recorded so far.
    pub fn records(&self) -> Vec<(u64, Diagnostics)> {
        self.lock().clone()
    }

    /// Indices in delivery order.
    pub fn indices(&self) -> Vec<u64> {
        self.lock().iter().map(|(i, _)| *i).collect()
    }

    /// Every diagnostic of every batch, flattened in delivery order.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.lock()
            .iter()
            .flat_map(|(_, batch)| batch.iter().cloned())
            .collect()
    }

    /// Number of batches recorded.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[async_trait]
impl Sink for MemorySink {
    async fn accept(&self, index: u64, batch: &Diagnostics) {
        self.lock().push((index, batch.clone()));
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
