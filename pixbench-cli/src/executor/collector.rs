//! Result Collector
//!
//! The only mutable state shared between workers. Appends are serialized by a
//! mutex; a worker that panicked while holding it cannot lose records already
//! stored, so poisoning is ignored.

use pixbench_core::{CompressionRun, RunSet, SkippedRun};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Thread-safe sink for run outcomes
#[derive(Debug, Default)]
pub struct RunCollector {
    inner: Mutex<RunSet>,
}

impl RunCollector {
    /// Empty collector
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RunSet> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a successful run
    pub fn add(&self, run: CompressionRun) {
        self.lock().runs.push(run);
    }

    /// Record an attempt that produced no run
    pub fn skip(&self, record: SkippedRun) {
        self.lock().skipped.push(record);
    }

    /// Flag the set as cancelled
    pub fn mark_cancelled(&self) {
        self.lock().cancelled = true;
    }

    /// Copy of everything recorded so far
    pub fn snapshot(&self) -> RunSet {
        self.lock().clone()
    }

    /// Number of records (runs + skips)
    pub fn len(&self) -> usize {
        self.lock().attempted()
    }

    /// Whether nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consume the collector
    pub fn into_run_set(self) -> RunSet {
        self.inner
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
