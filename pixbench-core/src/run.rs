//! Run Records
//!
//! ```text
//!  Backend::compress ──Ok──▶ CompressionRun ─┐
//!         │                                  ├──▶ RunSet ──▶ report
//!         └────Err/panic──▶ SkippedRun ──────┘
//! ```

use crate::error::FailureKind;
use serde::{Deserialize, Serialize};

/// One successful (input, backend, target size) compression
///
/// Records are created once by the adapter pipeline and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionRun {
    /// Input file name (no directory)
    pub file_name: String,
    /// Backend identifier
    pub backend: String,
    /// Longest-edge pixel bound
    pub target_size: u32,
    /// Lower-case output extension token
    pub format: String,
    /// Decode + resize + encode + write, in milliseconds
    pub elapsed_ms: u64,
    /// Net bytes allocated during the run; 0 when unmeasurable
    pub memory_delta: i64,
    /// Input file size in bytes
    pub input_size: u64,
    /// Output file size in bytes
    pub output_size: u64,
}

impl CompressionRun {
    /// Key identifying the unit of work that produced this run
    pub fn key(&self) -> RunKey<'_> {
        RunKey {
            file_name: &self.file_name,
            backend: &self.backend,
            target_size: self.target_size,
        }
    }

    /// Output size as a fraction of the input size
    pub fn size_ratio(&self) -> f64 {
        if self.input_size == 0 {
            0.0
        } else {
            self.output_size as f64 / self.input_size as f64
        }
    }
}

/// Identity of a unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunKey<'a> {
    /// Input file name
    pub file_name: &'a str,
    /// Backend identifier
    pub backend: &'a str,
    /// Target size
    pub target_size: u32,
}

/// An attempted run that produced no [`CompressionRun`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRun {
    /// Input file name
    pub file_name: String,
    /// Backend identifier
    pub backend: String,
    /// Target size
    pub target_size: u32,
    /// Requested format token
    pub format: String,
    /// Failure classification
    pub kind: FailureKind,
    /// Error detail
    pub message: String,
}

impl SkippedRun {
    /// Key identifying the unit of work this record stands in for
    pub fn key(&self) -> RunKey<'_> {
        RunKey {
            file_name: &self.file_name,
            backend: &self.backend,
            target_size: self.target_size,
        }
    }
}

/// Every recorded outcome of one benchmark invocation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSet {
    /// Successful runs, in arrival order
    pub runs: Vec<CompressionRun>,
    /// Attempts that failed or never started
    pub skipped: Vec<SkippedRun>,
    /// Whether the invocation was cancelled before every input was dispatched
    #[serde(default)]
    pub cancelled: bool,
}

impl RunSet {
    /// Whether nothing was attempted
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty() && self.skipped.is_empty()
    }

    /// Number of attempted runs (successful + skipped)
    pub fn attempted(&self) -> usize {
        self.runs.len() + self.skipped.len()
    }

    /// Successful runs ordered by (file, backend, target size)
    pub fn sorted(&self) -> Vec<&CompressionRun> {
        let mut runs: Vec<_> = self.runs.iter().collect();
        runs.sort_by(|a, b| a.key().cmp(&b.key()));
        runs
    }

    /// Successful runs produced by one backend
    pub fn by_backend<'a>(&'a self, backend: &'a str) -> impl Iterator<Item = &'a CompressionRun> {
        self.runs.iter().filter(move |r| r.backend == backend)
    }

    /// Backend identifiers seen in runs or skips, sorted
    pub fn backends(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .runs
            .iter()
            .map(|r| r.backend.as_str())
            .chain(self.skipped.iter().map(|s| s.backend.as_str()))
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}
