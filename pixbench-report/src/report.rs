//! Report Data Structures

use chrono::{DateTime, Utc};
use pixbench_core::RunSet;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete benchmark report, as serialized to JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchReport {
    /// Run metadata
    pub meta: ReportMeta,
    /// Every recorded outcome
    pub results: RunSet,
    /// Counts and totals
    pub summary: ReportSummary,
}

/// Report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMeta {
    /// Report schema version
    pub schema_version: u32,
    /// pixbench version
    pub version: String,
    /// Generation time
    pub timestamp: DateTime<Utc>,
    /// Host information
    pub system: SystemInfo,
    /// Effective configuration
    pub config: ReportConfig,
}

/// Benchmark configuration captured in report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Scanned directory
    pub input_dir: PathBuf,
    /// Directory compressed files were written to
    pub output_dir: PathBuf,
    /// Directory the TSV report was written to
    pub report_dir: PathBuf,
    /// Longest-edge bounds
    pub target_sizes: Vec<u32>,
    /// Encode quality
    pub quality: u8,
    /// Selected backend identifiers
    pub backends: Vec<String>,
    /// Worker count
    pub jobs: usize,
}

/// System information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    /// Operating system
    pub os: String,
    /// CPU architecture
    pub arch: String,
    /// CPU model name
    pub cpu: String,
    /// Logical cores
    pub cpu_cores: u32,
    /// Total memory in GB (0 when unknown)
    pub memory_gb: f64,
    /// Whether memory deltas came from the tracking allocator
    pub memory_tracking: bool,
}

/// Report summary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Discovered input images
    pub inputs: usize,
    /// Attempted runs
    pub attempted: usize,
    /// Successful runs
    pub succeeded: usize,
    /// Skipped runs
    pub failed: usize,
    /// Whether the run was cancelled
    pub cancelled: bool,
    /// Wall-clock duration of the benchmark
    pub total_duration_ms: f64,
    /// Path of the TSV report, when one was written
    pub tsv_path: Option<PathBuf>,
}

impl ReportSummary {
    /// Summary counts for a run set
    pub fn from_run_set(run_set: &RunSet, inputs: usize, total_duration_ms: f64) -> Self {
        Self {
            inputs,
            attempted: run_set.attempted(),
            succeeded: run_set.runs.len(),
            failed: run_set.skipped.len(),
            cancelled: run_set.cancelled,
            total_duration_ms,
            tsv_path: None,
        }
    }
}
