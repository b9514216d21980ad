#![warn(missing_docs)]
//! # PixBench
//!
//! Benchmark image compression backends against a corpus of images.
//!
//! PixBench runs every enabled backend over every image in a directory, once
//! per configured target size, and records elapsed time, memory delta and
//! byte sizes for each run:
//! - **Uniform Backends**: `imageops` (Lanczos3), `thumbnail` (fast integer
//!   sampling) and `libwebp` (lossy WebP through libwebp) behind one `Backend` trait
//! - **Failure Isolation**: a corrupt image or a panicking codec only loses
//!   its own run; everything else is still benchmarked and reported
//! - **Parallel Dispatch**: input files are spread over a bounded rayon pool
//! - **Allocation Tracking**: `TrackingAllocator` measures net heap usage per
//!   run on the worker thread that executed it
//! - **Reports**: timestamped TSV, human summary and JSON with host metadata
//!
//! ## Quick Start
//!
//! ```ignore
//! use pixbench::prelude::*;
//!
//! let config = BenchmarkConfig::from_config(&PixConfig::default())?;
//! let bench = pixbench::run_benchmark(config, CancellationFlag::new())?;
//! println!("{}", format_human_summary(&bench.outcome.run_set));
//! ```
//!
//! ## Custom Backends
//!
//! ```ignore
//! struct Passthrough;
//!
//! impl Backend for Passthrough {
//!     fn id(&self) -> &'static str { "passthrough" }
//!     fn description(&self) -> &'static str { "no resampling" }
//!     fn resize(&self, image: &DynamicImage, w: u32, h: u32) -> DynamicImage {
//!         image.resize_exact(w, h, FilterType::Nearest)
//!     }
//!     fn encode(&self, image: &DynamicImage, format: ImageFormat, quality: u8)
//!         -> Result<Vec<u8>, CompressError> { /* ... */ }
//! }
//!
//! let registry = BackendRegistry::new(vec![Arc::new(Passthrough)]);
//! ```

// Re-export core types
pub use pixbench_core::{
    Backend, BackendRegistry, CompressError, CompressRequest, CompressionRun, FailureKind,
    ImageFormat, RunSet, SkippedRun, TrackingAllocator, UnknownBackend, backends,
    current_allocation, is_tracking, reset_allocation_counter,
};

// Re-export report functions
pub use pixbench_report::{
    BenchReport, COLUMNS, OutputFormat, TsvRow, format_human_summary, generate_json_report,
    parse_tsv, render_tsv, write_report,
};

// Re-export orchestration
pub use pixbench_cli::{
    BenchOutcome, BenchRun, BenchmarkConfig, CancellationFlag, ConfigError, DiscoveryError,
    Orchestrator, OrchestratorError, Phase, PixConfig, run_benchmark,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Backend, BackendRegistry, BenchmarkConfig, CancellationFlag, CompressError,
        CompressRequest, CompressionRun, ImageFormat, Orchestrator, PixConfig, RunSet,
        format_human_summary,
    };
}

/// Run the PixBench CLI.
///
/// Call this from the binary's `main()`:
/// ```ignore
/// fn main() -> anyhow::Result<()> {
///     pixbench::run()
/// }
/// ```
pub use pixbench_cli::run;
