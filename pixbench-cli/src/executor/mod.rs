//! Benchmark Executor
//!
//! Runs every backend over the discovered inputs and collects the outcomes.
//!
//! ## Pipeline Overview
//!
//! ```text
//! BenchmarkConfig (pixbench.toml + CLI)
//!       │
//!       ▼
//! ┌──────────────┐
//! │ orchestrator │  Discover inputs, fan out over the worker pool
//! └──────┬───────┘
//!        │  CompressionRun / SkippedRun
//!        ▼
//! ┌──────────────┐
//! │  collector   │  Thread-safe append-only sink
//! └──────┬───────┘
//!        │  RunSet
//!        ▼
//! ┌──────────────┐
//! │   metadata   │  Host info for the JSON report
//! └──────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`orchestrator`] - Phase state machine, worker pool, failure isolation
//! - [`collector`] - Result aggregation across workers
//! - [`metadata`] - System metadata collection

mod collector;
mod metadata;
mod orchestrator;

// Re-export public API
pub use collector::RunCollector;
pub use metadata::build_report_meta;
pub use orchestrator::{BenchOutcome, CancellationFlag, Orchestrator, OrchestratorError, Phase};
