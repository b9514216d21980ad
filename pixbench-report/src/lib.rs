#![warn(missing_docs)]
//! PixBench Report - Reporting
//!
//! Generates the output formats of a benchmark:
//! - TSV (the timestamped report file, fixed seven columns)
//! - Human (per-backend summary for the terminal)
//! - JSON (machine-readable, with host and configuration metadata)

mod json;
mod report;
mod summary;
mod tsv;

pub use json::generate_json_report;
pub use report::{BenchReport, ReportConfig, ReportMeta, ReportSummary, SystemInfo};
pub use summary::{BackendSummary, format_human_summary, median, summarize};
pub use tsv::{
    COLUMNS, REPORT_PREFIX, TIMESTAMP_FORMAT, TsvParseError, TsvRow, parse_tsv, render_tsv,
    report_file_name, to_kb, write_report,
};

/// Schema version of [`BenchReport`]
pub const SCHEMA_VERSION: u32 = 1;

/// Summary format printed after a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable terminal output
    #[default]
    Human,
    /// JSON with metadata
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "human" | "text" => Ok(OutputFormat::Human),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}
