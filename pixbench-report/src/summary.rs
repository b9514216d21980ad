//! Terminal Summary
//!
//! Per-backend aggregates for a quick read of a benchmark in the terminal:
//! run and failure counts, mean/median elapsed time, mean memory delta, total
//! bytes in and out, and the overall output/input ratio.

use crate::tsv::to_kb;
use pixbench_core::{CompressionRun, RunSet};
use std::fmt::Write as _;

/// Aggregates for one backend
#[derive(Debug, Clone, PartialEq)]
pub struct BackendSummary {
    /// Backend identifier
    pub backend: String,
    /// Successful runs
    pub runs: usize,
    /// Skipped runs
    pub failures: usize,
    /// Mean elapsed milliseconds
    pub mean_ms: f64,
    /// Median elapsed milliseconds
    pub median_ms: f64,
    /// Mean memory delta in bytes
    pub mean_memory: f64,
    /// Sum of input sizes in bytes
    pub total_input: u64,
    /// Sum of output sizes in bytes
    pub total_output: u64,
}

impl BackendSummary {
    /// Total output as a fraction of total input (0 when nothing was read)
    pub fn ratio(&self) -> f64 {
        if self.total_input == 0 {
            0.0
        } else {
            self.total_output as f64 / self.total_input as f64
        }
    }
}

/// Median with linear interpolation between the two middle values
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let rank = 0.5 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = (lower + 1).min(sorted.len() - 1);
    sorted[lower] + (rank - lower as f64) * (sorted[upper] - sorted[lower])
}

/// Aggregate a run set per backend, ordered by backend identifier
pub fn summarize(run_set: &RunSet) -> Vec<BackendSummary> {
    run_set
        .backends()
        .into_iter()
        .map(|backend| {
            let runs: Vec<&CompressionRun> = run_set.by_backend(backend).collect();
            let failures = run_set
                .skipped
                .iter()
                .filter(|s| s.backend == backend)
                .count();
            let elapsed: Vec<f64> = runs.iter().map(|r| r.elapsed_ms as f64).collect();
            let n = runs.len().max(1) as f64;

            BackendSummary {
                backend: backend.to_string(),
                runs: runs.len(),
                failures,
                mean_ms: elapsed.iter().sum::<f64>() / n,
                median_ms: median(&elapsed),
                mean_memory: runs.iter().map(|r| r.memory_delta as f64).sum::<f64>() / n,
                total_input: runs.iter().map(|r| r.input_size).sum(),
                total_output: runs.iter().map(|r| r.output_size).sum(),
            }
        })
        .collect()
}

/// Format a run set for human-readable terminal display
pub fn format_human_summary(run_set: &RunSet) -> String {
    let mut output = String::new();

    output.push('\n');
    output.push_str("PixBench Results\n");
    output.push_str(&"=".repeat(78));
    output.push_str("\n\n");

    if run_set.is_empty() {
        output.push_str("No images were benchmarked.\n");
        return output;
    }

    let summaries = summarize(run_set);
    let width = summaries
        .iter()
        .map(|s| s.backend.len())
        .max()
        .unwrap_or(7)
        .max("Backend".len());

    let _ = writeln!(
        output,
        "  {:<width$}  {:>5}  {:>6}  {:>10}  {:>10}  {:>10}  {:>12}  {:>7}",
        "Backend",
        "Runs",
        "Failed",
        "Mean ms",
        "Median ms",
        "Mem KB",
        "Out/In KB",
        "Ratio",
        width = width
    );
    let _ = writeln!(output, "  {}", "-".repeat(width + 74));

    for s in &summaries {
        let _ = writeln!(
            output,
            "  {:<width$}  {:>5}  {:>6}  {:>10.1}  {:>10.1}  {:>10.2}  {:>12}  {:>6.1}%",
            s.backend,
            s.runs,
            s.failures,
            s.mean_ms,
            s.median_ms,
            to_kb(s.mean_memory),
            format!(
                "{:.0}/{:.0}",
                to_kb(s.total_output as f64),
                to_kb(s.total_input as f64)
            ),
            s.ratio() * 100.0,
            width = width
        );
    }

    if !run_set.skipped.is_empty() {
        output.push_str("\nFailures\n");
        output.push_str(&"-".repeat(78));
        output.push('\n');
        for skip in &run_set.skipped {
            let _ = writeln!(
                output,
                "  ✗ {} [{} @ {}px] {}: {}",
                skip.file_name, skip.backend, skip.target_size, skip.kind, skip.message
            );
        }
    }

    if run_set.cancelled {
        output.push_str("\nBenchmark was cancelled before every image was dispatched.\n");
    }

    let _ = writeln!(
        output,
        "\n{} runs succeeded, {} failed.",
        run_set.runs.len(),
        run_set.skipped.len()
    );

    output
}
