#![warn(missing_docs)]
//! PixBench CLI Library
//!
//! This module provides the CLI infrastructure for the `pixbench` binary:
//! configuration loading, input discovery, orchestration over a worker pool
//! and report output.
//!
//! # Example
//!
//! ```ignore
//! fn main() -> anyhow::Result<()> {
//!     pixbench_cli::run()
//! }
//! ```

mod config;
mod executor;
mod planner;
mod signal;

pub use config::*;
pub use executor::{
    BenchOutcome, CancellationFlag, Orchestrator, OrchestratorError, Phase, RunCollector,
    build_report_meta,
};
pub use planner::{
    DiscoveryError, InputConflict, InputImage, InputPlan, build_plan, discover_inputs,
};
pub use signal::{install_interrupt_handler, interrupt_requested};

use chrono::Local;
use clap::{Parser, Subcommand};
use pixbench_report::{
    BenchReport, OutputFormat, ReportSummary, format_human_summary, generate_json_report,
    write_report,
};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// PixBench CLI arguments
#[derive(Parser, Debug)]
#[command(name = "pixbench")]
#[command(author, version, about = "PixBench - image compression backend benchmark")]
pub struct Cli {
    /// Optional subcommand (Run, List, Init); defaults to Run
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Directory scanned for input images
    #[arg(long, short, global = true)]
    pub input: Option<PathBuf>,

    /// Directory compressed images are written to
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Directory the TSV report is written to
    #[arg(long, global = true)]
    pub report_dir: Option<PathBuf>,

    /// Longest-edge bound in pixels (repeatable)
    #[arg(long = "size", short = 's', global = true)]
    pub sizes: Vec<u32>,

    /// Encode quality (1-100)
    #[arg(long, short, global = true)]
    pub quality: Option<u8>,

    /// Backend to run (repeatable; default: all)
    #[arg(long = "backend", short = 'b', global = true)]
    pub backends: Vec<String>,

    /// Number of worker threads
    #[arg(long, short, global = true)]
    pub jobs: Option<usize>,

    /// Only benchmark files whose name matches this regex
    #[arg(long, global = true)]
    pub filter: Option<String>,

    /// Summary format: human, json
    #[arg(long, default_value = "human", global = true)]
    pub format: String,

    /// Write the summary to a file instead of stdout
    #[arg(long, global = true)]
    pub summary_output: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(long, global = true)]
    pub no_progress: bool,

    /// Configuration file (default: pixbench.toml discovered upwards)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// CLI subcommands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Run the benchmark (default)
    Run,
    /// List discovered inputs and enabled backends
    List,
    /// Print a default pixbench.toml
    Init,
}

/// A finished benchmark and the report it produced
#[derive(Debug, Clone)]
pub struct BenchRun {
    /// Orchestrator outcome
    pub outcome: BenchOutcome,
    /// Path of the written TSV report
    pub report_path: PathBuf,
}

/// Run the PixBench CLI with the given arguments.
/// This is the main entry point for the binary.
///
/// # Returns
/// Returns `Ok(())` on success, or an error if something goes wrong.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_with_cli(cli)
}

/// Run the PixBench CLI with pre-parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    init_logging(cli.verbose);

    if cli.command == Some(Commands::Init) {
        print!("{}", PixConfig::default_toml());
        return Ok(());
    }

    let format: OutputFormat = cli
        .format
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    let config = resolve_config(&cli)?;

    match cli.command {
        Some(Commands::List) => list_inputs(&config),
        Some(Commands::Run) | None => {
            install_interrupt_handler();
            let bench = run_benchmark(config.clone(), CancellationFlag::with_signals())?;
            emit_summary(&cli, &config, &bench, format)
        }
        Some(Commands::Init) => Ok(()),
    }
}

/// Initialise tracing; `RUST_LOG` takes precedence over the verbosity flag
fn init_logging(verbose: bool) {
    let default = if verbose { "pixbench=debug" } else { "pixbench=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A subscriber may already be installed when embedded or under test
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Layer pixbench.toml defaults and CLI overrides into a validated configuration.
pub fn resolve_config(cli: &Cli) -> anyhow::Result<BenchmarkConfig> {
    let mut config = match &cli.config {
        Some(path) => PixConfig::load(path)?,
        None => PixConfig::discover().unwrap_or_default(),
    };
    apply_overrides(cli, &mut config);
    Ok(BenchmarkConfig::from_config(&config)?)
}

/// CLI flags override config file values when given.
pub fn apply_overrides(cli: &Cli, config: &mut PixConfig) {
    if let Some(input) = &cli.input {
        config.paths.input = input.clone();
    }
    if let Some(output) = &cli.output_dir {
        config.paths.output = output.clone();
    }
    if let Some(reports) = &cli.report_dir {
        config.paths.reports = reports.clone();
    }
    if !cli.sizes.is_empty() {
        config.encode.sizes = cli.sizes.clone();
    }
    if let Some(quality) = cli.quality {
        config.encode.quality = quality;
    }
    if !cli.backends.is_empty() {
        config.encode.backends = cli.backends.clone();
    }
    if let Some(jobs) = cli.jobs {
        config.runner.jobs = Some(jobs);
    }
    if let Some(filter) = &cli.filter {
        config.runner.filter = Some(filter.clone());
    }
    if cli.no_progress {
        config.runner.progress = false;
    }
}

/// Run the orchestrator and write the TSV report.
///
/// The report holds the successful runs sorted by (file, backend, size) and is
/// written even when nothing succeeded, so every invocation leaves a report.
///
/// Besides discovery and pool errors, a report that cannot be written is also
/// returned as an error: the runs were measured but nothing records them, so
/// the invocation exits non-zero instead of reporting success.
pub fn run_benchmark(
    config: BenchmarkConfig,
    cancel: CancellationFlag,
) -> anyhow::Result<BenchRun> {
    let report_dir = config.report_dir.clone();
    let mut orchestrator = Orchestrator::new(config).with_cancellation(cancel);
    let outcome = orchestrator.run()?;

    let report_path = write_report(outcome.run_set.sorted(), &report_dir, &Local::now())
        .map_err(|e| anyhow::anyhow!("failed to write report to {}: {}", report_dir.display(), e))?;
    tracing::info!(path = %report_path.display(), "report written");

    Ok(BenchRun {
        outcome,
        report_path,
    })
}

fn emit_summary(
    cli: &Cli,
    config: &BenchmarkConfig,
    bench: &BenchRun,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let run_set = &bench.outcome.run_set;

    let output = match format {
        OutputFormat::Json => {
            let mut summary = ReportSummary::from_run_set(
                run_set,
                bench.outcome.inputs,
                bench.outcome.elapsed.as_secs_f64() * 1000.0,
            );
            summary.tsv_path = Some(bench.report_path.clone());
            let report = BenchReport {
                meta: build_report_meta(config),
                results: run_set.clone(),
                summary,
            };
            generate_json_report(&report)?
        }
        OutputFormat::Human => {
            let mut text = format_human_summary(run_set);
            text.push_str(&format!("Report: {}\n", bench.report_path.display()));
            text
        }
    };

    if let Some(ref path) = cli.summary_output {
        let mut file = std::fs::File::create(path)?;
        file.write_all(output.as_bytes())?;
        println!("Summary written to: {}", path.display());
    } else {
        print!("{}", output);
    }

    if run_set.cancelled {
        eprintln!("\nBenchmark interrupted; the report covers completed runs only");
    }

    Ok(())
}

fn list_inputs(config: &BenchmarkConfig) -> anyhow::Result<()> {
    let plan = discover_inputs(&config.input_dir, config.filter.as_ref())?;

    println!("PixBench Plan:");
    println!(
        "├── input: {} ({} images)",
        config.input_dir.display(),
        plan.inputs.len()
    );
    for input in &plan.inputs {
        println!("│   ├── {} [{}]", input.file_name, input.format);
    }
    for conflict in &plan.conflicts {
        println!(
            "│   ├── {} (skipped: output names collide with {})",
            conflict.input.file_name, conflict.kept
        );
    }

    println!("├── backends:");
    for backend in config.registry.iter() {
        println!("│   ├── {} - {}", backend.id(), backend.description());
    }

    let sizes: Vec<String> = config.target_sizes.iter().map(|s| s.to_string()).collect();
    println!(
        "└── sizes: {}, quality: {}, jobs: {}",
        sizes.join(", "),
        config.quality,
        config.jobs
    );

    let runs = plan.inputs.len() * config.registry.len() * config.target_sizes.len();
    println!("{} runs planned.", runs);

    Ok(())
}
