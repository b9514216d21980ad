//! Benchmark Orchestration
//!
//! Drives one benchmark invocation through its phases:
//!
//! ```text
//! Idle ──▶ Discovering ──▶ Dispatching ──▶ Draining ──▶ Done
//!              │                │
//!              │                └─ rayon pool, one input file per task,
//!              │                   every backend × size sequentially
//!              └─ input plan (sorted, filtered, collisions split off)
//! ```
//!
//! Dispatching lasts until the pool has joined every task; rayon gives no
//! point at which all files are handed out but some are still running. Draining
//! is the short tail after the join: the progress bar is closed and the
//! records are taken out of the collector.
//!
//! Every (input, backend, size) attempt ends up in the [`RunCollector`]
//! exactly once, either as a run or as a skip. Backend errors and panics are
//! contained to the attempt that raised them.

use super::collector::RunCollector;
use crate::config::BenchmarkConfig;
use crate::planner::{DiscoveryError, InputImage, InputPlan, discover_inputs};
use crate::signal::interrupt_requested;
use indicatif::{ProgressBar, ProgressStyle};
use pixbench_core::{Backend, CompressRequest, FailureKind, RunSet, SkippedRun};
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Orchestrator state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Not started
    Idle,
    /// Listing the input directory
    Discovering,
    /// Workers running, until every task has joined
    Dispatching,
    /// Workers joined, records being collected
    Draining,
    /// Every input attempted (or cancelled)
    Done,
}

/// Fatal orchestration errors
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Input directory could not be listed
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
    /// Worker pool could not be created
    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Cooperative cancellation shared with the caller
///
/// Input files that have not started when the flag trips are recorded as
/// cancelled; files already being processed run to completion.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    flag: Arc<AtomicBool>,
    watch_signals: bool,
}

impl CancellationFlag {
    /// A flag that only trips on [`cancel`](Self::cancel)
    pub fn new() -> Self {
        Self::default()
    }

    /// A flag that also trips on SIGINT/SIGTERM
    ///
    /// Requires [`install_interrupt_handler`](crate::install_interrupt_handler).
    pub fn with_signals() -> Self {
        Self {
            flag: Arc::default(),
            watch_signals: true,
        }
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed) || (self.watch_signals && interrupt_requested())
    }
}

/// Result of a completed benchmark invocation
#[derive(Debug, Clone)]
pub struct BenchOutcome {
    /// Every recorded outcome
    pub run_set: RunSet,
    /// Number of inputs dispatched
    pub inputs: usize,
    /// Wall-clock duration from discovery to drain
    pub elapsed: Duration,
}

/// Runs a benchmark over an input directory
pub struct Orchestrator {
    config: BenchmarkConfig,
    cancel: CancellationFlag,
    phase: Phase,
    history: Vec<Phase>,
}

impl Orchestrator {
    /// Orchestrator in [`Phase::Idle`] with its own cancellation flag
    pub fn new(config: BenchmarkConfig) -> Self {
        Self {
            config,
            cancel: CancellationFlag::new(),
            phase: Phase::Idle,
            history: Vec::new(),
        }
    }

    /// Use an externally owned cancellation flag
    pub fn with_cancellation(mut self, cancel: CancellationFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Phases entered so far, in order
    pub fn transitions(&self) -> &[Phase] {
        &self.history
    }

    /// Handle for cancelling this orchestrator from another thread
    pub fn cancellation(&self) -> CancellationFlag {
        self.cancel.clone()
    }

    /// Configuration this orchestrator runs with
    pub fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    fn transition(&mut self, next: Phase) {
        debug!(from = ?self.phase, to = ?next, "phase transition");
        self.phase = next;
        self.history.push(next);
    }

    /// Discover inputs and run every backend over them
    ///
    /// Only discovery and pool construction are fatal; per-run failures are
    /// recorded as skips.
    pub fn run(&mut self) -> Result<BenchOutcome, OrchestratorError> {
        let start = Instant::now();

        self.history.clear();
        self.transition(Phase::Discovering);
        let plan = match discover_inputs(&self.config.input_dir, self.config.filter.as_ref()) {
            Ok(plan) => plan,
            Err(e) => {
                self.transition(Phase::Idle);
                return Err(e.into());
            }
        };
        info!(
            inputs = plan.inputs.len(),
            conflicts = plan.conflicts.len(),
            dir = %self.config.input_dir.display(),
            "discovered input images"
        );

        let collector = RunCollector::new();
        self.record_conflicts(&plan, &collector);

        if plan.inputs.is_empty() {
            self.transition(Phase::Done);
            return Ok(BenchOutcome {
                run_set: collector.into_run_set(),
                inputs: 0,
                elapsed: start.elapsed(),
            });
        }

        if let Err(e) = std::fs::create_dir_all(&self.config.output_dir) {
            // Every write will fail and be recorded per run
            warn!(
                dir = %self.config.output_dir.display(),
                error = %e,
                "failed to create output directory"
            );
        }

        let workers = self.config.jobs.max(1).min(plan.inputs.len());
        let pool = match ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("pixbench-worker-{}", i))
            .build()
        {
            Ok(pool) => pool,
            Err(e) => {
                self.transition(Phase::Idle);
                return Err(e.into());
            }
        };

        self.transition(Phase::Dispatching);
        info!(
            inputs = plan.inputs.len(),
            backends = self.config.registry.len(),
            sizes = ?self.config.target_sizes,
            workers,
            "dispatching"
        );

        let pb = self.progress_bar(plan.inputs.len() as u64);
        pool.install(|| {
            plan.inputs.par_iter().for_each(|input| {
                pb.set_message(input.file_name.clone());
                self.process_input(input, &collector);
                pb.inc(1);
            });
        });

        self.transition(Phase::Draining);
        pb.finish_and_clear();
        let run_set = collector.into_run_set();

        self.transition(Phase::Done);
        info!(
            succeeded = run_set.runs.len(),
            skipped = run_set.skipped.len(),
            cancelled = run_set.cancelled,
            "benchmark complete"
        );

        Ok(BenchOutcome {
            run_set,
            inputs: plan.inputs.len(),
            elapsed: start.elapsed(),
        })
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.config.progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    }

    /// Every backend × size for one input file, sequentially
    fn process_input(&self, input: &InputImage, collector: &RunCollector) {
        if self.cancel.is_cancelled() {
            collector.mark_cancelled();
            self.skip_all(input, FailureKind::Cancelled, "cancelled before dispatch", collector);
            return;
        }

        for backend in self.config.registry.iter() {
            for &target_size in &self.config.target_sizes {
                self.attempt(backend.as_ref(), input, target_size, collector);
            }
        }
    }

    fn attempt(
        &self,
        backend: &dyn Backend,
        input: &InputImage,
        target_size: u32,
        collector: &RunCollector,
    ) {
        let request = CompressRequest {
            input: &input.path,
            target_size,
            format: &input.format,
            output_dir: &self.config.output_dir,
            quality: self.config.quality,
        };

        let (kind, message) = match catch_unwind(AssertUnwindSafe(|| backend.compress(&request))) {
            Ok(Ok(run)) => {
                debug!(
                    file = %run.file_name,
                    backend = %run.backend,
                    size = run.target_size,
                    elapsed_ms = run.elapsed_ms,
                    output_bytes = run.output_size,
                    "run complete"
                );
                collector.add(run);
                return;
            }
            Ok(Err(e)) => {
                warn!(
                    file = %input.file_name,
                    backend = backend.id(),
                    size = target_size,
                    error = %e,
                    "compression failed"
                );
                (e.kind(), e.to_string())
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(
                    file = %input.file_name,
                    backend = backend.id(),
                    size = target_size,
                    panic = %message,
                    "backend panicked"
                );
                (FailureKind::Panicked, message)
            }
        };

        collector.skip(SkippedRun {
            file_name: input.file_name.clone(),
            backend: backend.id().to_string(),
            target_size,
            format: input.format.clone(),
            kind,
            message,
        });
    }

    fn record_conflicts(&self, plan: &InputPlan, collector: &RunCollector) {
        for conflict in &plan.conflicts {
            warn!(
                file = %conflict.input.file_name,
                kept = %conflict.kept,
                "output names collide, skipping input"
            );
            let message = format!("output names collide with {}", conflict.kept);
            self.skip_all(&conflict.input, FailureKind::OutputConflict, &message, collector);
        }
    }

    fn skip_all(&self, input: &InputImage, kind: FailureKind, message: &str, collector: &RunCollector) {
        for backend in self.config.registry.iter() {
            for &target_size in &self.config.target_sizes {
                collector.skip(SkippedRun {
                    file_name: input.file_name.clone(),
                    backend: backend.id().to_string(),
                    target_size,
                    format: input.format.clone(),
                    kind,
                    message: message.to_string(),
                });
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
