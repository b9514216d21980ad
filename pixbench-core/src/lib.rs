#![warn(missing_docs)]
//! PixBench Core - Backends and Measurement
//!
//! This crate provides everything that runs inside a single compression attempt:
//! - `Backend` trait: the uniform resize + encode contract
//! - Three built-in backends (`imageops`, `thumbnail`, `libwebp`)
//! - `BackendRegistry`: the read-only set of backends for a benchmark
//! - `CompressionRun` / `SkippedRun` / `RunSet`: the recorded outcomes
//! - Per-thread allocation tracking and run timing

mod allocator;
mod backend;
pub mod backends;
mod error;
mod format;
mod measure;
mod registry;
mod run;

pub use allocator::{TrackingAllocator, current_allocation, is_tracking, reset_allocation_counter};
pub use backend::{
    Backend, CompressRequest, fit_within, output_file_name, partial_path, write_atomically,
};
pub use error::{CompressError, FailureKind};
pub use format::{ImageFormat, SUPPORTED_EXTENSIONS, format_token};
pub use measure::{Measurement, RunTimer};
pub use registry::{BackendRegistry, UnknownBackend};
pub use run::{CompressionRun, RunKey, RunSet, SkippedRun};

/// Default encode quality (1..=100)
pub const DEFAULT_QUALITY: u8 = 75;

/// Default longest-edge bound in pixels
pub const DEFAULT_TARGET_SIZE: u32 = 1024;
