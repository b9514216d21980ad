//! Compression Errors
//!
//! Every backend failure falls into one of three kinds. None of them is fatal to
//! a benchmark: the orchestrator records the failed run and moves on.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Errors a backend can return for a single compression attempt
#[derive(Debug, Error)]
pub enum CompressError {
    /// Format token outside the supported set, or not encodable by the backend
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Input could not be read or output could not be written
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File being read or written
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Decoder or encoder rejected the image
    #[error("codec error: {0}")]
    Codec(String),
}

impl CompressError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CompressError::Io {
            path: path.into(),
            source,
        }
    }

    /// Map an `image` crate error, keeping I/O failures distinct from codec ones
    pub(crate) fn from_image(path: impl Into<PathBuf>, err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(source) => Self::io(path, source),
            image::ImageError::Unsupported(e) => CompressError::Codec(e.to_string()),
            other => CompressError::Codec(other.to_string()),
        }
    }

    /// Failure classification used in skipped-run records
    pub fn kind(&self) -> FailureKind {
        match self {
            CompressError::UnsupportedFormat(_) => FailureKind::UnsupportedFormat,
            CompressError::Io { .. } => FailureKind::Io,
            CompressError::Codec(_) => FailureKind::Codec,
        }
    }
}

/// Why an attempted run produced no [`CompressionRun`](crate::CompressionRun)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    /// Format outside the supported set, or not encodable by the backend
    UnsupportedFormat,
    /// Input unreadable or output unwritable
    Io,
    /// Decoder or encoder error
    Codec,
    /// Backend panicked
    Panicked,
    /// Run never started because the benchmark was cancelled
    Cancelled,
    /// Another input already claims the same output file names
    OutputConflict,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FailureKind::UnsupportedFormat => "unsupported-format",
            FailureKind::Io => "io",
            FailureKind::Codec => "codec",
            FailureKind::Panicked => "panicked",
            FailureKind::Cancelled => "cancelled",
            FailureKind::OutputConflict => "output-conflict",
        };
        f.write_str(s)
    }
}
