//! Backend Contract
//!
//! A backend is one way of resizing and re-encoding an image. Backends only
//! decide *how* to resize and *how* to encode; reading the input, fitting the
//! dimensions, the atomic output write and measurement are shared by every
//! backend through [`Backend::compress`].
//!
//! ## Pipeline
//!
//! ```text
//!  CompressRequest
//!        │  parse format token ───────────▶ UnsupportedFormat
//!        ▼
//!  ┌────────────┐  read input ─────────────▶ Io
//!  │  RunTimer  │  decode ─────────────────▶ Codec
//!  │  (started) │  Backend::resize
//!  │            │  Backend::encode ────────▶ Codec
//!  │            │  write .partial + rename ▶ Io
//!  └─────┬──────┘
//!        ▼
//!  CompressionRun
//! ```

use crate::error::CompressError;
use crate::format::ImageFormat;
use crate::measure::RunTimer;
use crate::run::CompressionRun;
use image::{DynamicImage, GenericImageView};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Inputs for a single compression attempt
#[derive(Debug, Clone, Copy)]
pub struct CompressRequest<'a> {
    /// Existing, readable image file
    pub input: &'a Path,
    /// Longest-edge pixel bound (values below 1 are treated as 1)
    pub target_size: u32,
    /// Output format token (`jpg`, `jpeg`, `png`, `bmp`, `webp`)
    pub format: &'a str,
    /// Writable directory receiving the output file
    pub output_dir: &'a Path,
    /// Encode quality, 1..=100, interpreted by the backend
    pub quality: u8,
}

impl CompressRequest<'_> {
    /// Path of the file a backend writes for this request
    pub fn output_path(&self, backend_id: &str) -> PathBuf {
        self.output_dir.join(output_file_name(
            self.input,
            backend_id,
            self.target_size,
            self.format,
        ))
    }
}

/// A compression capability benchmarked by PixBench
pub trait Backend: Send + Sync {
    /// Stable identifier, used in reports and output file names
    fn id(&self) -> &'static str;

    /// One-line description for listings
    fn description(&self) -> &'static str;

    /// Whether this backend can encode `format`
    fn supports(&self, _format: ImageFormat) -> bool {
        true
    }

    /// Resize to exactly `width` x `height`
    fn resize(&self, image: &DynamicImage, width: u32, height: u32) -> DynamicImage;

    /// Encode into an in-memory buffer
    fn encode(
        &self,
        image: &DynamicImage,
        format: ImageFormat,
        quality: u8,
    ) -> Result<Vec<u8>, CompressError>;

    /// Decode, resize, encode and write one image, measuring the whole operation
    ///
    /// Writes exactly one file on success and none on failure.
    fn compress(&self, request: &CompressRequest<'_>) -> Result<CompressionRun, CompressError> {
        run_pipeline(self, request)
    }
}

fn run_pipeline<B: Backend + ?Sized>(
    backend: &B,
    request: &CompressRequest<'_>,
) -> Result<CompressionRun, CompressError> {
    let format = ImageFormat::parse(request.format)?;
    if !backend.supports(format) {
        return Err(CompressError::UnsupportedFormat(format!(
            "{} (not encodable by {})",
            request.format,
            backend.id()
        )));
    }

    let file_name = request
        .input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let output_path = request.output_path(backend.id());

    let timer = RunTimer::start();

    let bytes = fs::read(request.input).map_err(|e| CompressError::io(request.input, e))?;
    let decoded =
        image::load_from_memory(&bytes).map_err(|e| CompressError::from_image(request.input, e))?;

    let (width, height) = decoded.dimensions();
    let (fit_w, fit_h) = fit_within(width, height, request.target_size);
    let resized = if (fit_w, fit_h) == (width, height) {
        None
    } else {
        Some(backend.resize(&decoded, fit_w, fit_h))
    };

    let encoded = backend.encode(resized.as_ref().unwrap_or(&decoded), format, request.quality)?;
    write_atomically(&output_path, &encoded)?;

    // Snapshot while the decoded and encoded buffers are still alive
    let measurement = timer.stop();

    trace!(
        backend = backend.id(),
        file = %file_name,
        from = ?(width, height),
        to = ?(fit_w, fit_h),
        "compressed"
    );

    Ok(CompressionRun {
        file_name,
        backend: backend.id().to_string(),
        target_size: request.target_size,
        format: request.format.to_ascii_lowercase(),
        elapsed_ms: measurement.elapsed_ms(),
        memory_delta: measurement.memory_delta,
        input_size: bytes.len() as u64,
        output_size: encoded.len() as u64,
    })
}

/// Largest dimensions within `target` x `target` that keep the aspect ratio
///
/// Images already inside the bound are returned unchanged; they are never
/// upscaled. Neither returned dimension is below 1.
pub fn fit_within(width: u32, height: u32, target: u32) -> (u32, u32) {
    let target = target.max(1);
    if width <= target && height <= target {
        return (width, height);
    }

    let (w, h) = (u64::from(width), u64::from(height));
    let t = u64::from(target);
    let (new_w, new_h) = if w >= h {
        (t, (h * t + w / 2) / w)
    } else {
        ((w * t + h / 2) / h, t)
    };

    (
        u32::try_from(new_w).unwrap_or(target).max(1),
        u32::try_from(new_h).unwrap_or(target).max(1),
    )
}

/// Deterministic output name: `<stem>_<backend>_<size>.<format>`
pub fn output_file_name(input: &Path, backend_id: &str, target_size: u32, format: &str) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    format!(
        "{}_{}_{}.{}",
        stem,
        backend_id,
        target_size,
        format.to_ascii_lowercase()
    )
}

/// Write `bytes` to `path` via a hidden `.partial` sibling and a rename
///
/// On error the partial file is removed, leaving nothing behind.
pub fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), CompressError> {
    let partial = partial_path(path);
    if let Err(e) = fs::write(&partial, bytes) {
        let _ = fs::remove_file(&partial);
        return Err(CompressError::io(path, e));
    }
    if let Err(e) = fs::rename(&partial, path) {
        let _ = fs::remove_file(&partial);
        return Err(CompressError::io(path, e));
    }
    Ok(())
}

/// Hidden sibling of `path` used while writing
pub fn partial_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.partial", name))
}
