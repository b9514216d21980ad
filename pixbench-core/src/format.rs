//! Image Formats
//!
//! The fixed set of formats every backend is benchmarked against. Formats are
//! identified by their lower-case file extension token; `jpg` and `jpeg` are the
//! same format but keep their own token so output names follow the input.

use crate::error::CompressError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Every extension token accepted as input and output
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "webp"];

/// Output format for a compression run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// JPEG (`.jpg` / `.jpeg`)
    Jpeg,
    /// PNG
    Png,
    /// Windows bitmap
    Bmp,
    /// WebP
    WebP,
}

impl ImageFormat {
    /// All formats, in display order
    pub const ALL: [ImageFormat; 4] = [
        ImageFormat::Jpeg,
        ImageFormat::Png,
        ImageFormat::Bmp,
        ImageFormat::WebP,
    ];

    /// Parse an extension token, ignoring case
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "png" => Some(ImageFormat::Png),
            "bmp" => Some(ImageFormat::Bmp),
            "webp" => Some(ImageFormat::WebP),
            _ => None,
        }
    }

    /// Parse an extension token, failing with [`CompressError::UnsupportedFormat`]
    pub fn parse(token: &str) -> Result<Self, CompressError> {
        Self::from_token(token).ok_or_else(|| CompressError::UnsupportedFormat(token.to_string()))
    }

    /// Format of a path, judged by its extension alone
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_token)
    }

    /// Canonical extension used when no input token is available
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Png => "png",
            ImageFormat::Bmp => "bmp",
            ImageFormat::WebP => "webp",
        }
    }

    /// Whether encoding discards information (and therefore honours quality)
    pub fn is_lossy(self) -> bool {
        matches!(self, ImageFormat::Jpeg | ImageFormat::WebP)
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Lower-case extension token of a supported image path
///
/// Returns `None` when the path has no extension or the extension is not one of
/// [`SUPPORTED_EXTENSIONS`].
pub fn format_token(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    SUPPORTED_EXTENSIONS
        .contains(&ext.as_str())
        .then_some(ext)
}
