//! `thumbnail` backend: fast integer sampling, speed-oriented encoder settings.

use super::encode_with_image;
use crate::backend::Backend;
use crate::error::CompressError;
use crate::format::ImageFormat;
use image::DynamicImage;
use image::codecs::png::CompressionType;

/// Throughput-oriented backend
#[derive(Debug, Clone, Copy, Default)]
pub struct ThumbnailBackend;

impl Backend for ThumbnailBackend {
    fn id(&self) -> &'static str {
        "thumbnail"
    }

    fn description(&self) -> &'static str {
        "image crate, integer thumbnail sampling, fast PNG"
    }

    fn resize(&self, image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
        image.thumbnail_exact(width, height)
    }

    fn encode(
        &self,
        image: &DynamicImage,
        format: ImageFormat,
        quality: u8,
    ) -> Result<Vec<u8>, CompressError> {
        encode_with_image(image, format, quality, CompressionType::Fast)
    }
}
