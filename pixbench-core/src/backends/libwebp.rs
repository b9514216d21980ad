//! `libwebp` backend: Triangle resampling, lossy WebP through libwebp.
//!
//! WebP output goes through the `webp` crate's libwebp bindings at the
//! configured quality; the other formats fall back to the `image` encoders.

use super::encode_with_image;
use crate::backend::Backend;
use crate::error::CompressError;
use crate::format::ImageFormat;
use image::DynamicImage;
use image::codecs::png::CompressionType;
use image::imageops::{self, FilterType};

/// Backend built on libwebp's lossy encoder
#[derive(Debug, Clone, Copy, Default)]
pub struct LibWebpBackend;

impl Backend for LibWebpBackend {
    fn id(&self) -> &'static str {
        "libwebp"
    }

    fn description(&self) -> &'static str {
        "libwebp lossy WebP, Triangle resampling"
    }

    fn resize(&self, image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
        let resized =
            DynamicImage::ImageRgba8(imageops::resize(image, width, height, FilterType::Triangle));
        if image.color().has_alpha() {
            resized
        } else {
            DynamicImage::ImageRgb8(resized.to_rgb8())
        }
    }

    fn encode(
        &self,
        image: &DynamicImage,
        format: ImageFormat,
        quality: u8,
    ) -> Result<Vec<u8>, CompressError> {
        match format {
            ImageFormat::WebP => encode_webp(image, quality),
            other => encode_with_image(image, other, quality, CompressionType::Default),
        }
    }
}

fn encode_webp(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, CompressError> {
    // libwebp only accepts 8-bit RGB(A)
    let converted;
    let image = match image {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => image,
        other if other.color().has_alpha() => {
            converted = DynamicImage::ImageRgba8(other.to_rgba8());
            &converted
        }
        other => {
            converted = DynamicImage::ImageRgb8(other.to_rgb8());
            &converted
        }
    };

    let encoder = webp::Encoder::from_image(image)
        .map_err(|reason| CompressError::Codec(format!("webp encoder: {}", reason)))?;
    // `Encoder::encode` unwraps the libwebp result; go through the fallible call
    let memory = encoder
        .encode_simple(false, f32::from(quality.clamp(1, 100)))
        .map_err(|code| CompressError::Codec(format!("webp encoder: {:?}", code)))?;
    Ok(memory.to_vec())
}
