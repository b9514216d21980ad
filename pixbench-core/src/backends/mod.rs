//! Built-in Backends
//!
//! | id          | resize                         | encode                              |
//! |-------------|--------------------------------|-------------------------------------|
//! | `imageops`  | Lanczos3 (`image::imageops`)   | `image` encoders                    |
//! | `thumbnail` | integer sampling (`thumbnail`) | `image` encoders, fast PNG          |
//! | `libwebp`   | Triangle (`image::imageops`)   | libwebp for WebP, `image` otherwise |

mod imageops;
mod libwebp;
mod thumbnail;

pub use imageops::ImageOpsBackend;
pub use libwebp::LibWebpBackend;
pub use thumbnail::ThumbnailBackend;

use crate::error::CompressError;
use crate::format::ImageFormat;
use image::codecs::bmp::BmpEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::{ColorType, DynamicImage, GenericImageView, ImageEncoder};

/// Encode with the `image` crate's built-in encoders
///
/// JPEG honours `quality`; PNG uses `png_compression`; BMP and (lossless) WebP
/// ignore both.
pub(crate) fn encode_with_image(
    image: &DynamicImage,
    format: ImageFormat,
    quality: u8,
    png_compression: CompressionType,
) -> Result<Vec<u8>, CompressError> {
    let (width, height) = image.dimensions();
    let mut buf = Vec::new();

    let result = match format {
        ImageFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb = image.to_rgb8();
            JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100)).write_image(
                rgb.as_raw(),
                width,
                height,
                ColorType::Rgb8,
            )
        }
        ImageFormat::Png => {
            let (pixels, color) = flatten(image);
            PngEncoder::new_with_quality(&mut buf, png_compression, PngFilter::Adaptive)
                .write_image(&pixels, width, height, color)
        }
        ImageFormat::Bmp => {
            let (pixels, color) = flatten(image);
            BmpEncoder::new(&mut buf).write_image(&pixels, width, height, color)
        }
        ImageFormat::WebP => {
            let (pixels, color) = flatten(image);
            WebPEncoder::new_lossless(&mut buf).write_image(&pixels, width, height, color)
        }
    };

    result.map_err(|e| CompressError::Codec(format!("{} encode: {}", format, e)))?;
    Ok(buf)
}

/// 8-bit RGB or RGBA pixels, keeping alpha only when the source has it
fn flatten(image: &DynamicImage) -> (Vec<u8>, ColorType) {
    if image.color().has_alpha() {
        (image.to_rgba8().into_raw(), ColorType::Rgba8)
    } else {
        (image.to_rgb8().into_raw(), ColorType::Rgb8)
    }
}

/// Map a 1..=100 quality onto PNG compression effort
pub(crate) fn png_compression_for(quality: u8) -> CompressionType {
    match quality {
        80.. => CompressionType::Best,
        40..=79 => CompressionType::Default,
        _ => CompressionType::Fast,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};

    /// Gradient test image with some structure for the encoders to chew on
    pub fn gradient(width: u32, height: u32) -> DynamicImage {
        let img = RgbImage::from_fn(width, height, |x, y| {
            Rgb([
                (x * 255 / width.max(1)) as u8,
                (y * 255 / height.max(1)) as u8,
                ((x ^ y) & 0xff) as u8,
            ])
        });
        DynamicImage::ImageRgb8(img)
    }

    /// Gradient with a varying alpha channel
    pub fn gradient_rgba(width: u32, height: u32) -> DynamicImage {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 128, ((x + y) % 256) as u8])
        });
        DynamicImage::ImageRgba8(img)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_every_format_round_trips_through_decoder() {
        let img = gradient(40, 30);
        for format in ImageFormat::ALL {
            let bytes = encode_with_image(&img, format, 75, CompressionType::Fast).unwrap();
            let decoded = image::load_from_memory(&bytes).unwrap();
            assert_eq!((decoded.width(), decoded.height()), (40, 30), "{}", format);
        }
    }

    #[test]
    fn test_jpeg_drops_alpha() {
        let img = gradient_rgba(16, 16);
        let bytes = encode_with_image(&img, ImageFormat::Jpeg, 90, CompressionType::Fast).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert!(!decoded.color().has_alpha());
    }

    #[test]
    fn test_png_keeps_alpha() {
        let img = gradient_rgba(16, 16);
        let bytes = encode_with_image(&img, ImageFormat::Png, 90, CompressionType::Fast).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert!(decoded.color().has_alpha());
    }

    #[test]
    fn test_png_compression_mapping() {
        assert!(matches!(png_compression_for(100), CompressionType::Best));
        assert!(matches!(png_compression_for(75), CompressionType::Default));
        assert!(matches!(png_compression_for(10), CompressionType::Fast));
    }
}
