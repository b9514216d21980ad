//! `imageops` backend: Lanczos3 resampling and the `image` crate's encoders.

use super::{encode_with_image, png_compression_for};
use crate::backend::Backend;
use crate::error::CompressError;
use crate::format::ImageFormat;
use image::DynamicImage;
use image::imageops::FilterType;

/// High-quality reference backend
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageOpsBackend;

impl Backend for ImageOpsBackend {
    fn id(&self) -> &'static str {
        "imageops"
    }

    fn description(&self) -> &'static str {
        "image crate, Lanczos3 resampling"
    }

    fn resize(&self, image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
        image.resize_exact(width, height, FilterType::Lanczos3)
    }

    fn encode(
        &self,
        image: &DynamicImage,
        format: ImageFormat,
        quality: u8,
    ) -> Result<Vec<u8>, CompressError> {
        encode_with_image(image, format, quality, png_compression_for(quality))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::gradient;
    use super::*;
    use crate::backend::CompressRequest;
    use image::GenericImageView;

    #[test]
    fn test_compress_writes_one_bounded_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("wide.png");
        gradient(400, 100).save(&input).unwrap();
        let out = dir.path().join("out");
        std::fs::create_dir(&out).unwrap();

        let request = CompressRequest {
            input: &input,
            target_size: 200,
            format: "png",
            output_dir: &out,
            quality: 75,
        };
        let run = ImageOpsBackend.compress(&request).unwrap();

        assert_eq!(run.file_name, "wide.png");
        assert_eq!(run.backend, "imageops");
        assert_eq!(run.format, "png");
        assert_eq!(run.input_size, std::fs::metadata(&input).unwrap().len());

        let written = out.join("wide_imageops_200.png");
        assert_eq!(run.output_size, std::fs::metadata(&written).unwrap().len());
        assert_eq!(image::open(&written).unwrap().dimensions(), (200, 50));
        assert_eq!(std::fs::read_dir(&out).unwrap().count(), 1);
    }

    #[test]
    fn test_unsupported_format_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("a.png");
        gradient(10, 10).save(&input).unwrap();

        let request = CompressRequest {
            input: &input,
            target_size: 8,
            format: "tiff",
            output_dir: dir.path(),
            quality: 75,
        };
        let err = ImageOpsBackend.compress(&request).unwrap_err();
        assert!(matches!(err, CompressError::UnsupportedFormat(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
