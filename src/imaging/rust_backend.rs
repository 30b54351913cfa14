//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::ImageReader` with the format named by the media type |
//! | Decode (`image/*`, unknown subtype) | `ImageReader::with_guessed_format` (content sniffing) |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder::new_with_quality` |

use super::backend::{DecodeError, EncodingError, ImageBackend};
use super::params::{Quality, ResizeParams};
use crate::source::MediaType;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageError, ImageReader};
use std::io::Cursor;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_failure(media_type: &MediaType, err: ImageError) -> DecodeError {
    match err {
        ImageError::Unsupported(e) => {
            DecodeError::UnsupportedType(format!("{}: {}", media_type, e))
        }
        ImageError::IoError(e) => DecodeError::Io(e),
        other => DecodeError::Malformed(format!("{}: {}", media_type, other)),
    }
}

impl ImageBackend for RustBackend {
    fn decode(&self, bytes: &[u8], media_type: &MediaType) -> Result<DynamicImage, DecodeError> {
        let reader = match media_type.image_format()? {
            Some(format) => ImageReader::with_format(Cursor::new(bytes), format),
            None => ImageReader::new(Cursor::new(bytes)).with_guessed_format()?,
        };
        if reader.format().is_none() {
            return Err(DecodeError::UnsupportedType(format!(
                "{}: unrecognized image data",
                media_type
            )));
        }
        reader.decode().map_err(|e| decode_failure(media_type, e))
    }

    fn resize(
        &self,
        image: &DynamicImage,
        params: &ResizeParams,
    ) -> Result<DynamicImage, EncodingError> {
        if params.width == 0 || params.height == 0 {
            return Err(EncodingError::SurfaceUnavailable(format!(
                "cannot resample to {}x{}",
                params.width, params.height
            )));
        }
        Ok(image.resize_exact(params.width, params.height, FilterType::Lanczos3))
    }

    fn encode_jpeg(
        &self,
        image: &DynamicImage,
        quality: Quality,
    ) -> Result<Vec<u8>, EncodingError> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(EncodingError::SurfaceUnavailable(format!(
                "empty {}x{} raster",
                width, height
            )));
        }

        // JPEG has no alpha channel; flatten to RGB first.
        let rgb = image.to_rgb8();
        let mut buf = Vec::new();
        JpegEncoder::new_with_quality(&mut buf, quality.jpeg_scale())
            .write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
            .map_err(|e| EncodingError::Encode(e.to_string()))?;
        Ok(buf)
    }
}
