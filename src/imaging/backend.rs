//! Pixel buffer adapter: the trait every imaging backend implements.
//!
//! The [`ImageBackend`] trait defines the three primitives the pipeline is
//! built from: decode encoded bytes into a raster, resample a raster, and
//! encode a raster back to JPEG at a quality factor.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), pure Rust and statically
//! linked. Rasters are plain [`DynamicImage`] values owned by the caller, so
//! every scratch buffer a call allocates is released when the call returns,
//! whether it succeeded or not.

use super::params::{Quality, ResizeParams};
use crate::source::MediaType;
use image::DynamicImage;
use thiserror::Error;

/// Failure to turn encoded bytes into a raster.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed image data: {0}")]
    Malformed(String),
    #[error("Unsupported media type: {0}")]
    UnsupportedType(String),
    #[error("Refusing cross-origin image reference: {0}")]
    CrossOrigin(String),
}

/// Failure to draw or encode a raster.
#[derive(Error, Debug)]
pub enum EncodingError {
    #[error("No drawing surface available: {0}")]
    SurfaceUnavailable(String),
    #[error("JPEG encode failed: {0}")]
    Encode(String),
}

/// Width and height of a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn of(image: &DynamicImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }

    pub fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Trait for image processing backends.
///
/// `Send + Sync` because the compositor decodes the photo and the logo on
/// two rayon workers at once and runs jobs on background threads.
pub trait ImageBackend: Send + Sync {
    /// Decode encoded bytes of the declared media type into a raster.
    fn decode(&self, bytes: &[u8], media_type: &MediaType) -> Result<DynamicImage, DecodeError>;

    /// Resample a raster to exact dimensions.
    fn resize(
        &self,
        image: &DynamicImage,
        params: &ResizeParams,
    ) -> Result<DynamicImage, EncodingError>;

    /// Encode a raster as baseline JPEG.
    fn encode_jpeg(&self, image: &DynamicImage, quality: Quality)
    -> Result<Vec<u8>, EncodingError>;
}
