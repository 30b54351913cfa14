//! Shared test utilities: synthetic image fixtures built in memory.
//!
//! Flat-color images compress to almost nothing, so anything that has to
//! exercise the byte-budget search uses [`noise_image`], whose encoded size
//! responds to the quality factor the way a photo's does.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let bytes = jpeg_bytes(800, 600, 95);
//! let source = jpeg_source("kitchen.jpg", &bytes);
//! ```

use crate::source::{MediaType, SourceImage};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, RgbImage};
use std::io::Cursor;

// =========================================================================
// Rasters
// =========================================================================

/// Deterministic RGB noise with a soft gradient underneath.
pub fn noise_image(width: u32, height: u32, seed: u32) -> DynamicImage {
    let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
    let img = RgbImage::from_fn(width, height, |x, y| {
        // Linear congruential step; plenty for texture
        state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        let n = (state >> 24) as u8;
        let gx = (x * 255 / width.max(1)) as u8;
        let gy = (y * 255 / height.max(1)) as u8;
        image::Rgb([
            gx.wrapping_add(n / 2),
            gy.wrapping_add(n / 3),
            n,
        ])
    });
    DynamicImage::ImageRgb8(img)
}

// =========================================================================
// Encoded payloads
// =========================================================================

/// A noise JPEG at the given 1-100 quality.
pub fn jpeg_bytes(width: u32, height: u32, quality: u8) -> Vec<u8> {
    let rgb = noise_image(width, height, width ^ height).to_rgb8();
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality)
        .encode_image(&rgb)
        .unwrap();
    buf
}

/// A noise PNG.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    noise_image(width, height, width + height)
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

// =========================================================================
// Sources
// =========================================================================

pub fn jpeg_source(name: &str, bytes: &[u8]) -> SourceImage {
    SourceImage::new(name, bytes.to_vec(), MediaType::new("image/jpeg"))
}

pub fn png_source(name: &str, bytes: &[u8]) -> SourceImage {
    SourceImage::new(name, bytes.to_vec(), MediaType::new("image/png"))
}
