//! Image processing in pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` (format from media type, or sniffed) |
//! | **Downscale** | Lanczos3 `resize_exact` |
//! | **Encode** | `image` JPEG encoder at a 0.0–1.0 quality factor |
//! | **Watermark** | scaled logo, source-over blend at constant opacity |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension and placement math (unit testable)
//! - **Parameters**: Quality factor, byte-budget target, resize parameters
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Blend**: Layer composition used by the watermark compositor

pub mod backend;
pub mod blend;
mod calculations;
mod params;
pub mod rust_backend;

pub use backend::{DecodeError, Dimensions, EncodingError, ImageBackend};
pub use calculations::{
    LogoPlacement, calculate_downscale_dimensions, calculate_logo_placement, next_index,
    previous_index,
};
pub use params::{EncodingTarget, Quality, ResizeParams};
pub use rust_backend::RustBackend;
