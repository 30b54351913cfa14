//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the pipeline stages ([`compress`](crate::compress),
//! [`watermark`](crate::watermark)) and the [`backend`](super::backend) that
//! does the actual pixel work, so a mock backend can stand in during tests.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality factor (0.0–1.0). Clamped on construction.
//! - [`EncodingTarget`]: The byte window, dimension cap and attempt budget of the re-encoder.
//! - [`ResizeParams`]: Target dimensions for a resample.

/// Quality factor for lossy JPEG encoding, in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Quality(f32);

impl Quality {
    /// Quality of the first bisection probe.
    pub const INITIAL_PROBE: Quality = Quality(0.8);

    /// Quality of the published watermark composite.
    pub const COMPOSITE: Quality = Quality(0.95);

    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            return Self(0.0);
        }
        Self(value.clamp(0.0, 1.0))
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// Map onto the 1–100 scale JPEG encoders take.
    ///
    /// `0.0` still produces a decodable file, so the bottom of the range is 1.
    pub fn jpeg_scale(self) -> u8 {
        ((self.0 * 100.0).round() as u8).clamp(1, 100)
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self::INITIAL_PROBE
    }
}

/// Byte-size window and search budget for the re-encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingTarget {
    /// Smallest acceptable encoded size, inclusive.
    pub min_bytes: usize,
    /// Largest acceptable encoded size, inclusive. Inputs at or below this
    /// size are passed through untouched.
    pub max_bytes: usize,
    /// Longer-edge cap applied before the quality search.
    pub max_dimension: u32,
    /// Encode attempts before a forced stop.
    pub max_iterations: u32,
}

impl EncodingTarget {
    pub const MIN_BYTES: usize = 100 * 1024;
    pub const MAX_BYTES: usize = 150 * 1024;
    pub const MAX_DIMENSION: u32 = 2500;
    pub const MAX_ITERATIONS: u32 = 7;

    /// Whether an encoded payload of `size` bytes lands inside the window.
    pub fn contains(&self, size: usize) -> bool {
        (self.min_bytes..=self.max_bytes).contains(&size)
    }
}

impl Default for EncodingTarget {
    fn default() -> Self {
        Self {
            min_bytes: Self::MIN_BYTES,
            max_bytes: Self::MAX_BYTES,
            max_dimension: Self::MAX_DIMENSION,
            max_iterations: Self::MAX_ITERATIONS,
        }
    }
}

/// Parameters for a resample to exact dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeParams {
    pub width: u32,
    pub height: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(-0.5).value(), 0.0);
        assert_eq!(Quality::new(0.5).value(), 0.5);
        assert_eq!(Quality::new(1.5).value(), 1.0);
        assert_eq!(Quality::new(f32::NAN).value(), 0.0);
    }

    #[test]
    fn quality_default_is_first_probe() {
        assert_eq!(Quality::default().value(), 0.8);
    }

    #[test]
    fn jpeg_scale_never_reaches_zero() {
        assert_eq!(Quality::new(0.0).jpeg_scale(), 1);
        assert_eq!(Quality::new(0.8).jpeg_scale(), 80);
        assert_eq!(Quality::COMPOSITE.jpeg_scale(), 95);
        assert_eq!(Quality::new(1.0).jpeg_scale(), 100);
    }

    #[test]
    fn default_target_is_100_to_150_kib() {
        let target = EncodingTarget::default();
        assert_eq!(target.min_bytes, 102_400);
        assert_eq!(target.max_bytes, 153_600);
        assert_eq!(target.max_dimension, 2500);
        assert_eq!(target.max_iterations, 7);
    }

    #[test]
    fn window_is_inclusive_on_both_edges() {
        let target = EncodingTarget::default();
        assert!(target.contains(102_400));
        assert!(target.contains(153_600));
        assert!(!target.contains(102_399));
        assert!(!target.contains(153_601));
    }
}
