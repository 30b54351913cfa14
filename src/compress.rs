//! Byte-budget re-encoding.
//!
//! Brings an arbitrarily large photo into a target byte window without a
//! fixed quality setting:
//!
//! 1. Inputs already at or below `max_bytes` pass through untouched: no
//!    decode or re-encode, and the original bytes and media type are kept.
//! 2. Larger inputs are decoded; if either edge exceeds `max_dimension` the
//!    raster is downscaled so the longer edge equals the cap.
//! 3. A bounded bisection over the JPEG quality factor runs until an encode
//!    lands inside `[min_bytes, max_bytes]` or the attempt budget runs out.
//!
//! ## Search
//!
//! ```text
//! bracket = [0.0, 1.0], first probe = 0.8
//! too big   → bracket.high = probe
//! too small → bracket.low  = probe
//! next probe = midpoint of the bracket
//! ```
//!
//! The loop is deterministic: at most `max_iterations` encodes per image (7
//! by default), whatever the content, which bounds worst-case latency.
//!
//! When the budget runs out the *last* attempt is returned, even if an
//! earlier attempt had landed under the window. Callers can tell this case
//! apart through [`CompressionOutcome::ForcedAtCap`].

use crate::imaging::{
    DecodeError, Dimensions, EncodingError, EncodingTarget, ImageBackend, Quality, ResizeParams,
    calculate_downscale_dimensions,
};
use crate::source::{MediaType, SourceImage};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum CompressError {
    #[error("Decode failed: {0}")]
    Decode(#[from] DecodeError),
    #[error("Encode failed: {0}")]
    Encoding(#[from] EncodingError),
}

/// How a [`CompressionResult`] came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompressionOutcome {
    /// Input was already small enough; bytes are the original.
    Unchanged,
    /// An attempt landed inside the byte window.
    WithinWindow,
    /// The attempt budget ran out outside the window.
    ForcedAtCap,
}

/// The quality interval still in play when the search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityBracket {
    pub low: f32,
    pub high: f32,
}

impl QualityBracket {
    pub fn width(&self) -> f32 {
        self.high - self.low
    }
}

/// Encoded output for one source image.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionResult {
    pub bytes: Vec<u8>,
    pub media_type: MediaType,
    /// Quality of the returned encode; `None` when unchanged.
    pub quality: Option<Quality>,
    /// Encode attempts consumed (0 when unchanged).
    pub attempts: u32,
    pub outcome: CompressionOutcome,
    pub bracket: Option<QualityBracket>,
    /// Decoded size of the source; `None` when no decode happened.
    pub original_dimensions: Option<Dimensions>,
    /// Size of the encoded raster; `None` when unchanged.
    pub encoded_dimensions: Option<Dimensions>,
}

impl CompressionResult {
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    fn unchanged(source: &SourceImage) -> Self {
        Self {
            bytes: source.bytes().to_vec(),
            media_type: source.media_type().clone(),
            quality: None,
            attempts: 0,
            outcome: CompressionOutcome::Unchanged,
            bracket: None,
            original_dimensions: None,
            encoded_dimensions: None,
        }
    }
}

/// Bisection state over the quality factor.
#[derive(Debug, Clone, Copy)]
struct QualitySearch {
    low: f32,
    high: f32,
    probe: f32,
}

impl QualitySearch {
    fn new() -> Self {
        Self {
            low: 0.0,
            high: 1.0,
            probe: Quality::INITIAL_PROBE.value(),
        }
    }

    /// Fold one measurement into the bracket and move the probe.
    fn narrow(&mut self, size: usize, target: &EncodingTarget) {
        if size > target.max_bytes {
            self.high = self.probe;
        } else {
            self.low = self.probe;
        }
        self.probe = (self.low + self.high) / 2.0;
    }

    fn bracket(&self) -> QualityBracket {
        QualityBracket {
            low: self.low,
            high: self.high,
        }
    }
}

/// Re-encode `source` into the byte window of `target`.
///
/// Decode and encode failures are returned to the caller; they are fatal for
/// this image only.
pub fn compress(
    backend: &impl ImageBackend,
    source: &SourceImage,
    target: &EncodingTarget,
) -> Result<CompressionResult, CompressError> {
    if source.byte_len() <= target.max_bytes {
        debug!(
            name = source.name(),
            size = source.byte_len(),
            "already within budget"
        );
        return Ok(CompressionResult::unchanged(source));
    }

    let decoded = backend.decode(source.bytes(), source.media_type())?;
    let original = Dimensions::of(&decoded);

    let raster = match calculate_downscale_dimensions(original.as_tuple(), target.max_dimension) {
        Some((width, height)) => {
            debug!(
                name = source.name(),
                from = ?original.as_tuple(),
                to = ?(width, height),
                "downscaling"
            );
            let resized = backend.resize(&decoded, &ResizeParams { width, height })?;
            drop(decoded);
            resized
        }
        None => decoded,
    };

    let max_attempts = target.max_iterations.max(1);
    let mut search = QualitySearch::new();
    let mut attempt = 0;

    loop {
        let quality = Quality::new(search.probe);
        let bytes = backend.encode_jpeg(&raster, quality)?;
        let size = bytes.len();
        attempt += 1;
        debug!(
            name = source.name(),
            attempt,
            quality = quality.value(),
            size,
            "encode attempt"
        );

        let in_window = target.contains(size);
        if in_window || attempt >= max_attempts {
            let outcome = if in_window {
                CompressionOutcome::WithinWindow
            } else {
                // Fold in the final measurement so the bracket reflects
                // everything the search learned.
                search.narrow(size, target);
                CompressionOutcome::ForcedAtCap
            };
            return Ok(CompressionResult {
                bytes,
                media_type: MediaType::new("image/jpeg"),
                quality: Some(quality),
                attempts: attempt,
                outcome,
                bracket: Some(search.bracket()),
                original_dimensions: Some(original),
                encoded_dimensions: Some(Dimensions::of(&raster)),
            });
        }

        search.narrow(size, target);
    }
}
