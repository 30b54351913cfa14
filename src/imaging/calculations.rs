//! Pure calculation functions for image dimensions and placement.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate the dimensions an oversized image is downscaled to.
///
/// Returns `None` when neither edge exceeds `max_dimension`. Otherwise the
/// longer edge becomes `max_dimension` and the other edge is recomputed from
/// the original aspect ratio. Square images count as landscape.
///
/// # Examples
/// ```
/// # use listing_photos::imaging::calculate_downscale_dimensions;
/// assert_eq!(calculate_downscale_dimensions((4000, 3000), 2500), Some((2500, 1875)));
/// assert_eq!(calculate_downscale_dimensions((1200, 800), 2500), None);
/// ```
pub fn calculate_downscale_dimensions(original: (u32, u32), max_dimension: u32) -> Option<(u32, u32)> {
    let (width, height) = original;
    if width <= max_dimension && height <= max_dimension {
        return None;
    }

    let ratio = width as f64 / height as f64;
    if width >= height {
        let h = (max_dimension as f64 / ratio).round() as u32;
        Some((max_dimension, h.max(1)))
    } else {
        let w = (max_dimension as f64 * ratio).round() as u32;
        Some((w.max(1), max_dimension))
    }
}

/// Where and how large the logo is drawn over a photo.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogoPlacement {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl LogoPlacement {
    /// Snap the placement to whole pixels: `(x, y, width, height)`.
    ///
    /// Width and height never drop below one pixel so a tiny photo still
    /// receives a (tiny) mark.
    pub fn to_pixels(&self) -> (i64, i64, u32, u32) {
        (
            self.x.round() as i64,
            self.y.round() as i64,
            (self.width.round() as u32).max(1),
            (self.height.round() as u32).max(1),
        )
    }
}

/// Calculate a logo placement centered on a photo.
///
/// The logo width is `scale` times the photo width; the height follows from
/// the logo's own aspect ratio.
///
/// # Examples
/// ```
/// # use listing_photos::imaging::calculate_logo_placement;
/// let p = calculate_logo_placement((1200, 800), (300, 100), 0.30);
/// assert_eq!((p.x, p.y, p.width, p.height), (420.0, 340.0, 360.0, 120.0));
/// ```
pub fn calculate_logo_placement(photo: (u32, u32), logo: (u32, u32), scale: f64) -> LogoPlacement {
    let (photo_w, photo_h) = (photo.0 as f64, photo.1 as f64);
    let logo_aspect = logo.0 as f64 / logo.1.max(1) as f64;

    let width = photo_w * scale;
    let height = width / logo_aspect;

    LogoPlacement {
        x: (photo_w - width) / 2.0,
        y: (photo_h - height) / 2.0,
        width,
        height,
    }
}

/// Index after `current` in a carousel of `len` items, wrapping to 0.
pub fn next_index(current: usize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    if current + 1 >= len { 0 } else { current + 1 }
}

/// Index before `current` in a carousel of `len` items, wrapping to the end.
pub fn previous_index(current: usize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    if current == 0 || current >= len {
        len - 1
    } else {
        current - 1
    }
}
