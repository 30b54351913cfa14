//! Layer composition: draw one raster over another with a constant opacity.
//!
//! Blending is source-over in straight (non-premultiplied) alpha. The layer
//! opacity multiplies each logo pixel's own alpha and applies to that one
//! draw only; the base layer always lands at full opacity.

use super::calculations::LogoPlacement;
use image::{DynamicImage, Rgba, RgbaImage};

/// Draw `layer` over `base` with its top-left corner at `(x, y)`.
///
/// Pixels falling outside `base` are clipped. `opacity` is clamped to `0..=1`.
pub fn overlay(base: &mut RgbaImage, layer: &RgbaImage, x: i64, y: i64, opacity: f32) {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity == 0.0 {
        return;
    }

    for (lx, ly, src) in layer.enumerate_pixels() {
        let tx = x + lx as i64;
        let ty = y + ly as i64;
        if tx < 0 || ty < 0 || tx >= base.width() as i64 || ty >= base.height() as i64 {
            continue;
        }
        let alpha = src[3] as f32 / 255.0 * opacity;
        if alpha <= 0.0 {
            continue;
        }
        let dst = base.get_pixel_mut(tx as u32, ty as u32);
        *dst = source_over(*dst, *src, alpha);
    }
}

fn source_over(dst: Rgba<u8>, src: Rgba<u8>, alpha: f32) -> Rgba<u8> {
    let dst_alpha = dst[3] as f32 / 255.0;
    let out_alpha = alpha + dst_alpha * (1.0 - alpha);
    if out_alpha <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let channel = |i: usize| {
        let value = (src[i] as f32 * alpha + dst[i] as f32 * dst_alpha * (1.0 - alpha)) / out_alpha;
        value.round().clamp(0.0, 255.0) as u8
    };
    Rgba([
        channel(0),
        channel(1),
        channel(2),
        (out_alpha * 255.0).round() as u8,
    ])
}

/// Compose a watermarked frame: the photo as the opaque base layer, the
/// (already scaled) logo blended over it at `placement`.
pub fn compose_watermark(
    photo: &DynamicImage,
    scaled_logo: &DynamicImage,
    placement: &LogoPlacement,
    opacity: f32,
) -> RgbaImage {
    let mut canvas = photo.to_rgba8();
    let (x, y, _, _) = placement.to_pixels();
    overlay(&mut canvas, &scaled_logo.to_rgba8(), x, y, opacity);
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(w: u32, h: u32, px: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba(px))
    }

    #[test]
    fn half_opacity_white_over_black_is_mid_grey() {
        let mut base = solid(4, 4, [0, 0, 0, 255]);
        let logo = solid(2, 2, [255, 255, 255, 255]);
        overlay(&mut base, &logo, 1, 1, 0.5);

        assert_eq!(*base.get_pixel(1, 1), Rgba([128, 128, 128, 255]));
        assert_eq!(*base.get_pixel(2, 2), Rgba([128, 128, 128, 255]));
        // Outside the layer the base is untouched
        assert_eq!(*base.get_pixel(0, 0), Rgba([0, 0, 0, 255]));
        assert_eq!(*base.get_pixel(3, 3), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn transparent_logo_pixels_leave_base_alone() {
        let mut base = solid(2, 2, [10, 20, 30, 255]);
        let logo = solid(2, 2, [255, 0, 0, 0]);
        overlay(&mut base, &logo, 0, 0, 0.5);
        assert_eq!(*base.get_pixel(0, 0), Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn logo_alpha_multiplies_with_opacity() {
        let mut base = solid(1, 1, [0, 0, 0, 255]);
        // 50% alpha logo at 50% opacity = 25% coverage
        let logo = solid(1, 1, [200, 200, 200, 128]);
        overlay(&mut base, &logo, 0, 0, 0.5);
        let px = base.get_pixel(0, 0);
        assert!((49..=51).contains(&px[0]), "got {px:?}");
        assert_eq!(px[3], 255);
    }

    #[test]
    fn zero_opacity_is_a_no_op() {
        let mut base = solid(2, 2, [1, 2, 3, 255]);
        let logo = solid(2, 2, [255, 255, 255, 255]);
        overlay(&mut base, &logo, 0, 0, 0.0);
        assert_eq!(*base.get_pixel(1, 1), Rgba([1, 2, 3, 255]));
    }

    #[test]
    fn overlay_clips_out_of_bounds() {
        let mut base = solid(4, 4, [0, 0, 0, 255]);
        let logo = solid(4, 4, [255, 255, 255, 255]);
        overlay(&mut base, &logo, -2, 3, 1.0);
        assert_eq!(*base.get_pixel(0, 3), Rgba([255, 255, 255, 255]));
        assert_eq!(*base.get_pixel(2, 3), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn compose_keeps_photo_dimensions() {
        let photo = DynamicImage::ImageRgba8(solid(40, 20, [0, 0, 0, 255]));
        let logo = DynamicImage::ImageRgba8(solid(12, 4, [255, 255, 255, 255]));
        let placement = LogoPlacement {
            x: 14.0,
            y: 8.0,
            width: 12.0,
            height: 4.0,
        };
        let out = compose_watermark(&photo, &logo, &placement, 0.5);
        assert_eq!(out.dimensions(), (40, 20));
        assert_eq!(*out.get_pixel(14, 8), Rgba([128, 128, 128, 255]));
        assert_eq!(*out.get_pixel(13, 8), Rgba([0, 0, 0, 255]));
    }
}
