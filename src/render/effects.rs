//! Pixel effects: background noise, edge-safe background blur, region box blur

use image::{Rgba, RgbaImage, imageops};
use rand::Rng;

use crate::error::{EditorError, Result};

/// Largest working surface a blur may allocate, matching the tiny-skia pixmap limit
const MAX_SURFACE_BYTES: u64 = i32::MAX as u64;

/// Add per-channel random noise of `amount` (0-100) to RGB; alpha is untouched.
///
/// An amount of zero leaves the buffer alone without touching any pixel.
pub fn apply_noise<R: Rng + ?Sized>(img: &mut RgbaImage, amount: u32, rng: &mut R) {
    if amount == 0 {
        return;
    }
    let intensity = amount.min(100) as f32 * 2.55;
    for pixel in img.pixels_mut() {
        for channel in pixel.0.iter_mut().take(3) {
            let noise = (rng.random::<f32>() - 0.5) * intensity;
            *channel = (*channel as f32 + noise).round().clamp(0.0, 255.0) as u8;
        }
    }
}

/// Gaussian blur with sigma `amount`, sampling replicated edges instead of
/// transparent pixels outside the image. Zero returns an unmodified copy.
///
/// Fails when the edge-extended working surface would not fit in memory.
pub fn apply_blur(img: &RgbaImage, amount: u32) -> Result<RgbaImage> {
    if amount == 0 {
        return Ok(img.clone());
    }
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Ok(img.clone());
    }
    let pad = amount.checked_mul(3).ok_or_else(|| oversized_blur(amount))?;
    let extended = extend_edges(img, pad).ok_or_else(|| oversized_blur(amount))?;
    let blurred = imageops::blur(&extended, amount as f32);
    Ok(imageops::crop_imm(&blurred, pad, pad, width, height).to_image())
}

fn oversized_blur(amount: u32) -> EditorError {
    EditorError::CanvasContextUnavailable(format!("blur of {amount} px needs too large a surface"))
}

/// Grow `img` by `pad` pixels on every side, copying the nearest edge pixel outward.
///
/// `None` when the grown surface exceeds [`MAX_SURFACE_BYTES`].
fn extend_edges(img: &RgbaImage, pad: u32) -> Option<RgbaImage> {
    let (width, height) = img.dimensions();
    let grow = pad.checked_mul(2)?;
    let (ext_w, ext_h) = (width.checked_add(grow)?, height.checked_add(grow)?);
    let bytes = (ext_w as u64).checked_mul(ext_h as u64)?.checked_mul(4)?;
    if bytes > MAX_SURFACE_BYTES {
        return None;
    }
    Some(RgbaImage::from_fn(ext_w, ext_h, |x, y| {
        let sx = x.saturating_sub(pad).min(width - 1);
        let sy = y.saturating_sub(pad).min(height - 1);
        *img.get_pixel(sx, sy)
    }))
}

/// Separable box blur of a region, clamping samples to the region edges
pub fn box_blur_region(img: &mut RgbaImage, x: i64, y: i64, width: i64, height: i64, radius: u32) {
    let left = x.max(0);
    let top = y.max(0);
    let right = (x + width).min(img.width() as i64);
    let bottom = (y + height).min(img.height() as i64);
    if right <= left || bottom <= top || radius == 0 {
        return;
    }
    let (left, top) = (left as u32, top as u32);
    let (w, h) = (right as u32 - left, bottom as u32 - top);

    let region = imageops::crop_imm(img, left, top, w, h).to_image();
    let horizontal = box_pass(&region, radius as i64, true);
    let blurred = box_pass(&horizontal, radius as i64, false);
    imageops::replace(img, &blurred, left as i64, top as i64);
}

fn box_pass(src: &RgbaImage, radius: i64, horizontal: bool) -> RgbaImage {
    let (w, h) = src.dimensions();
    let count = (radius * 2 + 1) as u32;
    let (lines, len) = if horizontal { (h, w) } else { (w, h) };
    let mut out = RgbaImage::new(w, h);
    let at = |line: u32, i: i64| -> Rgba<u8> {
        let i = i.clamp(0, len as i64 - 1) as u32;
        if horizontal {
            *src.get_pixel(i, line)
        } else {
            *src.get_pixel(line, i)
        }
    };

    for line in 0..lines {
        let mut sum = [0u32; 4];
        for k in -radius..=radius {
            let p = at(line, k);
            for c in 0..4 {
                sum[c] += p[c] as u32;
            }
        }
        for i in 0..len {
            let avg = Rgba(sum.map(|s| (s / count) as u8));
            if horizontal {
                out.put_pixel(i, line, avg);
            } else {
                out.put_pixel(line, i, avg);
            }
            let leaving = at(line, i as i64 - radius);
            let entering = at(line, i as i64 + radius + 1);
            for c in 0..4 {
                sum[c] = sum[c] + entering[c] as u32 - leaving[c] as u32;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn horizontal_ramp(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, _| {
            let v = (x * 255 / (w - 1)) as u8;
            Rgba([v, 255 - v, 128, 255])
        })
    }

    #[test]
    fn zero_noise_is_bit_identical() {
        let original = horizontal_ramp(32, 16);
        let mut img = original.clone();
        apply_noise(&mut img, 0, &mut StdRng::seed_from_u64(7));
        assert_eq!(img, original);
    }

    #[test]
    fn noise_keeps_alpha_and_stays_in_bounds() {
        let mut img = RgbaImage::from_pixel(32, 32, Rgba([250, 5, 128, 200]));
        apply_noise(&mut img, 100, &mut StdRng::seed_from_u64(42));
        assert!(img.pixels().all(|p| p[3] == 200));
        let changed = img.pixels().filter(|p| p[2] != 128).count();
        assert!(changed > 0);
    }

    #[test]
    fn noise_channels_vary_independently() {
        let mut img = RgbaImage::from_pixel(16, 16, Rgba([128, 128, 128, 255]));
        apply_noise(&mut img, 80, &mut StdRng::seed_from_u64(3));
        assert!(img.pixels().any(|p| p[0] != p[1] || p[1] != p[2]));
    }

    #[test]
    fn zero_blur_is_identity() {
        let img = horizontal_ramp(20, 10);
        assert_eq!(apply_blur(&img, 0).unwrap(), img);
    }

    #[test]
    fn blurred_edges_stay_within_source_edge_range() {
        let img = horizontal_ramp(60, 40);
        let blurred = apply_blur(&img, 6).unwrap();
        assert_eq!(blurred.dimensions(), img.dimensions());

        let src = &img;
        let edge = |y: u32| (0..60).map(move |x| *src.get_pixel(x, y));
        for (row, src_row) in [(0u32, 0u32), (39, 39)] {
            for c in 0..3 {
                let min = edge(src_row).map(|p| p[c]).min().unwrap();
                let max = edge(src_row).map(|p| p[c]).max().unwrap();
                for x in 0..60 {
                    let v = blurred.get_pixel(x, row)[c];
                    assert!(
                        v >= min.saturating_sub(1) && v <= max.saturating_add(1),
                        "channel {c} at ({x},{row}) = {v} outside [{min},{max}]"
                    );
                }
            }
        }
    }

    #[test]
    fn blur_does_not_darken_a_flat_background() {
        let img = RgbaImage::from_pixel(30, 30, Rgba([255, 255, 255, 255]));
        let blurred = apply_blur(&img, 4).unwrap();
        assert!(blurred.pixels().all(|p| p.0.iter().all(|&c| c >= 254)));
    }

    #[test]
    fn blurred_corners_keep_edge_colour_instead_of_fading() {
        let img = RgbaImage::from_fn(24, 24, |x, _| {
            if x < 12 {
                Rgba([200, 20, 20, 255])
            } else {
                Rgba([20, 20, 200, 255])
            }
        });
        let blurred = apply_blur(&img, 5).unwrap();
        for (x, y) in [(0, 0), (0, 23), (23, 0), (23, 23)] {
            let p = blurred.get_pixel(x, y);
            assert!(p[3] >= 254, "alpha faded at ({x},{y}): {p:?}");
        }
        let left = blurred.get_pixel(0, 0);
        let right = blurred.get_pixel(23, 23);
        assert!(left[0] > left[2], "left edge lost its colour: {left:?}");
        assert!(right[2] > right[0], "right edge lost its colour: {right:?}");
    }

    #[test]
    fn oversized_blur_is_an_error_not_a_panic() {
        let img = RgbaImage::from_pixel(8, 8, Rgba([1, 2, 3, 255]));
        for amount in [1_500_000_000, u32::MAX, 1_000_000] {
            assert!(matches!(
                apply_blur(&img, amount),
                Err(EditorError::CanvasContextUnavailable(_))
            ));
        }
    }

    #[test]
    fn region_blur_only_touches_region() {
        let mut img = RgbaImage::from_fn(20, 20, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        });
        let untouched = *img.get_pixel(15, 15);
        box_blur_region(&mut img, 2, 2, 8, 8, 3);
        let mid = img.get_pixel(5, 5);
        assert!(mid[0] > 60 && mid[0] < 200);
        assert_eq!(*img.get_pixel(15, 15), untouched);
    }

    #[test]
    fn region_outside_image_is_ignored() {
        let mut img = RgbaImage::from_pixel(10, 10, Rgba([9, 9, 9, 255]));
        let before = img.clone();
        box_blur_region(&mut img, 20, 20, 5, 5, 4);
        box_blur_region(&mut img, -10, -10, 5, 5, 4);
        assert_eq!(img, before);
    }
}
