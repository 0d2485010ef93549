//! Subject layer: drop shadow plus the rounded-corner clipped screenshot

use image::{GrayImage, imageops};
use tiny_skia::{Color, FillRule, Mask, Paint, Path, Pixmap, PixmapPaint, Rect, Transform};

use super::geometry::rounded_rect_path;
use crate::domain::{Bounds, ShadowSettings};
use crate::error::{EditorError, Result};

/// Draw `subject` inset by `padding`, clipped to a rounded rect of `radius`,
/// over a drop shadow.
///
/// The shadow is its own layer rendered beneath the subject, so nothing drawn
/// after this call picks it up.
pub fn draw_subject(
    target: &mut Pixmap,
    subject: &Pixmap,
    padding: u32,
    radius: f32,
    shadow: &ShadowSettings,
) -> Result<()> {
    let bounds = Bounds::from_xywh(
        padding as f32,
        padding as f32,
        subject.width() as f32,
        subject.height() as f32,
    );
    let clip = rounded_rect_path(bounds, radius).ok_or_else(|| {
        EditorError::CanvasContextUnavailable("subject clip path is empty".to_string())
    })?;

    if shadow.is_visible() {
        draw_shadow(target, &clip, shadow);
    }

    let mut mask = Mask::new(target.width(), target.height()).ok_or_else(|| {
        EditorError::CanvasContextUnavailable("cannot allocate clip mask".to_string())
    })?;
    mask.fill_path(&clip, FillRule::Winding, true, Transform::identity());

    target.draw_pixmap(
        padding as i32,
        padding as i32,
        subject.as_ref(),
        &PixmapPaint::default(),
        Transform::identity(),
        Some(&mask),
    );
    Ok(())
}

/// Black, blurred copy of `shape` offset by the shadow settings
fn draw_shadow(target: &mut Pixmap, shape: &Path, shadow: &ShadowSettings) {
    let (width, height) = (target.width(), target.height());
    let Some(mut mask) = Mask::new(width, height) else {
        return;
    };
    mask.fill_path(
        shape,
        FillRule::Winding,
        true,
        Transform::from_translate(shadow.offset_x, shadow.offset_y),
    );

    let sigma = shadow.blur / 2.0;
    if sigma > 0.0
        && let Some(alpha) = GrayImage::from_raw(width, height, mask.data().to_vec())
    {
        let blurred = imageops::blur(&alpha, sigma);
        mask.data_mut().copy_from_slice(blurred.as_raw());
    }

    let opacity = (shadow.opacity / 100.0).clamp(0.0, 1.0);
    let mut paint = Paint::default();
    paint.set_color(Color::from_rgba(0.0, 0.0, 0.0, opacity).unwrap_or(Color::TRANSPARENT));
    if let Some(full) = Rect::from_xywh(0.0, 0.0, width as f32, height as f32) {
        target.fill_rect(full, &paint, Transform::identity(), Some(&mask));
    }
}
