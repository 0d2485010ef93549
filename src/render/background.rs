//! Background fill layer

use tiny_skia::{
    FilterQuality, GradientStop, LinearGradient, Paint, Pixmap, PixmapPaint, Rect, SpreadMode,
    Transform,
};

use crate::domain::{
    BackgroundSpec, CHECKER_DARK, CHECKER_LIGHT, CHECKER_SIZE, GRAY, Rgba8,
};

/// Paint the full surface with `spec`.
///
/// `image` is the decoded raster for image and gradient backgrounds. An image
/// background without one is painted white; a gradient without one falls back
/// to a diagonal linear gradient of its colour pair.
pub fn paint_background(pixmap: &mut Pixmap, spec: &BackgroundSpec, image: Option<&Pixmap>) {
    match spec {
        BackgroundSpec::Transparent => paint_checkerboard(pixmap),
        BackgroundSpec::White => pixmap.fill(Rgba8::WHITE.to_skia()),
        BackgroundSpec::Black => pixmap.fill(Rgba8::BLACK.to_skia()),
        BackgroundSpec::Gray => pixmap.fill(GRAY.to_skia()),
        BackgroundSpec::Custom(color) => pixmap.fill(color.to_skia()),
        BackgroundSpec::Gradient { fallback, .. } => match image {
            Some(img) => stretch_image(pixmap, img),
            None => paint_linear_gradient(pixmap, fallback.0, fallback.1),
        },
        BackgroundSpec::Image(_) => match image {
            Some(img) => stretch_image(pixmap, img),
            None => pixmap.fill(Rgba8::WHITE.to_skia()),
        },
    }
}

fn paint_checkerboard(pixmap: &mut Pixmap) {
    let (width, height) = (pixmap.width(), pixmap.height());
    pixmap.fill(CHECKER_LIGHT.to_skia());

    let mut paint = Paint::default();
    paint.set_color(CHECKER_DARK.to_skia());
    paint.anti_alias = false;

    for row in 0..height.div_ceil(CHECKER_SIZE) {
        for col in 0..width.div_ceil(CHECKER_SIZE) {
            if (row + col) % 2 == 0 {
                continue;
            }
            let Some(tile) = Rect::from_xywh(
                (col * CHECKER_SIZE) as f32,
                (row * CHECKER_SIZE) as f32,
                CHECKER_SIZE as f32,
                CHECKER_SIZE as f32,
            ) else {
                continue;
            };
            pixmap.fill_rect(tile, &paint, Transform::identity(), None);
        }
    }
}

/// Scale `img` to exactly cover the surface, ignoring aspect ratio
fn stretch_image(pixmap: &mut Pixmap, img: &Pixmap) {
    let sx = pixmap.width() as f32 / img.width() as f32;
    let sy = pixmap.height() as f32 / img.height() as f32;
    let paint = PixmapPaint {
        quality: FilterQuality::Bicubic,
        ..Default::default()
    };
    pixmap.draw_pixmap(0, 0, img.as_ref(), &paint, Transform::from_scale(sx, sy), None);
}

fn paint_linear_gradient(pixmap: &mut Pixmap, from: Rgba8, to: Rgba8) {
    let (width, height) = (pixmap.width() as f32, pixmap.height() as f32);
    let shader = LinearGradient::new(
        tiny_skia::Point::from_xy(0.0, 0.0),
        tiny_skia::Point::from_xy(width, height),
        vec![
            GradientStop::new(0.0, from.to_skia()),
            GradientStop::new(1.0, to.to_skia()),
        ],
        SpreadMode::Pad,
        Transform::identity(),
    );
    let Some(shader) = shader else {
        pixmap.fill(from.to_skia());
        return;
    };
    let paint = Paint {
        shader,
        anti_alias: false,
        ..Default::default()
    };
    if let Some(rect) = Rect::from_xywh(0.0, 0.0, width, height) {
        pixmap.fill_rect(rect, &paint, Transform::identity(), None);
    }
}
