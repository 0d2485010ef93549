//! Annotation rendering using tiny-skia
//!
//! Draws annotations in document order onto a composited surface. The
//! selection highlight and blur-region guides are overlay-only helpers and
//! are never part of an export.

use tiny_skia::{
    Color, FillRule, LineCap, LineJoin, Paint, Path, Pixmap, Stroke, StrokeDash, Transform,
};

use super::geometry::{
    arrow_geometry, ellipse_path, highlight, line_path, polygon_path, rect_path,
};
use super::surface::with_rgba;
use super::text::{FontBook, TextAnchor, draw_text};
use crate::domain::{Annotation, Bounds, LineType, Point, Rgba8, Shape};
use crate::error::Result;

const HIGHLIGHT_COLOR: Rgba8 = Rgba8::opaque(0x3b, 0x82, 0xf6);
const BLUR_GUIDE_COLOR: Rgba8 = Rgba8 {
    r: 100,
    g: 100,
    b: 255,
    a: 77,
};
/// Number label size relative to the marker radius
const NUMBER_LABEL_SCALE: f32 = 1.2;

fn paint_for(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(color);
    paint.anti_alias = true;
    paint
}

fn stroke_path(pixmap: &mut Pixmap, path: &Path, color: Color, stroke: &Stroke) {
    pixmap.stroke_path(path, &paint_for(color), stroke, Transform::identity(), None);
}

fn fill_path(pixmap: &mut Pixmap, path: &Path, color: Color) {
    pixmap.fill_path(
        path,
        &paint_for(color),
        FillRule::Winding,
        Transform::identity(),
        None,
    );
}

fn dashed(width: f32) -> Stroke {
    Stroke {
        width,
        dash: StrokeDash::new(highlight::DASH.to_vec(), 0.0),
        ..Default::default()
    }
}

/// Control point used for a curved line, if any
fn curve_control(line_type: LineType, control_points: &[Point]) -> Option<Point> {
    match line_type {
        LineType::Curved => control_points.first().copied(),
        LineType::Straight => None,
    }
}

/// Draw one annotation onto the surface
pub fn draw_annotation(pixmap: &mut Pixmap, annotation: &Annotation, fonts: &FontBook) -> Result<()> {
    let fill = annotation.fill.to_skia();
    let border = annotation.border.color.to_skia();
    let line_width = annotation.border.stroke_width();

    match &annotation.shape {
        Shape::Circle { x, y, radius } => {
            if let Some(path) = ellipse_path(*x, *y, *radius, *radius) {
                let stroke = Stroke {
                    width: line_width,
                    ..Default::default()
                };
                stroke_path(pixmap, &path, border, &stroke);
            }
        }
        Shape::Rectangle {
            x,
            y,
            width,
            height,
        } => {
            if let Some(path) = rect_path(Bounds::from_xywh(*x, *y, *width, *height)) {
                let stroke = Stroke {
                    width: line_width,
                    line_join: LineJoin::Miter,
                    ..Default::default()
                };
                stroke_path(pixmap, &path, border, &stroke);
            }
        }
        Shape::Line {
            x,
            y,
            end_x,
            end_y,
            line_type,
            control_points,
        } => {
            let control = curve_control(*line_type, control_points);
            if let Some(path) = line_path(Point::new(*x, *y), Point::new(*end_x, *end_y), control) {
                let stroke = Stroke {
                    width: line_width,
                    line_cap: LineCap::Round,
                    ..Default::default()
                };
                stroke_path(pixmap, &path, fill, &stroke);
            }
        }
        Shape::Arrow {
            x,
            y,
            end_x,
            end_y,
            line_type,
            arrow_type,
            control_points,
        } => {
            let start = Point::new(*x, *y);
            let end = Point::new(*end_x, *end_y);
            let geom = arrow_geometry(start, end, line_width, *arrow_type);
            let control = curve_control(*line_type, control_points);

            if let Some(path) = line_path(start, geom.shaft_end, control) {
                let stroke = Stroke {
                    width: line_width,
                    line_cap: LineCap::Round,
                    ..Default::default()
                };
                stroke_path(pixmap, &path, fill, &stroke);
            }
            if let Some(head) = geom.head.and_then(|h| polygon_path(&h)) {
                fill_path(pixmap, &head, fill);
            }
        }
        Shape::Text {
            x,
            y,
            text,
            font_size,
            font_family,
            ..
        } => match fonts.font(font_family, false) {
            Some(font) => draw_text(
                pixmap,
                font,
                text,
                (*x, *y + *font_size),
                *font_size,
                fill,
                TextAnchor::Baseline,
            ),
            None => log::debug!("No font for {}, skipping text", annotation.id),
        },
        Shape::Number {
            x,
            y,
            number,
            radius,
        } => {
            if let Some(path) = ellipse_path(*x, *y, *radius, *radius) {
                fill_path(pixmap, &path, fill);
                if annotation.border.width > 0.0 {
                    let stroke = Stroke {
                        width: annotation.border.width,
                        ..Default::default()
                    };
                    stroke_path(pixmap, &path, border, &stroke);
                }
            }
            if let Some(font) = fonts.font("Arial", true) {
                draw_text(
                    pixmap,
                    font,
                    &number.to_string(),
                    (*x, *y),
                    *radius * NUMBER_LABEL_SCALE,
                    Color::WHITE,
                    TextAnchor::Center,
                );
            }
        }
        Shape::Blur {
            x,
            y,
            width,
            height,
            amount,
        } => {
            let (bx, by) = (x.floor() as i64, y.floor() as i64);
            let (bw, bh) = (width.ceil() as i64, height.ceil() as i64);
            let radius = *amount;
            with_rgba(pixmap, |img| {
                super::effects::box_blur_region(img, bx, by, bw, bh, radius)
            })?;
        }
    }
    Ok(())
}

/// Draw annotations in document order (later entries on top)
pub fn draw_annotations(pixmap: &mut Pixmap, annotations: &[Annotation], fonts: &FontBook) -> Result<()> {
    for annotation in annotations {
        draw_annotation(pixmap, annotation, fonts)?;
    }
    Ok(())
}

/// Dashed outline 5px outside the selected annotation
pub fn draw_selection_highlight(pixmap: &mut Pixmap, annotation: &Annotation) {
    let path = match annotation.shape {
        Shape::Circle { x, y, radius } | Shape::Number { x, y, radius, .. } => {
            let r = radius + highlight::OFFSET;
            ellipse_path(x, y, r, r)
        }
        _ => rect_path(annotation.bounds().inflate(highlight::OFFSET)),
    };
    if let Some(path) = path {
        stroke_path(pixmap, &path, HIGHLIGHT_COLOR.to_skia(), &dashed(highlight::WIDTH));
    }
}

/// Faint dashed frame marking a blur region in the interactive view
pub fn draw_blur_guide(pixmap: &mut Pixmap, annotation: &Annotation) {
    if let Shape::Blur { .. } = annotation.shape
        && let Some(path) = rect_path(annotation.bounds())
    {
        stroke_path(pixmap, &path, BLUR_GUIDE_COLOR.to_skia(), &dashed(2.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AnnotationId, ArrowType, Border, Swatch};
    use crate::render::surface::pixel_at;

    fn with_shape(shape: Shape) -> Annotation {
        Annotation::new(AnnotationId(1), shape, Swatch::default(), Border::default())
    }

    fn white(w: u32, h: u32) -> Pixmap {
        let mut p = Pixmap::new(w, h).unwrap();
        p.fill(Color::WHITE);
        p
    }

    fn is_red(px: [u8; 4]) -> bool {
        px[0] > 200 && px[1] < 100 && px[2] < 50
    }

    #[test]
    fn circle_is_stroked_not_filled() {
        let mut p = white(100, 100);
        let circle = with_shape(Shape::Circle {
            x: 50.0,
            y: 50.0,
            radius: 30.0,
        });
        draw_annotation(&mut p, &circle, &FontBook::default()).unwrap();
        assert!(is_red(pixel_at(&p, 80, 50).unwrap()));
        assert_eq!(pixel_at(&p, 50, 50), Some([255, 255, 255, 255]));
    }

    #[test]
    fn thick_arrow_has_head_at_tip_and_short_shaft() {
        let mut p = white(120, 40);
        let arrow = with_shape(Shape::Arrow {
            x: 5.0,
            y: 20.0,
            end_x: 105.0,
            end_y: 20.0,
            line_type: LineType::Straight,
            arrow_type: ArrowType::Thick,
            control_points: Vec::new(),
        });
        draw_annotation(&mut p, &arrow, &FontBook::default()).unwrap();
        // head body just behind the tip
        assert!(is_red(pixel_at(&p, 100, 20).unwrap()));
        // head barbs flare wider than the 5px shaft
        assert!(is_red(pixel_at(&p, 91, 25).unwrap()));
        assert!(!is_red(pixel_at(&p, 50, 25).unwrap()));
        // nothing past the tip
        assert_eq!(pixel_at(&p, 108, 20), Some([255, 255, 255, 255]));
    }

    #[test]
    fn blur_region_softens_pixels_inside_only() {
        let mut p = white(40, 40);
        let line = with_shape(Shape::Line {
            x: 0.0,
            y: 20.0,
            end_x: 40.0,
            end_y: 20.0,
            line_type: LineType::Straight,
            control_points: Vec::new(),
        });
        draw_annotation(&mut p, &line, &FontBook::default()).unwrap();
        let blur = with_shape(Shape::Blur {
            x: 0.0,
            y: 0.0,
            width: 20.0,
            height: 40.0,
            amount: 6,
        });
        draw_annotation(&mut p, &blur, &FontBook::default()).unwrap();
        let softened = pixel_at(&p, 10, 20).unwrap();
        assert!(softened[1] > 100, "blurred line should lighten, got {softened:?}");
        assert!(is_red(pixel_at(&p, 30, 20).unwrap()));
    }

    #[test]
    fn highlight_sits_outside_rectangle() {
        let mut p = white(100, 100);
        let rect = with_shape(Shape::Rectangle {
            x: 20.0,
            y: 20.0,
            width: 40.0,
            height: 40.0,
        });
        draw_selection_highlight(&mut p, &rect);
        // first dash starts at the top-left corner of the inflated box
        let px = pixel_at(&p, 17, 15).unwrap();
        assert!(px[2] > px[0], "expected blue dash, got {px:?}");
        assert_eq!(pixel_at(&p, 40, 40), Some([255, 255, 255, 255]));
    }
}
