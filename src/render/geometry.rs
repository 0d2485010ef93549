//! Shared geometry calculations for annotations and the subject clip
//!
//! Pure math plus tiny-skia path builders, used by both the export
//! surface and the interactive overlay.

use tiny_skia::{Path, PathBuilder};

use crate::domain::{ArrowType, Bounds, Point};

/// Arrow geometry constants
pub mod arrow {
    use std::f32::consts::PI;

    /// Arrowhead half-angle from the shaft
    pub const HEAD_ANGLE: f32 = PI / 7.0;
    /// Fraction of the head length the shaft is pulled back by
    pub const SHAFT_INSET: f32 = 0.7;
    /// Distance of the notch point behind the tip, as a fraction of head length
    pub const NOTCH: f32 = 0.6;
}

/// Selection highlight constants
pub mod highlight {
    /// Gap between the shape and its dashed outline
    pub const OFFSET: f32 = 5.0;
    pub const WIDTH: f32 = 2.0;
    pub const DASH: [f32; 2] = [5.0, 5.0];
}

/// Ellipse bezier approximation constant: 4/3 * (sqrt(2) - 1)
pub const BEZIER_K: f32 = 0.552_284_8;

/// Resolved arrow outline: where the visible shaft stops and the head triangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrowGeometry {
    pub shaft_end: Point,
    /// Tip, first barb, notch, second barb
    pub head: Option<[Point; 4]>,
}

/// Compute the shaft end and head polygon for an arrow from `start` to `end`
pub fn arrow_geometry(start: Point, end: Point, line_width: f32, arrow_type: ArrowType) -> ArrowGeometry {
    let head_length = arrow_type.head_length(line_width);
    if head_length <= 0.0 {
        return ArrowGeometry {
            shaft_end: end,
            head: None,
        };
    }

    let angle = (end.y - start.y).atan2(end.x - start.x);
    let back = |distance: f32, theta: f32| {
        Point::new(end.x - distance * theta.cos(), end.y - distance * theta.sin())
    };

    ArrowGeometry {
        shaft_end: back(head_length * arrow::SHAFT_INSET, angle),
        head: Some([
            end,
            back(head_length, angle - arrow::HEAD_ANGLE),
            back(head_length * arrow::NOTCH, angle),
            back(head_length, angle + arrow::HEAD_ANGLE),
        ]),
    }
}

/// Straight or quadratic path from `start` to `end`
pub fn line_path(start: Point, end: Point, control: Option<Point>) -> Option<Path> {
    let mut pb = PathBuilder::new();
    pb.move_to(start.x, start.y);
    match control {
        Some(cp) => pb.quad_to(cp.x, cp.y, end.x, end.y),
        None => pb.line_to(end.x, end.y),
    }
    pb.finish()
}

pub fn polygon_path(points: &[Point]) -> Option<Path> {
    let (first, rest) = points.split_first()?;
    let mut pb = PathBuilder::new();
    pb.move_to(first.x, first.y);
    for p in rest {
        pb.line_to(p.x, p.y);
    }
    pb.close();
    pb.finish()
}

/// Build an ellipse path using cubic bezier curves
pub fn ellipse_path(cx: f32, cy: f32, rx: f32, ry: f32) -> Option<Path> {
    let kx = rx * BEZIER_K;
    let ky = ry * BEZIER_K;

    let mut pb = PathBuilder::new();
    pb.move_to(cx, cy - ry);
    pb.cubic_to(cx + kx, cy - ry, cx + rx, cy - ky, cx + rx, cy);
    pb.cubic_to(cx + rx, cy + ky, cx + kx, cy + ry, cx, cy + ry);
    pb.cubic_to(cx - kx, cy + ry, cx - rx, cy + ky, cx - rx, cy);
    pb.cubic_to(cx - rx, cy - ky, cx - kx, cy - ry, cx, cy - ry);
    pb.close();
    pb.finish()
}

pub fn rect_path(bounds: Bounds) -> Option<Path> {
    bounds.to_skia().map(PathBuilder::from_rect)
}

/// Rounded rectangle path; the radius is clamped to half the shorter side
pub fn rounded_rect_path(bounds: Bounds, radius: f32) -> Option<Path> {
    let r = radius.min(bounds.width() / 2.0).min(bounds.height() / 2.0).max(0.0);
    if r <= 0.0 {
        return rect_path(bounds);
    }
    let Bounds {
        left,
        top,
        right,
        bottom,
    } = bounds;
    let k = r * (1.0 - BEZIER_K);

    let mut pb = PathBuilder::new();
    pb.move_to(left + r, top);
    pb.line_to(right - r, top);
    pb.cubic_to(right - k, top, right, top + k, right, top + r);
    pb.line_to(right, bottom - r);
    pb.cubic_to(right, bottom - k, right - k, bottom, right - r, bottom);
    pb.line_to(left + r, bottom);
    pb.cubic_to(left + k, bottom, left, bottom - k, left, bottom - r);
    pb.line_to(left, top + r);
    pb.cubic_to(left, top + k, left + k, top, left + r, top);
    pb.close();
    pb.finish()
}
