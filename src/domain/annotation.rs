//! Annotation types drawn over the framed screenshot
//!
//! All annotation types store coordinates in canvas pixel coordinates
//! (background rect origin at the top-left).

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use super::color::{Border, Swatch};
use super::geometry::{Bounds, Point};

/// Click tolerance around lines and arrows, in pixels
pub const LINE_HIT_TOLERANCE: f32 = 10.0;

/// Stable identifier of an annotation within a document
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnnotationId(pub u64);

impl std::fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "annotation-{}", self.0)
    }
}

/// Generation-ordered id source, one per editor session
#[derive(Debug, Default)]
pub struct IdGenerator {
    next: AtomicU64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    pub fn generate(&self) -> AnnotationId {
        AnnotationId(self.next.fetch_add(1, Ordering::SeqCst))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineType {
    #[default]
    Straight,
    Curved,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrowType {
    Thin,
    #[default]
    Thick,
    None,
}

impl ArrowType {
    /// Arrowhead length for a given stroke width; zero when the head is suppressed
    pub fn head_length(self, line_width: f32) -> f32 {
        match self {
            ArrowType::Thin => line_width * 3.0,
            ArrowType::Thick => line_width * 4.0,
            ArrowType::None => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlign {
    #[default]
    Top,
    Middle,
    Bottom,
}

/// Text alignment, carried with every annotation but not used for rendering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alignment {
    pub horizontal: HorizontalAlign,
    pub vertical: VerticalAlign,
}

/// Geometry of one annotation; exactly one variant per id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    Circle {
        x: f32,
        y: f32,
        radius: f32,
    },
    Rectangle {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    Line {
        x: f32,
        y: f32,
        end_x: f32,
        end_y: f32,
        line_type: LineType,
        #[serde(default)]
        control_points: Vec<Point>,
    },
    Arrow {
        x: f32,
        y: f32,
        end_x: f32,
        end_y: f32,
        line_type: LineType,
        arrow_type: ArrowType,
        #[serde(default)]
        control_points: Vec<Point>,
    },
    Text {
        x: f32,
        y: f32,
        text: String,
        font_size: f32,
        font_family: String,
        width: f32,
        height: f32,
    },
    Number {
        x: f32,
        y: f32,
        number: u32,
        radius: f32,
    },
    /// Region whose already-composited pixels are box blurred
    Blur {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        amount: u32,
    },
}

/// Discriminant of [`Shape`], used to reject patches that would change the variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Circle,
    Rectangle,
    Line,
    Arrow,
    Text,
    Number,
    Blur,
}

impl Shape {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Circle { .. } => ShapeKind::Circle,
            Shape::Rectangle { .. } => ShapeKind::Rectangle,
            Shape::Line { .. } => ShapeKind::Line,
            Shape::Arrow { .. } => ShapeKind::Arrow,
            Shape::Text { .. } => ShapeKind::Text,
            Shape::Number { .. } => ShapeKind::Number,
            Shape::Blur { .. } => ShapeKind::Blur,
        }
    }

    /// Anchor point (`x`, `y`) of the shape
    pub fn origin(&self) -> Point {
        match *self {
            Shape::Circle { x, y, .. }
            | Shape::Rectangle { x, y, .. }
            | Shape::Line { x, y, .. }
            | Shape::Arrow { x, y, .. }
            | Shape::Text { x, y, .. }
            | Shape::Number { x, y, .. }
            | Shape::Blur { x, y, .. } => Point::new(x, y),
        }
    }

    /// Check whether a canvas point selects this shape
    ///
    /// Curved lines and arrows are tested against their straight chord.
    pub fn contains(&self, p: Point) -> bool {
        match *self {
            Shape::Circle { x, y, radius } | Shape::Number { x, y, radius, .. } => {
                p.distance(Point::new(x, y)) <= radius
            }
            Shape::Rectangle {
                x,
                y,
                width,
                height,
            }
            | Shape::Text {
                x,
                y,
                width,
                height,
                ..
            }
            | Shape::Blur {
                x,
                y,
                width,
                height,
                ..
            } => Bounds::from_xywh(x, y, width, height).contains(p),
            Shape::Line {
                x, y, end_x, end_y, ..
            }
            | Shape::Arrow {
                x, y, end_x, end_y, ..
            } => {
                p.distance_to_segment(Point::new(x, y), Point::new(end_x, end_y))
                    <= LINE_HIT_TOLERANCE
            }
        }
    }

    /// Axis-aligned bounds of the geometry (excluding stroke width)
    pub fn bounds(&self) -> Bounds {
        match *self {
            Shape::Circle { x, y, radius } | Shape::Number { x, y, radius, .. } => Bounds {
                left: x - radius,
                top: y - radius,
                right: x + radius,
                bottom: y + radius,
            },
            Shape::Rectangle {
                x,
                y,
                width,
                height,
            }
            | Shape::Text {
                x,
                y,
                width,
                height,
                ..
            }
            | Shape::Blur {
                x,
                y,
                width,
                height,
                ..
            } => Bounds::from_xywh(x, y, width, height),
            Shape::Line {
                x, y, end_x, end_y, ..
            }
            | Shape::Arrow {
                x, y, end_x, end_y, ..
            } => Bounds::from_corners(Point::new(x, y), Point::new(end_x, end_y)),
        }
    }

    /// Move every geometry field by the same offset, preserving the shape
    pub fn translate(&mut self, dx: f32, dy: f32) {
        match self {
            Shape::Circle { x, y, .. }
            | Shape::Rectangle { x, y, .. }
            | Shape::Text { x, y, .. }
            | Shape::Number { x, y, .. }
            | Shape::Blur { x, y, .. } => {
                *x += dx;
                *y += dy;
            }
            Shape::Line {
                x,
                y,
                end_x,
                end_y,
                control_points,
                ..
            }
            | Shape::Arrow {
                x,
                y,
                end_x,
                end_y,
                control_points,
                ..
            } => {
                *x += dx;
                *y += dy;
                *end_x += dx;
                *end_y += dy;
                for cp in control_points.iter_mut() {
                    *cp = cp.offset(dx, dy);
                }
            }
        }
    }
}

/// A vector annotation with its styling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: AnnotationId,
    #[serde(flatten)]
    pub shape: Shape,
    pub fill: Swatch,
    pub border: Border,
    #[serde(default)]
    pub alignment: Alignment,
}

impl Annotation {
    pub fn new(id: AnnotationId, shape: Shape, fill: Swatch, border: Border) -> Self {
        Self {
            id,
            shape,
            fill,
            border,
            alignment: Alignment::default(),
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        self.shape.contains(p)
    }

    pub fn bounds(&self) -> Bounds {
        self.shape.bounds()
    }

    /// Copy of this annotation moved by (`dx`, `dy`)
    pub fn translated(&self, dx: f32, dy: f32) -> Annotation {
        let mut moved = self.clone();
        moved.shape.translate(dx, dy);
        moved
    }

    /// Apply a field patch; returns false when the patch does not fit this variant
    pub fn apply(&mut self, patch: AnnotationPatch) -> bool {
        match patch {
            AnnotationPatch::Fill(fill) => self.fill = fill,
            AnnotationPatch::Border(border) => self.border = border,
            AnnotationPatch::Translate { dx, dy } => self.shape.translate(dx, dy),
            AnnotationPatch::Geometry(shape) => {
                if shape.kind() != self.shape.kind() {
                    return false;
                }
                self.shape = shape;
            }
            AnnotationPatch::Text(new_text) => match &mut self.shape {
                Shape::Text { text, .. } => *text = new_text,
                _ => return false,
            },
            AnnotationPatch::FontSize(size) => match &mut self.shape {
                Shape::Text { font_size, .. } => *font_size = size.max(1.0),
                _ => return false,
            },
            AnnotationPatch::ArrowType(kind) => match &mut self.shape {
                Shape::Arrow { arrow_type, .. } => *arrow_type = kind,
                _ => return false,
            },
            AnnotationPatch::LineType(kind) => match &mut self.shape {
                Shape::Line { line_type, .. } | Shape::Arrow { line_type, .. } => {
                    *line_type = kind
                }
                _ => return false,
            },
        }
        true
    }
}

/// A direct field update issued by the properties panel or by dragging
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationPatch {
    Fill(Swatch),
    Border(Border),
    Text(String),
    FontSize(f32),
    ArrowType(ArrowType),
    LineType(LineType),
    Translate { dx: f32, dy: f32 },
    /// Replace the geometry; must keep the same variant
    Geometry(Shape),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotation(shape: Shape) -> Annotation {
        Annotation::new(AnnotationId(1), shape, Swatch::default(), Border::default())
    }

    #[test]
    fn circle_contains_points_within_radius() {
        let c = annotation(Shape::Circle {
            x: 50.0,
            y: 50.0,
            radius: 10.0,
        });
        assert!(c.contains(Point::new(56.0, 58.0)));
        assert!(!c.contains(Point::new(58.0, 58.0)));
    }

    #[test]
    fn rectangle_and_text_use_bounding_box() {
        let r = annotation(Shape::Rectangle {
            x: 10.0,
            y: 10.0,
            width: 100.0,
            height: 50.0,
        });
        assert!(r.contains(Point::new(110.0, 60.0)));
        assert!(!r.contains(Point::new(111.0, 30.0)));

        let t = annotation(Shape::Text {
            x: 0.0,
            y: 0.0,
            text: "hi".into(),
            font_size: 48.0,
            font_family: "Arial".into(),
            width: 200.0,
            height: 60.0,
        });
        assert!(t.contains(Point::new(199.0, 59.0)));
        assert!(!t.contains(Point::new(199.0, 61.0)));
    }

    #[test]
    fn arrow_hit_uses_ten_pixel_tolerance() {
        let a = annotation(Shape::Arrow {
            x: 0.0,
            y: 0.0,
            end_x: 100.0,
            end_y: 0.0,
            line_type: LineType::Straight,
            arrow_type: ArrowType::Thick,
            control_points: Vec::new(),
        });
        assert!(a.contains(Point::new(50.0, 10.0)));
        assert!(!a.contains(Point::new(50.0, 10.5)));
        assert!(!a.contains(Point::new(111.0, 0.0)));
    }

    #[test]
    fn curved_line_hits_against_chord() {
        let l = annotation(Shape::Line {
            x: 0.0,
            y: 0.0,
            end_x: 100.0,
            end_y: 0.0,
            line_type: LineType::Curved,
            control_points: vec![Point::new(50.0, 80.0)],
        });
        assert!(l.contains(Point::new(50.0, 0.0)));
        assert!(!l.contains(Point::new(50.0, 40.0)));
    }

    #[test]
    fn translating_a_line_moves_both_endpoints() {
        let l = annotation(Shape::Line {
            x: 0.0,
            y: 0.0,
            end_x: 10.0,
            end_y: 20.0,
            line_type: LineType::Curved,
            control_points: vec![Point::new(5.0, 5.0)],
        });
        let moved = l.translated(3.0, -2.0);
        assert_eq!(
            moved.shape,
            Shape::Line {
                x: 3.0,
                y: -2.0,
                end_x: 13.0,
                end_y: 18.0,
                line_type: LineType::Curved,
                control_points: vec![Point::new(8.0, 3.0)],
            }
        );
        assert_eq!(moved.id, l.id);
    }

    #[test]
    fn geometry_patch_must_keep_variant() {
        let mut c = annotation(Shape::Circle {
            x: 0.0,
            y: 0.0,
            radius: 4.0,
        });
        let rejected = c.apply(AnnotationPatch::Geometry(Shape::Rectangle {
            x: 0.0,
            y: 0.0,
            width: 1.0,
            height: 1.0,
        }));
        assert!(!rejected);
        assert!(!c.apply(AnnotationPatch::Text("nope".into())));
        assert!(c.apply(AnnotationPatch::Geometry(Shape::Circle {
            x: 1.0,
            y: 1.0,
            radius: 9.0,
        })));
        assert_eq!(c.bounds().width(), 18.0);
    }

    #[test]
    fn ids_are_generation_ordered() {
        let ids = IdGenerator::new();
        let a = ids.generate();
        let b = ids.generate();
        assert!(a < b);
    }

    #[test]
    fn serializes_with_type_tag() {
        let n = annotation(Shape::Number {
            x: 1.0,
            y: 2.0,
            number: 3,
            radius: 32.0,
        });
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["type"], "number");
        let back: Annotation = serde_json::from_value(json).unwrap();
        assert_eq!(back, n);
    }
}
