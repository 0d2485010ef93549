//! Editing tools and the construction of annotations from a drag

use serde::{Deserialize, Serialize};

use super::annotation::{Annotation, AnnotationId, ArrowType, LineType, Shape};
use super::color::{Border, Swatch};
use super::geometry::{Point, normalize_rect};

pub const DEFAULT_TEXT: &str = "Text";
pub const DEFAULT_FONT_SIZE: f32 = 48.0;
pub const DEFAULT_FONT_FAMILY: &str = "Arial";
pub const DEFAULT_TEXT_BOX: (f32, f32) = (200.0, 60.0);
pub const DEFAULT_NUMBER_RADIUS: f32 = 32.0;
pub const DEFAULT_BLUR_AMOUNT: u32 = 20;

/// Active canvas tool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    #[default]
    Select,
    Circle,
    Rectangle,
    Line,
    Arrow,
    Text,
    Number,
    Blur,
}

impl Tool {
    /// Every tool except select draws a new annotation
    pub fn is_drawing(self) -> bool {
        self != Tool::Select
    }
}

/// Style applied to newly drawn annotations
#[derive(Debug, Clone, PartialEq)]
pub struct ToolStyle {
    pub fill: Swatch,
    pub border: Border,
    pub arrow_type: ArrowType,
    pub line_type: LineType,
}

impl Default for ToolStyle {
    fn default() -> Self {
        Self {
            fill: Swatch::default(),
            border: Border::default(),
            arrow_type: ArrowType::Thick,
            line_type: LineType::Straight,
        }
    }
}

impl Tool {
    /// Geometry for a drag from `start` to `end` with this tool.
    ///
    /// Returns `None` for the select tool and for drags that would produce an
    /// empty shape (zero radius, zero-area rect, zero-length line).
    pub fn shape_for_drag(
        self,
        start: Point,
        end: Point,
        style: &ToolStyle,
        number: u32,
    ) -> Option<Shape> {
        let (left, top, right, bottom) = normalize_rect(start.x, start.y, end.x, end.y);
        let (width, height) = (right - left, bottom - top);
        let shape = match self {
            Tool::Select => return None,
            Tool::Circle => {
                let radius = start.distance(end);
                if radius <= 0.0 {
                    return None;
                }
                Shape::Circle {
                    x: start.x,
                    y: start.y,
                    radius,
                }
            }
            Tool::Rectangle | Tool::Blur => {
                if width <= 0.0 || height <= 0.0 {
                    return None;
                }
                if self == Tool::Blur {
                    Shape::Blur {
                        x: left,
                        y: top,
                        width,
                        height,
                        amount: DEFAULT_BLUR_AMOUNT,
                    }
                } else {
                    Shape::Rectangle {
                        x: left,
                        y: top,
                        width,
                        height,
                    }
                }
            }
            Tool::Line | Tool::Arrow => {
                if start == end {
                    return None;
                }
                if self == Tool::Arrow {
                    Shape::Arrow {
                        x: start.x,
                        y: start.y,
                        end_x: end.x,
                        end_y: end.y,
                        line_type: style.line_type,
                        arrow_type: style.arrow_type,
                        control_points: Vec::new(),
                    }
                } else {
                    Shape::Line {
                        x: start.x,
                        y: start.y,
                        end_x: end.x,
                        end_y: end.y,
                        line_type: style.line_type,
                        control_points: Vec::new(),
                    }
                }
            }
            Tool::Text => Shape::Text {
                x: start.x,
                y: start.y,
                text: DEFAULT_TEXT.to_string(),
                font_size: DEFAULT_FONT_SIZE,
                font_family: DEFAULT_FONT_FAMILY.to_string(),
                width: DEFAULT_TEXT_BOX.0,
                height: DEFAULT_TEXT_BOX.1,
            },
            Tool::Number => Shape::Number {
                x: start.x,
                y: start.y,
                number,
                radius: DEFAULT_NUMBER_RADIUS,
            },
        };
        Some(shape)
    }

    /// Build a complete annotation for a finished drag
    pub fn build(
        self,
        id: AnnotationId,
        start: Point,
        end: Point,
        style: &ToolStyle,
        number: u32,
    ) -> Option<Annotation> {
        let shape = self.shape_for_drag(start, end, style, number)?;
        Some(Annotation::new(
            id,
            shape,
            style.fill.clone(),
            style.border.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_select_does_not_draw() {
        assert!(!Tool::Select.is_drawing());
        assert!(Tool::Blur.is_drawing());
        assert!(Tool::Number.is_drawing());
    }

    #[test]
    fn rectangle_drag_is_normalized() {
        let shape = Tool::Rectangle
            .shape_for_drag(
                Point::new(110.0, 60.0),
                Point::new(10.0, 10.0),
                &ToolStyle::default(),
                1,
            )
            .unwrap();
        assert_eq!(
            shape,
            Shape::Rectangle {
                x: 10.0,
                y: 10.0,
                width: 100.0,
                height: 50.0
            }
        );
    }

    #[test]
    fn circle_is_centered_on_press_point() {
        let shape = Tool::Circle
            .shape_for_drag(
                Point::new(10.0, 10.0),
                Point::new(13.0, 14.0),
                &ToolStyle::default(),
                1,
            )
            .unwrap();
        assert_eq!(
            shape,
            Shape::Circle {
                x: 10.0,
                y: 10.0,
                radius: 5.0
            }
        );
    }

    #[test]
    fn empty_drags_produce_nothing() {
        let p = Point::new(4.0, 4.0);
        let style = ToolStyle::default();
        for tool in [Tool::Circle, Tool::Rectangle, Tool::Line, Tool::Arrow, Tool::Blur] {
            assert!(tool.shape_for_drag(p, p, &style, 1).is_none(), "{tool:?}");
        }
        assert!(Tool::Select.shape_for_drag(p, p, &style, 1).is_none());
    }

    #[test]
    fn click_tools_place_with_defaults() {
        let p = Point::new(4.0, 4.0);
        let style = ToolStyle::default();
        let number = Tool::Number.build(AnnotationId(9), p, p, &style, 3).unwrap();
        assert_eq!(
            number.shape,
            Shape::Number {
                x: 4.0,
                y: 4.0,
                number: 3,
                radius: 32.0
            }
        );
        let text = Tool::Text.shape_for_drag(p, p, &style, 1).unwrap();
        assert!(matches!(text, Shape::Text { ref text, font_size, .. } if text == "Text" && font_size == 48.0));
    }
}
