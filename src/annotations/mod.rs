//! Interactive canvas controller
//!
//! This module provides:
//! - CanvasController: tool state, live drafts and drag tracking
//! - Overlay rendering of annotations, drafts and selection guides
//! - Pointer handlers (handlers.rs)

pub mod handlers;

use tiny_skia::Pixmap;

use crate::domain::{
    Annotation, AnnotationId, IdGenerator, Point, ShapeKind, Tool, ToolStyle,
};
use crate::error::Result;
use crate::render::annotations::{
    draw_annotation, draw_annotations, draw_blur_guide, draw_selection_highlight,
};
use crate::render::text::FontBook;
use crate::session::store::EditorStore;

pub use handlers::{PointerEvent, Redraw};

/// Id carried by the uncommitted draft shown while drawing
const DRAFT_ID: AnnotationId = AnnotationId(0);

#[derive(Debug, Clone, PartialEq)]
enum Gesture {
    Idle,
    Drawing {
        start: Point,
        end: Point,
    },
    Dragging {
        /// The annotation as it was when the drag started
        origin: Annotation,
        grab: Point,
        latest: Point,
        /// A transient move of this drag has reached the store
        applied: bool,
    },
}

/// Turns pointer input into annotation edits on an [`EditorStore`]
#[derive(Debug)]
pub struct CanvasController {
    tool: Tool,
    style: ToolStyle,
    ids: IdGenerator,
    /// Label of the next numbered marker; resets with the session
    next_number: u32,
    gesture: Gesture,
    /// A drag position is waiting for the next animation frame
    frame_pending: bool,
}

impl Default for CanvasController {
    fn default() -> Self {
        Self::new()
    }
}

impl CanvasController {
    pub fn new() -> Self {
        Self {
            tool: Tool::Select,
            style: ToolStyle::default(),
            ids: IdGenerator::new(),
            next_number: 1,
            gesture: Gesture::Idle,
            frame_pending: false,
        }
    }

    /// Controller for a document that already holds annotations
    pub fn for_document(annotations: &[Annotation]) -> Self {
        let first_free = annotations.iter().map(|a| a.id.0).max().unwrap_or(0) + 1;
        Self {
            ids: IdGenerator::starting_at(first_free),
            ..Self::new()
        }
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Switch tools; an unfinished draft is dropped
    pub fn set_tool(&mut self, tool: Tool) {
        if matches!(self.gesture, Gesture::Drawing { .. }) {
            self.gesture = Gesture::Idle;
        }
        self.tool = tool;
    }

    pub fn style(&self) -> &ToolStyle {
        &self.style
    }

    pub fn style_mut(&mut self) -> &mut ToolStyle {
        &mut self.style
    }

    pub fn next_number(&self) -> u32 {
        self.next_number
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.gesture, Gesture::Dragging { .. })
    }

    pub fn frame_pending(&self) -> bool {
        self.frame_pending
    }

    /// The not-yet-committed shape under the pointer while drawing
    pub fn draft(&self) -> Option<Annotation> {
        match &self.gesture {
            Gesture::Drawing { start, end } => {
                self.tool
                    .build(DRAFT_ID, *start, *end, &self.style, self.next_number)
            }
            _ => None,
        }
    }

    /// Draw the document's annotations, the draft and the guides over a preview raster
    pub fn render_overlay(
        &self,
        base: &Pixmap,
        store: &EditorStore,
        fonts: &FontBook,
    ) -> Result<Pixmap> {
        let mut canvas = base.clone();
        draw_annotations(&mut canvas, store.annotations(), fonts)?;
        if let Some(draft) = self.draft() {
            draw_annotation(&mut canvas, &draft, fonts)?;
        }
        for blur in store
            .annotations()
            .iter()
            .filter(|a| a.shape.kind() == ShapeKind::Blur)
        {
            draw_blur_guide(&mut canvas, blur);
        }
        if let Some(selected) = store.selected() {
            draw_selection_highlight(&mut canvas, selected);
        }
        Ok(canvas)
    }
}
