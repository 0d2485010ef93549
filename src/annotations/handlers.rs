//! Pointer handlers
//!
//! Select mode hit-tests and drags; every other tool draws. Drag positions are
//! coalesced to at most one store update per animation frame.

use super::{CanvasController, DRAFT_ID, Gesture};
use crate::domain::{AnnotationPatch, Point, Tool};
use crate::session::store::EditorStore;

/// Pointer input in canvas coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(Point),
    Move(Point),
    Up(Point),
    /// Pointer left the canvas; ends the gesture where it last was
    Leave,
}

/// What the caller should do about the display after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redraw {
    None,
    Now,
    /// Call [`CanvasController::on_animation_frame`] on the next frame
    NextFrame,
}

impl CanvasController {
    pub fn handle_pointer(&mut self, store: &mut EditorStore, event: PointerEvent) -> Redraw {
        match event {
            PointerEvent::Down(p) => self.pointer_down(store, p),
            PointerEvent::Move(p) => self.pointer_move(p),
            PointerEvent::Up(p) => self.pointer_up(store, Some(p)),
            PointerEvent::Leave => self.pointer_up(store, None),
        }
    }

    fn pointer_down(&mut self, store: &mut EditorStore, p: Point) -> Redraw {
        if self.tool.is_drawing() {
            self.gesture = Gesture::Drawing { start: p, end: p };
            return Redraw::Now;
        }

        // Topmost first: later annotations draw on top
        let hit = store
            .annotations()
            .iter()
            .rev()
            .find(|a| a.contains(p))
            .cloned();
        match hit {
            Some(annotation) => {
                log::debug!("Selected {}", annotation.id);
                store.select(Some(annotation.id));
                self.gesture = Gesture::Dragging {
                    origin: annotation,
                    grab: p,
                    latest: p,
                    applied: false,
                };
            }
            None => {
                store.select(None);
                self.gesture = Gesture::Idle;
            }
        }
        Redraw::Now
    }

    fn pointer_move(&mut self, p: Point) -> Redraw {
        match &mut self.gesture {
            Gesture::Drawing { end, .. } => {
                *end = p;
                Redraw::Now
            }
            Gesture::Dragging { latest, .. } => {
                *latest = p;
                if self.frame_pending {
                    Redraw::None
                } else {
                    self.frame_pending = true;
                    Redraw::NextFrame
                }
            }
            Gesture::Idle => Redraw::None,
        }
    }

    /// Apply the pending drag position; returns whether anything was applied
    pub fn on_animation_frame(&mut self, store: &mut EditorStore) -> bool {
        if !self.frame_pending {
            return false;
        }
        self.frame_pending = false;
        let Gesture::Dragging {
            origin,
            grab,
            latest,
            applied,
        } = &mut self.gesture
        else {
            return false;
        };
        let moved = origin.translated(latest.x - grab.x, latest.y - grab.y);
        let updated =
            store.update_annotation_transient(moved.id, AnnotationPatch::Geometry(moved.shape));
        *applied |= updated;
        updated
    }

    fn pointer_up(&mut self, store: &mut EditorStore, p: Option<Point>) -> Redraw {
        self.frame_pending = false;
        match std::mem::replace(&mut self.gesture, Gesture::Idle) {
            Gesture::Drawing { start, end } => {
                let end = p.unwrap_or(end);
                let Some(mut annotation) =
                    self.tool
                        .build(DRAFT_ID, start, end, &self.style, self.next_number)
                else {
                    log::debug!("Discarding empty {:?} draft", self.tool);
                    return Redraw::Now;
                };
                annotation.id = self.ids.generate();
                if self.tool == Tool::Number {
                    self.next_number += 1;
                }
                store.add_annotation(annotation);
                Redraw::Now
            }
            Gesture::Dragging {
                origin,
                grab,
                latest,
                applied,
            } => {
                let end = p.unwrap_or(latest);
                let moved = origin.translated(end.x - grab.x, end.y - grab.y);
                if moved.shape == origin.shape {
                    // Only undo transient moves this drag made itself
                    if applied {
                        store.abandon_gesture();
                    }
                } else {
                    store.update_annotation_commit(moved.id, AnnotationPatch::Geometry(moved.shape));
                }
                Redraw::Now
            }
            Gesture::Idle => Redraw::None,
        }
    }
}
