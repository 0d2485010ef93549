//! Message types for an editor session
//!
//! This module contains:
//! - Msg enum with nested sub-enums grouped by concern
//! - Mutation, the transient/commit marker carried by continuous input

use crate::domain::{
    Annotation, AnnotationId, AnnotationPatch, BackgroundType, Bounds, GradientChoice,
};

/// How a change enters the document.
///
/// Sliders and drags send `Transient` while the pointer is held and a single
/// `Commit` on release; only commits reach undo history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Transient,
    Commit,
}

// ============================================================================
// Settings
// ============================================================================

/// Background and effect controls
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsMsg {
    BackgroundType(BackgroundType),
    CustomColor(String),
    /// Asset id or data URL; `None` clears the image
    SelectedImage(Option<String>),
    Gradient(GradientChoice),
    Blur(u32),
    Noise(u32),
    Padding(u32),
    BorderRadius(u32),
    ShadowBlur(f32),
    ShadowOffsetX(f32),
    ShadowOffsetY(f32),
    ShadowOpacity(f32),
}

// ============================================================================
// Annotations and history
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationMsg {
    Add(Annotation),
    Update(AnnotationId, AnnotationPatch, Mutation),
    Delete(AnnotationId),
    /// Delete whatever is selected, if anything
    DeleteSelected,
    Select(Option<AnnotationId>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryMsg {
    Undo,
    Redo,
    /// Back to the default document with empty history
    Reset,
}

// ============================================================================
// Output
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum OutputMsg {
    /// Save to the export directory
    Save,
    /// Copy to the clipboard
    Copy,
    /// Close the editor without saving
    Cancel,
    /// Recognize text inside a region of the rendered document
    RecognizeText(Bounds),
}

// ============================================================================
// Main Message Enum
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    Settings(SettingsMsg, Mutation),
    Annotation(AnnotationMsg),
    History(HistoryMsg),
    Output(OutputMsg),
}

// ============================================================================
// Convenience Constructors
// ============================================================================

impl Msg {
    pub fn transient(setting: SettingsMsg) -> Self {
        Self::Settings(setting, Mutation::Transient)
    }
    pub fn commit(setting: SettingsMsg) -> Self {
        Self::Settings(setting, Mutation::Commit)
    }

    pub fn add_annotation(annotation: Annotation) -> Self {
        Self::Annotation(AnnotationMsg::Add(annotation))
    }
    pub fn update_annotation(id: AnnotationId, patch: AnnotationPatch, mutation: Mutation) -> Self {
        Self::Annotation(AnnotationMsg::Update(id, patch, mutation))
    }
    pub fn delete_annotation(id: AnnotationId) -> Self {
        Self::Annotation(AnnotationMsg::Delete(id))
    }
    pub fn delete_selected() -> Self {
        Self::Annotation(AnnotationMsg::DeleteSelected)
    }
    pub fn select(id: Option<AnnotationId>) -> Self {
        Self::Annotation(AnnotationMsg::Select(id))
    }

    pub fn undo() -> Self {
        Self::History(HistoryMsg::Undo)
    }
    pub fn redo() -> Self {
        Self::History(HistoryMsg::Redo)
    }
    pub fn reset() -> Self {
        Self::History(HistoryMsg::Reset)
    }

    pub fn save() -> Self {
        Self::Output(OutputMsg::Save)
    }
    pub fn copy_to_clipboard() -> Self {
        Self::Output(OutputMsg::Copy)
    }
    pub fn cancel() -> Self {
        Self::Output(OutputMsg::Cancel)
    }
    pub fn recognize_text(region: Bounds) -> Self {
        Self::Output(OutputMsg::RecognizeText(region))
    }
}
