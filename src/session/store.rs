//! Editor state store: the single source of truth for one document
//!
//! Every mutable settings field has a transient setter, for continuous input
//! such as a slider being dragged, and a commit setter for the release. The
//! first transient update of a gesture remembers the document as it was; the
//! closing commit records that state once, however many transient updates
//! came in between.

use std::sync::Arc;

use tokio::sync::watch;

use super::history::History;
use super::messages::{Mutation, SettingsMsg};
use crate::domain::{
    Annotation, AnnotationId, AnnotationPatch, BackgroundType, EditorSettings, GradientChoice,
    Snapshot,
};

macro_rules! setting_setters {
    ($( $field:ident $(. $sub:ident)? : $ty:ty => $transient:ident, $commit:ident; )*) => {
        $(
            pub fn $transient(&mut self, value: $ty) {
                self.mutate(Mutation::Transient, |doc| doc.settings.$field $(.$sub)? = value);
            }

            pub fn $commit(&mut self, value: $ty) {
                self.mutate(Mutation::Commit, |doc| doc.settings.$field $(.$sub)? = value);
            }
        )*
    };
}

pub struct EditorStore {
    current: Snapshot,
    /// Document restored by [`reset`](Self::reset)
    initial: Snapshot,
    history: History<Snapshot>,
    /// Document as it was before the first transient update of the open gesture
    gesture_origin: Option<Snapshot>,
    selection: Option<AnnotationId>,
    settings_tx: watch::Sender<EditorSettings>,
    document_tx: watch::Sender<Snapshot>,
}

impl std::fmt::Debug for EditorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorStore")
            .field("annotations", &self.current.annotations.len())
            .field("selection", &self.selection)
            .field("past", &self.history.past_len())
            .field("future", &self.history.future_len())
            .field("in_gesture", &self.gesture_origin.is_some())
            .finish()
    }
}

impl Default for EditorStore {
    fn default() -> Self {
        Self::new(Snapshot::default(), super::history::DEFAULT_HISTORY_LIMIT)
    }
}

impl EditorStore {
    pub fn new(initial: Snapshot, history_limit: usize) -> Self {
        let initial = Snapshot {
            settings: initial.settings.clamped(),
            annotations: initial.annotations,
        };
        let (settings_tx, _) = watch::channel(initial.settings.clone());
        let (document_tx, _) = watch::channel(initial.clone());
        Self {
            current: initial.clone(),
            initial,
            history: History::with_limit(history_limit),
            gesture_origin: None,
            selection: None,
            settings_tx,
            document_tx,
        }
    }

    /// Store whose default document uses `background` (asset id or data URL)
    pub fn with_background(background: &str, history_limit: usize) -> Self {
        let settings = EditorSettings {
            background_type: BackgroundType::Image,
            selected_image: Some(background.to_string()),
            ..Default::default()
        };
        Self::new(
            Snapshot {
                settings,
                annotations: Arc::default(),
            },
            history_limit,
        )
    }

    // ------------------------------------------------------------------
    // Reading
    // ------------------------------------------------------------------

    pub fn snapshot(&self) -> &Snapshot {
        &self.current
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.current.settings
    }

    pub fn annotations(&self) -> &[Annotation] {
        self.current.annotations()
    }

    pub fn annotation(&self, id: AnnotationId) -> Option<&Annotation> {
        self.current.find(id)
    }

    pub fn selection(&self) -> Option<AnnotationId> {
        self.selection
    }

    pub fn selected(&self) -> Option<&Annotation> {
        self.selection.and_then(|id| self.current.find(id))
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn past_len(&self) -> usize {
        self.history.past_len()
    }

    pub fn future_len(&self) -> usize {
        self.history.future_len()
    }

    /// Settings changes only; annotation edits do not wake this receiver
    pub fn subscribe_settings(&self) -> watch::Receiver<EditorSettings> {
        self.settings_tx.subscribe()
    }

    pub fn subscribe_document(&self) -> watch::Receiver<Snapshot> {
        self.document_tx.subscribe()
    }

    // ------------------------------------------------------------------
    // Core mutation
    // ------------------------------------------------------------------

    fn publish(&self) {
        let settings = &self.current.settings;
        self.settings_tx.send_if_modified(|published| {
            if published != settings {
                *published = settings.clone();
                true
            } else {
                false
            }
        });
        self.document_tx.send_replace(self.current.clone());
    }

    /// Apply `change` to the live document; returns whether it changed anything.
    ///
    /// A commit records the pre-gesture document, and only when the gesture
    /// actually changed something.
    fn mutate(&mut self, mode: Mutation, change: impl FnOnce(&mut Snapshot)) -> bool {
        let before = match mode {
            Mutation::Transient => {
                if self.gesture_origin.is_none() {
                    self.gesture_origin = Some(self.current.clone());
                }
                None
            }
            Mutation::Commit => Some(
                self.gesture_origin
                    .take()
                    .unwrap_or_else(|| self.current.clone()),
            ),
        };

        let previous = self.current.clone();
        change(&mut self.current);
        self.current.settings = std::mem::take(&mut self.current.settings).clamped();
        let changed = self.current != previous;

        if let Some(before) = before
            && before != self.current
        {
            self.history.record(before);
        }
        if changed {
            self.publish();
        }
        changed
    }

    fn sync_selection(&mut self) {
        if let Some(id) = self.selection
            && self.current.find(id).is_none()
        {
            self.selection = None;
        }
    }

    // ------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------

    setting_setters! {
        background_type: BackgroundType => set_background_type_transient, commit_background_type;
        custom_color: String => set_custom_color_transient, commit_custom_color;
        selected_image: Option<String> => set_selected_image_transient, commit_selected_image;
        gradient: GradientChoice => set_gradient_transient, commit_gradient;
        blur_amount: u32 => set_blur_transient, commit_blur;
        noise_amount: u32 => set_noise_transient, commit_noise;
        padding: u32 => set_padding_transient, commit_padding;
        border_radius: u32 => set_border_radius_transient, commit_border_radius;
        shadow.blur: f32 => set_shadow_blur_transient, commit_shadow_blur;
        shadow.offset_x: f32 => set_shadow_offset_x_transient, commit_shadow_offset_x;
        shadow.offset_y: f32 => set_shadow_offset_y_transient, commit_shadow_offset_y;
        shadow.opacity: f32 => set_shadow_opacity_transient, commit_shadow_opacity;
    }

    /// Route a settings message to its transient or commit setter
    pub fn apply_setting(&mut self, msg: SettingsMsg, mode: Mutation) {
        use Mutation::{Commit, Transient};
        match (msg, mode) {
            (SettingsMsg::BackgroundType(v), Transient) => self.set_background_type_transient(v),
            (SettingsMsg::BackgroundType(v), Commit) => self.commit_background_type(v),
            (SettingsMsg::CustomColor(v), Transient) => self.set_custom_color_transient(v),
            (SettingsMsg::CustomColor(v), Commit) => self.commit_custom_color(v),
            (SettingsMsg::SelectedImage(v), Transient) => self.set_selected_image_transient(v),
            (SettingsMsg::SelectedImage(v), Commit) => self.commit_selected_image(v),
            (SettingsMsg::Gradient(v), Transient) => self.set_gradient_transient(v),
            (SettingsMsg::Gradient(v), Commit) => self.commit_gradient(v),
            (SettingsMsg::Blur(v), Transient) => self.set_blur_transient(v),
            (SettingsMsg::Blur(v), Commit) => self.commit_blur(v),
            (SettingsMsg::Noise(v), Transient) => self.set_noise_transient(v),
            (SettingsMsg::Noise(v), Commit) => self.commit_noise(v),
            (SettingsMsg::Padding(v), Transient) => self.set_padding_transient(v),
            (SettingsMsg::Padding(v), Commit) => self.commit_padding(v),
            (SettingsMsg::BorderRadius(v), Transient) => self.set_border_radius_transient(v),
            (SettingsMsg::BorderRadius(v), Commit) => self.commit_border_radius(v),
            (SettingsMsg::ShadowBlur(v), Transient) => self.set_shadow_blur_transient(v),
            (SettingsMsg::ShadowBlur(v), Commit) => self.commit_shadow_blur(v),
            (SettingsMsg::ShadowOffsetX(v), Transient) => self.set_shadow_offset_x_transient(v),
            (SettingsMsg::ShadowOffsetX(v), Commit) => self.commit_shadow_offset_x(v),
            (SettingsMsg::ShadowOffsetY(v), Transient) => self.set_shadow_offset_y_transient(v),
            (SettingsMsg::ShadowOffsetY(v), Commit) => self.commit_shadow_offset_y(v),
            (SettingsMsg::ShadowOpacity(v), Transient) => self.set_shadow_opacity_transient(v),
            (SettingsMsg::ShadowOpacity(v), Commit) => self.commit_shadow_opacity(v),
        }
    }

    // ------------------------------------------------------------------
    // Annotations
    // ------------------------------------------------------------------

    /// Append an annotation on top of the others as one history entry
    pub fn add_annotation(&mut self, annotation: Annotation) -> AnnotationId {
        let id = annotation.id;
        if self.current.find(id).is_some() {
            log::warn!("Ignoring duplicate {}", id);
            return id;
        }
        self.mutate(Mutation::Commit, |doc| doc.annotations_mut().push(annotation));
        log::debug!("Added {}", id);
        id
    }

    fn patch(&mut self, id: AnnotationId, patch: AnnotationPatch, mode: Mutation) -> bool {
        let Some(index) = self.current.annotations.iter().position(|a| a.id == id) else {
            log::debug!("Update for unknown {}", id);
            return false;
        };
        let mut updated = self.current.annotations[index].clone();
        if !updated.apply(patch) {
            log::warn!("Patch does not fit {}", id);
            return false;
        }
        self.mutate(mode, |doc| doc.annotations_mut()[index] = updated)
    }

    /// Patch an annotation without touching history
    pub fn update_annotation_transient(&mut self, id: AnnotationId, patch: AnnotationPatch) -> bool {
        self.patch(id, patch, Mutation::Transient)
    }

    /// Patch an annotation and close the gesture as one history entry
    pub fn update_annotation_commit(&mut self, id: AnnotationId, patch: AnnotationPatch) -> bool {
        self.patch(id, patch, Mutation::Commit)
    }

    pub fn delete_annotation(&mut self, id: AnnotationId) -> bool {
        if self.current.find(id).is_none() {
            return false;
        }
        self.mutate(Mutation::Commit, |doc| doc.annotations_mut().retain(|a| a.id != id));
        if self.selection == Some(id) {
            self.selection = None;
        }
        log::debug!("Deleted {}", id);
        true
    }

    /// Select an existing annotation, or clear the selection
    pub fn select(&mut self, id: Option<AnnotationId>) -> bool {
        match id {
            Some(id) if self.current.find(id).is_none() => false,
            _ => {
                self.selection = id;
                true
            }
        }
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    /// Drop an open gesture, restoring the document from before it began
    pub fn abandon_gesture(&mut self) {
        if let Some(origin) = self.gesture_origin.take()
            && origin != self.current
        {
            self.current = origin;
            self.sync_selection();
            self.publish();
        }
    }

    pub fn undo(&mut self) -> bool {
        self.abandon_gesture();
        let Some(previous) = self.history.undo(self.current.clone()) else {
            return false;
        };
        self.current = previous;
        self.sync_selection();
        self.publish();
        true
    }

    pub fn redo(&mut self) -> bool {
        self.abandon_gesture();
        let Some(next) = self.history.redo(self.current.clone()) else {
            return false;
        };
        self.current = next;
        self.sync_selection();
        self.publish();
        true
    }

    /// Restore the initial document and forget history and selection
    pub fn reset(&mut self) {
        self.gesture_origin = None;
        self.history.clear();
        self.selection = None;
        self.current = self.initial.clone();
        self.publish();
    }
}
