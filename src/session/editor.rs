//! One editor session: store, canvas controller and render pipeline wired together
//!
//! Decode, encode and collaborator failures end here and become a user-visible
//! notice; they never reach the store.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tiny_skia::Pixmap;

use super::messages::{AnnotationMsg, HistoryMsg, Msg, Mutation, OutputMsg, SettingsMsg};
use super::shortcuts::{Key, Modifiers, handle_key_event};
use super::store::EditorStore;
use crate::annotations::{CanvasController, PointerEvent, Redraw};
use crate::assets::AssetRegistry;
use crate::capture::SubjectImage;
use crate::capture::ocr::{TextRecognizer, crop_region};
use crate::config::EditorConfig;
use crate::domain::{BackgroundType, Bounds};
use crate::error::{EditorError, Result};
use crate::pipeline::{
    AssetImageLoader, ClipboardWriter, FileSaver, ImageCache, ImageSaver, NoClipboard,
    RenderPipeline,
};
use crate::render::surface::pixmap_to_rgba;
use crate::render::text::FontBook;

/// What the host should do after a message
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Continue,
    Saved(PathBuf),
    Copied,
    Recognized(String),
    /// The editor was cancelled; the host closes its window
    Closed,
}

/// External services the session hands finished output to
pub struct Collaborators {
    pub saver: Arc<dyn ImageSaver>,
    pub clipboard: Arc<dyn ClipboardWriter>,
    pub recognizer: Option<Arc<dyn TextRecognizer>>,
}

impl Collaborators {
    /// File saver into the configured export directory, no clipboard, no OCR
    pub fn for_config(config: &EditorConfig) -> Self {
        Self {
            saver: Arc::new(FileSaver::in_dir(config.export_dir())),
            clipboard: Arc::new(NoClipboard),
            recognizer: None,
        }
    }
}

pub struct EditorSession {
    store: EditorStore,
    canvas: CanvasController,
    pipeline: RenderPipeline,
    config: EditorConfig,
    collaborators: Collaborators,
    notice: Option<String>,
    preview_task: Option<tokio::task::JoinHandle<()>>,
}

impl EditorSession {
    pub fn new(subject: SubjectImage, config: EditorConfig, collaborators: Collaborators) -> Self {
        let tuning = &config.tuning;
        let registry = match &tuning.asset_root {
            Some(root) => AssetRegistry::new(root),
            None => AssetRegistry::from_data_dir(),
        };
        log::debug!("Assets resolved from {}", registry.root().display());
        let cache = ImageCache::new(
            tuning.image_cache_capacity,
            Arc::new(AssetImageLoader::new(registry)),
        );
        let fonts = FontBook::with_system_fallback(&tuning.font_paths);
        if fonts.is_empty() {
            log::warn!("No fonts found, text and number labels will not render");
        }
        let pipeline = RenderPipeline::new(
            subject,
            Arc::new(cache),
            Arc::new(fonts),
            Duration::from_millis(tuning.preview_debounce_ms),
        );
        let store = EditorStore::with_background(&config.default_background, tuning.history_limit);

        Self {
            store,
            canvas: CanvasController::new(),
            pipeline,
            config,
            collaborators,
            notice: None,
            preview_task: None,
        }
    }

    /// Re-render the preview on every settings change; must run inside a tokio runtime
    pub fn start_preview(&mut self) {
        if self.preview_task.is_some() {
            return;
        }
        let preview = self.pipeline.preview().clone();
        let changes = self.store.subscribe_settings();
        self.preview_task = Some(tokio::spawn(preview.follow(changes)));
    }

    pub fn store(&self) -> &EditorStore {
        &self.store
    }

    pub fn canvas(&self) -> &CanvasController {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut CanvasController {
        &mut self.canvas
    }

    pub fn pipeline(&self) -> &RenderPipeline {
        &self.pipeline
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Latest user-visible message: the session's own, else the preview's
    pub fn notice(&self) -> Option<String> {
        self.notice
            .clone()
            .or_else(|| self.pipeline.preview().notice())
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    fn report(&mut self, err: &EditorError) {
        log::error!("{}", err);
        self.notice = Some(err.user_message());
    }

    pub fn key_to_msg(&self, key: &Key, modifiers: Modifiers) -> Option<Msg> {
        handle_key_event(key, modifiers, self.store.selection().is_some())
    }

    pub fn pointer(&mut self, event: PointerEvent) -> Redraw {
        self.canvas.handle_pointer(&mut self.store, event)
    }

    pub fn animation_frame(&mut self) -> bool {
        self.canvas.on_animation_frame(&mut self.store)
    }

    /// Latest preview with annotations, draft and selection drawn on top
    pub fn display(&self) -> Result<Option<Pixmap>> {
        let Some(preview) = self.pipeline.preview().current() else {
            return Ok(None);
        };
        self.canvas
            .render_overlay(preview.image(), &self.store, self.pipeline.fonts())
            .map(Some)
    }

    /// Use an uploaded data URL as the background, as one history entry
    pub fn use_uploaded_background(&mut self, data_url: &str) {
        self.config.add_uploaded_image(data_url);
        self.store.set_background_type_transient(BackgroundType::Image);
        self.store.commit_selected_image(Some(data_url.to_string()));
    }

    pub async fn update(&mut self, msg: Msg) -> Outcome {
        match msg {
            Msg::Settings(setting, mode) => self.store.apply_setting(setting, mode),
            Msg::Annotation(msg) => self.update_annotation(msg),
            Msg::History(HistoryMsg::Undo) => {
                self.store.undo();
            }
            Msg::History(HistoryMsg::Redo) => {
                self.store.redo();
            }
            Msg::History(HistoryMsg::Reset) => self.store.reset(),
            Msg::Output(output) => return self.output(output).await,
        }
        Outcome::Continue
    }

    fn update_annotation(&mut self, msg: AnnotationMsg) {
        match msg {
            AnnotationMsg::Add(annotation) => {
                self.store.add_annotation(annotation);
            }
            AnnotationMsg::Update(id, patch, Mutation::Transient) => {
                self.store.update_annotation_transient(id, patch);
            }
            AnnotationMsg::Update(id, patch, Mutation::Commit) => {
                self.store.update_annotation_commit(id, patch);
            }
            AnnotationMsg::Delete(id) => {
                self.store.delete_annotation(id);
            }
            AnnotationMsg::DeleteSelected => {
                if let Some(id) = self.store.selection() {
                    self.store.delete_annotation(id);
                }
            }
            AnnotationMsg::Select(id) => {
                self.store.select(id);
            }
        }
    }

    async fn output(&mut self, msg: OutputMsg) -> Outcome {
        match msg {
            OutputMsg::Save => self.save().await,
            OutputMsg::Copy => self.copy().await,
            OutputMsg::Cancel => {
                self.close();
                Outcome::Closed
            }
            OutputMsg::RecognizeText(region) => match self.recognize(region).await {
                Ok(text) => Outcome::Recognized(text),
                Err(e) => {
                    self.report(&e);
                    Outcome::Continue
                }
            },
        }
    }

    async fn save(&mut self) -> Outcome {
        let snapshot = self.store.snapshot().clone();
        let saver = self.collaborators.saver.clone();
        let path = match self.pipeline.save(&snapshot, saver.as_ref()).await {
            Ok(path) => path,
            Err(e) => {
                self.report(&e);
                return Outcome::Continue;
            }
        };
        if self.config.copy_to_clipboard {
            let clipboard = self.collaborators.clipboard.clone();
            if let Err(e) = self.pipeline.copy(&snapshot, clipboard.as_ref()).await {
                self.report(&e);
            }
        }
        Outcome::Saved(path)
    }

    async fn copy(&mut self) -> Outcome {
        let snapshot = self.store.snapshot().clone();
        let clipboard = self.collaborators.clipboard.clone();
        match self.pipeline.copy(&snapshot, clipboard.as_ref()).await {
            Ok(()) => Outcome::Copied,
            Err(e) => {
                self.report(&e);
                Outcome::Continue
            }
        }
    }

    async fn recognize(&self, region: Bounds) -> Result<String> {
        let recognizer = self
            .collaborators
            .recognizer
            .clone()
            .ok_or_else(|| EditorError::OcrFailure("no text recognizer configured".to_string()))?;
        let export = self.pipeline.export(self.store.snapshot()).await?;
        let rgba = pixmap_to_rgba(&export.pixmap);
        let crop = crop_region(&rgba, region)
            .ok_or_else(|| EditorError::OcrFailure("region is outside the image".to_string()))?;
        recognizer.recognize(crop).await
    }

    /// Stop following settings and release the preview
    pub fn close(&mut self) {
        if let Some(task) = self.preview_task.take() {
            task.abort();
        }
        self.pipeline.shutdown();
    }
}

impl Drop for EditorSession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Convenience for hosts that forward settings sliders directly
pub fn slider(setting: SettingsMsg, released: bool) -> Msg {
    if released {
        Msg::commit(setting)
    } else {
        Msg::transient(setting)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorTuning;
    use crate::domain::{Point, Tool};
    use async_trait::async_trait;
    use image::{Rgba, RgbaImage};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingRecognizer(Mutex<Vec<(u32, u32)>>);

    #[async_trait]
    impl TextRecognizer for RecordingRecognizer {
        async fn recognize(&self, region: RgbaImage) -> Result<String> {
            self.0.lock().unwrap().push(region.dimensions());
            Ok("hello".to_string())
        }
    }

    fn session(dir: &std::path::Path, recognizer: Option<Arc<dyn TextRecognizer>>) -> EditorSession {
        let config = EditorConfig {
            tuning: EditorTuning {
                asset_root: Some(dir.join("assets")),
                preview_debounce_ms: 10,
                ..Default::default()
            },
            save_dir: Some(dir.join("out")),
            ..Default::default()
        };
        let collaborators = Collaborators {
            recognizer,
            ..Collaborators::for_config(&config)
        };
        let subject =
            SubjectImage::from_rgba(RgbaImage::from_pixel(40, 30, Rgba([9, 9, 9, 255]))).unwrap();
        EditorSession::new(subject, config, collaborators)
    }

    #[tokio::test]
    async fn save_writes_png_into_export_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path(), None);
        session
            .update(Msg::commit(SettingsMsg::BackgroundType(BackgroundType::White)))
            .await;

        let Outcome::Saved(path) = session.update(Msg::save()).await else {
            panic!("save failed: {:?}", session.notice());
        };
        assert!(path.starts_with(dir.path().join("out")));
        let saved = image::open(&path).unwrap();
        assert_eq!((saved.width(), saved.height()), (240, 230));
    }

    #[tokio::test]
    async fn copy_failure_becomes_a_notice() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path(), None);
        assert_eq!(session.update(Msg::copy_to_clipboard()).await, Outcome::Continue);
        assert!(session.notice().unwrap().contains("Clipboard"));
    }

    #[tokio::test]
    async fn delete_key_removes_the_selected_annotation() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path(), None);
        session.canvas_mut().set_tool(Tool::Rectangle);
        session.pointer(PointerEvent::Down(Point::new(10.0, 10.0)));
        session.pointer(PointerEvent::Up(Point::new(110.0, 60.0)));
        session.canvas_mut().set_tool(Tool::Select);
        session.pointer(PointerEvent::Down(Point::new(50.0, 30.0)));
        session.pointer(PointerEvent::Up(Point::new(50.0, 30.0)));
        assert!(session.store().selection().is_some());

        let msg = session.key_to_msg(&Key::Delete, Modifiers::NONE).unwrap();
        session.update(msg).await;
        assert!(session.store().annotations().is_empty());
        assert_eq!(session.store().selection(), None);
    }

    #[tokio::test]
    async fn uploaded_background_is_one_undo_step() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path(), None);
        session.update(Msg::commit(SettingsMsg::BackgroundType(BackgroundType::Gray))).await;
        let url = "data:image/png;base64,AAAA";
        session.use_uploaded_background(url);
        assert_eq!(session.config().uploaded_images, vec![url.to_string()]);
        assert_eq!(session.store().settings().background_type, BackgroundType::Image);

        session.update(Msg::undo()).await;
        assert_eq!(session.store().settings().background_type, BackgroundType::Gray);
    }

    #[tokio::test]
    async fn text_recognition_receives_the_cropped_region() {
        let dir = tempfile::tempdir().unwrap();
        let recognizer = Arc::new(RecordingRecognizer::default());
        let mut session = session(dir.path(), Some(recognizer.clone()));
        let outcome = session
            .update(Msg::recognize_text(Bounds::from_xywh(100.0, 100.0, 30.0, 20.0)))
            .await;
        assert_eq!(outcome, Outcome::Recognized("hello".to_string()));
        assert_eq!(recognizer.0.lock().unwrap().as_slice(), &[(30, 20)]);
    }

    #[tokio::test]
    async fn preview_follows_the_store_until_cancelled() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path(), None);
        let mut updates = session.pipeline().preview().subscribe();
        session.start_preview();
        updates.changed().await.unwrap();
        assert!(session.display().unwrap().is_some());
        // bg-18 is not installed in the temp asset root
        assert!(session.notice().unwrap().contains("bg-18"));

        assert_eq!(session.update(Msg::cancel()).await, Outcome::Closed);
        assert_eq!(session.pipeline().preview().live_handles(), 0);
    }

    #[test]
    fn sliders_commit_on_release() {
        assert_eq!(slider(SettingsMsg::Noise(3), false), Msg::transient(SettingsMsg::Noise(3)));
        assert_eq!(slider(SettingsMsg::Noise(3), true), Msg::commit(SettingsMsg::Noise(3)));
    }
}
