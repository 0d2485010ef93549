//! Debounced preview rendering
//!
//! Every request bumps a generation counter, waits out the quiet period and
//! then renders. A render that observes a newer generation at any suspension
//! point drops its result, so the published preview always belongs to the
//! latest request.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tiny_skia::Pixmap;
use tokio::sync::watch;

use super::cache::ImageCache;
use super::resolve_background;
use crate::capture::SubjectImage;
use crate::domain::EditorSettings;
use crate::error::EditorError;
use crate::render;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(50);

/// A displayable preview raster. Live until superseded or the renderer shuts down.
#[derive(Debug, Clone)]
pub struct PreviewHandle {
    id: u64,
    generation: u64,
    image: Arc<Pixmap>,
}

impl PreviewHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn image(&self) -> &Pixmap {
        &self.image
    }

    pub fn shared_image(&self) -> Arc<Pixmap> {
        self.image.clone()
    }
}

#[derive(Debug, Default)]
struct Published {
    current: Option<PreviewHandle>,
    live: BTreeSet<u64>,
    next_id: u64,
    notice: Option<String>,
}

impl Published {
    fn release(&mut self, handle: &PreviewHandle) {
        if self.live.remove(&handle.id) {
            log::debug!("Released preview handle {}", handle.id);
        }
    }
}

pub struct PreviewRenderer {
    subject: SubjectImage,
    cache: Arc<ImageCache>,
    debounce: Duration,
    generation: AtomicU64,
    published: Mutex<Published>,
    updates: watch::Sender<Option<PreviewHandle>>,
}

impl PreviewRenderer {
    pub fn new(subject: SubjectImage, cache: Arc<ImageCache>, debounce: Duration) -> Self {
        let (updates, _) = watch::channel(None);
        Self {
            subject,
            cache,
            debounce,
            generation: AtomicU64::new(0),
            published: Mutex::new(Published::default()),
            updates,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Published> {
        self.published.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Receives every published preview, or `None` after shutdown
    pub fn subscribe(&self) -> watch::Receiver<Option<PreviewHandle>> {
        self.updates.subscribe()
    }

    /// Start a new generation, making every in-flight render stale
    pub fn invalidate(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation() == generation
    }

    /// Render `settings` after the quiet period.
    ///
    /// Returns the published handle, or `None` when a newer request superseded
    /// this one or the render failed (the last good preview stays up).
    pub async fn request(&self, settings: EditorSettings) -> Option<PreviewHandle> {
        let generation = self.invalidate();
        tokio::time::sleep(self.debounce).await;
        if !self.is_current(generation) {
            log::debug!("Preview {} superseded while debouncing", generation);
            return None;
        }

        let background = resolve_background(&self.cache, &settings.background()).await;
        if !self.is_current(generation) {
            log::debug!("Preview {} superseded while loading background", generation);
            return None;
        }

        let subject = self.subject.shared_pixmap();
        let image = background.image.clone();
        let composed = tokio::task::spawn_blocking(move || {
            let mut rng = rand::rng();
            render::compose_base(&subject, &settings, image.as_deref(), &mut rng)
        })
        .await
        .map_err(|e| EditorError::CanvasContextUnavailable(e.to_string()))
        .and_then(|result| result);

        match composed {
            Ok(pixmap) => {
                let notice = background.notice.map(|e| e.user_message());
                self.publish(generation, pixmap, notice)
            }
            Err(e) => {
                log::warn!("Preview {} failed: {}", generation, e);
                if self.is_current(generation) {
                    self.lock().notice = Some(e.user_message());
                }
                None
            }
        }
    }

    fn publish(&self, generation: u64, pixmap: Pixmap, notice: Option<String>) -> Option<PreviewHandle> {
        let mut state = self.lock();
        if !self.is_current(generation) {
            log::debug!("Preview {} superseded while compositing", generation);
            return None;
        }
        state.next_id += 1;
        let handle = PreviewHandle {
            id: state.next_id,
            generation,
            image: Arc::new(pixmap),
        };
        state.live.insert(handle.id);
        if let Some(previous) = state.current.replace(handle.clone()) {
            state.release(&previous);
        }
        state.notice = notice;
        drop(state);

        self.updates.send_replace(Some(handle.clone()));
        Some(handle)
    }

    pub fn current(&self) -> Option<PreviewHandle> {
        self.lock().current.clone()
    }

    /// User-visible message from the latest render, if it had to fall back
    pub fn notice(&self) -> Option<String> {
        self.lock().notice.clone()
    }

    /// Number of handles not yet released
    pub fn live_handles(&self) -> usize {
        self.lock().live.len()
    }

    /// Discard in-flight renders and release the displayed preview
    pub fn shutdown(&self) {
        self.invalidate();
        let mut state = self.lock();
        if let Some(previous) = state.current.take() {
            state.release(&previous);
        }
        drop(state);
        self.updates.send_replace(None);
    }

    /// Queue a preview for every settings change until the sender goes away
    pub async fn follow(self: Arc<Self>, mut changes: watch::Receiver<EditorSettings>) {
        loop {
            let settings = changes.borrow_and_update().clone();
            let renderer = self.clone();
            tokio::spawn(async move {
                renderer.request(settings).await;
            });
            if changes.changed().await.is_err() {
                log::debug!("Settings channel closed, preview stops following");
                break;
            }
        }
    }
}

impl Drop for PreviewRenderer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
