//! Bounded cache of decoded background images
//!
//! Shared by the preview and export paths. Entries are evicted oldest-first
//! by insertion order; concurrent requests for a reference that is still
//! decoding wait on the same decode.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use tiny_skia::Pixmap;

use crate::assets::AssetRegistry;
use crate::capture::image::{decode_reference, short};
use crate::error::{EditorError, Result};
use crate::render::surface::rgba_to_pixmap;

/// Decoded raster ready to draw
pub type DecodedImage = Arc<Pixmap>;

/// Turns an image reference into a decoded raster
#[async_trait]
pub trait ImageLoader: Send + Sync {
    async fn load(&self, reference: &str) -> Result<DecodedImage>;
}

/// Loader that resolves asset ids through the registry and decodes files and data URLs
#[derive(Debug, Clone)]
pub struct AssetImageLoader {
    registry: AssetRegistry,
}

impl AssetImageLoader {
    pub fn new(registry: AssetRegistry) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl ImageLoader for AssetImageLoader {
    async fn load(&self, reference: &str) -> Result<DecodedImage> {
        let location = self.registry.locate(reference).to_string();
        let label = short(reference);
        let task_label = label.clone();
        tokio::task::spawn_blocking(move || {
            let rgba = decode_reference(&location).map_err(|e| match e {
                EditorError::ImageDecodeFailure { reason, .. } => {
                    EditorError::decode(task_label.clone(), reason)
                }
                other => other,
            })?;
            rgba_to_pixmap(&rgba)
                .map(Arc::new)
                .map_err(|e| EditorError::decode(task_label, e))
        })
        .await
        .map_err(|e| EditorError::decode(label, e))?
    }
}

type PendingDecode = Shared<BoxFuture<'static, Result<DecodedImage>>>;

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, DecodedImage>,
    /// Insertion order of `entries`
    order: VecDeque<String>,
    in_flight: HashMap<String, PendingDecode>,
}

pub struct ImageCache {
    capacity: usize,
    loader: Arc<dyn ImageLoader>,
    state: Mutex<CacheState>,
}

impl std::fmt::Debug for ImageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("ImageCache")
            .field("capacity", &self.capacity)
            .field("entries", &state.order)
            .field("in_flight", &state.in_flight.len())
            .finish()
    }
}

impl ImageCache {
    pub fn new(capacity: usize, loader: Arc<dyn ImageLoader>) -> Self {
        Self {
            capacity: capacity.max(1),
            loader,
            state: Mutex::new(CacheState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Decoded image for `reference`, decoding on a miss.
    ///
    /// Failed decodes are not cached, so a later request retries.
    pub async fn get(&self, reference: &str) -> Result<DecodedImage> {
        let pending = {
            let mut state = self.lock();
            if let Some(image) = state.entries.get(reference) {
                return Ok(image.clone());
            }
            match state.in_flight.get(reference) {
                Some(pending) => pending.clone(),
                None => {
                    log::debug!("Decoding {}", short(reference));
                    let loader = self.loader.clone();
                    let key = reference.to_string();
                    let pending = async move { loader.load(&key).await }.boxed().shared();
                    state.in_flight.insert(reference.to_string(), pending.clone());
                    pending
                }
            }
        };

        let result = pending.clone().await;

        let mut state = self.lock();
        // A slow waiter must not drop a newer decode started for the same reference
        if state
            .in_flight
            .get(reference)
            .is_some_and(|current| current.ptr_eq(&pending))
        {
            state.in_flight.remove(reference);
        }
        match &result {
            Ok(image) => self.insert_locked(&mut state, reference, image.clone()),
            Err(e) => log::warn!("{}", e),
        }
        result
    }

    fn insert_locked(&self, state: &mut CacheState, reference: &str, image: DecodedImage) {
        if state.entries.contains_key(reference) {
            return;
        }
        state.entries.insert(reference.to_string(), image);
        state.order.push_back(reference.to_string());
        while state.order.len() > self.capacity {
            if let Some(oldest) = state.order.pop_front() {
                log::debug!("Evicting {}", short(&oldest));
                state.entries.remove(&oldest);
            }
        }
    }

    /// Cached image without triggering a decode
    pub fn peek(&self, reference: &str) -> Option<DecodedImage> {
        self.lock().entries.get(reference).cloned()
    }

    pub fn contains(&self, reference: &str) -> bool {
        self.lock().entries.contains_key(reference)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct CountingLoader {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ImageLoader for CountingLoader {
        async fn load(&self, reference: &str) -> Result<DecodedImage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            if reference.starts_with("bad") {
                return Err(EditorError::decode(reference, "corrupt"));
            }
            Pixmap::new(2, 2)
                .map(Arc::new)
                .ok_or_else(|| EditorError::decode(reference, "empty"))
        }
    }

    fn cache(capacity: usize) -> (ImageCache, Arc<CountingLoader>) {
        let loader = Arc::new(CountingLoader::default());
        (ImageCache::new(capacity, loader.clone()), loader)
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_requests_share_one_decode() {
        let (cache, loader) = cache(4);
        let (a, b) = tokio::join!(cache.get("bg-18"), cache.get("bg-18"));
        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);

        cache.get("bg-18").await.unwrap();
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn eviction_follows_insertion_order_not_access() {
        let (cache, _) = cache(2);
        cache.get("a").await.unwrap();
        cache.get("b").await.unwrap();
        // a hit does not refresh "a"
        cache.get("a").await.unwrap();
        cache.get("c").await.unwrap();
        assert!(!cache.contains("a"));
        assert!(cache.contains("b"));
        assert!(cache.contains("c"));
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failures_name_the_reference_and_are_retried() {
        let (cache, loader) = cache(2);
        let err = cache.get("bad-image").await.unwrap_err();
        assert!(err.to_string().contains("bad-image"));
        assert!(cache.is_empty());
        let _ = cache.get("bad-image").await;
        assert_eq!(loader.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn late_waiter_leaves_a_newer_decode_in_flight() {
        let (cache, loader) = cache(2);
        let mut late = Box::pin(cache.get("bad-image"));
        assert!(futures::poll!(&mut late).is_pending());
        assert!(cache.get("bad-image").await.is_err());

        // Retry starts a second decode before the first waiter wakes up
        let mut retry = Box::pin(cache.get("bad-image"));
        assert!(futures::poll!(&mut retry).is_pending());
        assert!(late.await.is_err());

        let (a, b) = tokio::join!(retry, cache.get("bad-image"));
        assert!(a.is_err() && b.is_err());
        assert_eq!(loader.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn asset_loader_reports_missing_files_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let loader = AssetImageLoader::new(AssetRegistry::new(dir.path()));
        let err = loader.load("bg-13").await.unwrap_err();
        assert!(matches!(
            err,
            EditorError::ImageDecodeFailure { ref reference, .. } if reference == "bg-13"
        ));
    }

    #[tokio::test]
    async fn asset_loader_decodes_registered_files() {
        let dir = tempfile::tempdir().unwrap();
        let registry = AssetRegistry::new(dir.path());
        let path = std::path::PathBuf::from(registry.resolve("mac-7").unwrap());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        image::RgbaImage::from_pixel(3, 3, image::Rgba([1, 2, 3, 255]))
            .save(&path)
            .unwrap();

        let image = AssetImageLoader::new(registry).load("mac-7").await.unwrap();
        assert_eq!((image.width(), image.height()), (3, 3));
    }
}
