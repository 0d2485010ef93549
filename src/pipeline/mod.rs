//! Render pipeline: debounced preview, high-fidelity export, decode cache
//!
//! This module consolidates:
//! - The bounded decoded-image cache shared by both paths (cache.rs)
//! - Generation-guarded debounced preview rendering (preview.rs)
//! - Full-resolution export, PNG encoding and the export sinks (export.rs)

pub mod cache;
pub mod export;
pub mod preview;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::capture::SubjectImage;
use crate::domain::{BackgroundSpec, Snapshot};
use crate::error::{EditorError, Result};
use crate::render::text::SharedFonts;

pub use cache::{AssetImageLoader, DecodedImage, ImageCache, ImageLoader};
pub use export::{ClipboardWriter, Export, FileSaver, ImageSaver, NoClipboard};
pub use preview::{PreviewHandle, PreviewRenderer};

/// Decoded background raster, or the failure that forces a fallback fill
#[derive(Debug, Default)]
pub struct ResolvedBackground {
    pub image: Option<DecodedImage>,
    pub notice: Option<EditorError>,
}

/// Decode the raster a background needs, recovering from decode failures.
///
/// Image backgrounds that fail report a notice and paint white. Gradients fall
/// back to their colour pair quietly.
pub async fn resolve_background(cache: &ImageCache, spec: &BackgroundSpec) -> ResolvedBackground {
    let Some(reference) = spec.image_ref() else {
        return ResolvedBackground::default();
    };
    match cache.get(reference).await {
        Ok(image) => ResolvedBackground {
            image: Some(image),
            notice: None,
        },
        Err(e) if matches!(spec, BackgroundSpec::Gradient { .. }) => {
            log::debug!("Gradient image unavailable, drawing colour fallback: {}", e);
            ResolvedBackground::default()
        }
        Err(e) => ResolvedBackground {
            image: None,
            notice: Some(e),
        },
    }
}

/// Owns the subject, the shared cache and fonts for one editor session
pub struct RenderPipeline {
    subject: SubjectImage,
    cache: Arc<ImageCache>,
    fonts: SharedFonts,
    preview: Arc<PreviewRenderer>,
}

impl RenderPipeline {
    pub fn new(
        subject: SubjectImage,
        cache: Arc<ImageCache>,
        fonts: SharedFonts,
        debounce: Duration,
    ) -> Self {
        let preview = Arc::new(PreviewRenderer::new(subject.clone(), cache.clone(), debounce));
        Self {
            subject,
            cache,
            fonts,
            preview,
        }
    }

    pub fn subject(&self) -> &SubjectImage {
        &self.subject
    }

    pub fn cache(&self) -> &Arc<ImageCache> {
        &self.cache
    }

    pub fn fonts(&self) -> &SharedFonts {
        &self.fonts
    }

    pub fn preview(&self) -> &Arc<PreviewRenderer> {
        &self.preview
    }

    /// Full-resolution render of the given document state
    pub async fn export(&self, snapshot: &Snapshot) -> Result<Export> {
        export::render_export(&self.subject, snapshot, &self.cache, self.fonts.clone()).await
    }

    pub async fn export_png(&self, snapshot: &Snapshot) -> Result<Vec<u8>> {
        let export = self.export(snapshot).await?;
        if let Some(notice) = &export.notice {
            log::warn!("Exporting with fallback background: {}", notice);
        }
        export::encode_png_blocking(export.pixmap).await
    }

    pub async fn save(&self, snapshot: &Snapshot, saver: &dyn ImageSaver) -> Result<PathBuf> {
        let png = self.export_png(snapshot).await?;
        saver.save(png).await.inspect_err(|e| log::error!("Save failed: {}", e))
    }

    pub async fn copy(&self, snapshot: &Snapshot, clipboard: &dyn ClipboardWriter) -> Result<()> {
        let png = self.export_png(snapshot).await?;
        clipboard
            .copy_png(png)
            .await
            .inspect_err(|e| log::error!("Copy failed: {}", e))?;
        log::info!("Copied screenshot to clipboard");
        Ok(())
    }

    /// Release preview resources; in-flight renders are discarded
    pub fn shutdown(&self) {
        self.preview.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BackgroundType, EditorSettings, Rgba8};
    use crate::render::text::FontBook;
    use async_trait::async_trait;
    use image::{Rgba, RgbaImage};
    use std::sync::Mutex;

    struct NeverLoads;

    #[async_trait]
    impl ImageLoader for NeverLoads {
        async fn load(&self, reference: &str) -> Result<DecodedImage> {
            Err(EditorError::decode(reference, "offline"))
        }
    }

    #[derive(Default)]
    struct RecordingClipboard(Mutex<Vec<Vec<u8>>>);

    #[async_trait]
    impl ClipboardWriter for RecordingClipboard {
        async fn copy_png(&self, png: Vec<u8>) -> Result<()> {
            self.0.lock().unwrap().push(png);
            Ok(())
        }
    }

    fn pipeline() -> RenderPipeline {
        let subject =
            SubjectImage::from_rgba(RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 255]))).unwrap();
        RenderPipeline::new(
            subject,
            Arc::new(ImageCache::new(2, Arc::new(NeverLoads))),
            Arc::new(FontBook::default()),
            Duration::from_millis(50),
        )
    }

    #[tokio::test]
    async fn gradient_failures_are_silent() {
        let cache = ImageCache::new(2, Arc::new(NeverLoads));
        let settings = EditorSettings {
            background_type: BackgroundType::Gradient,
            ..Default::default()
        };
        let resolved = resolve_background(&cache, &settings.background()).await;
        assert!(resolved.image.is_none());
        assert!(resolved.notice.is_none());

        let resolved = resolve_background(&cache, &EditorSettings::default().background()).await;
        assert!(resolved.notice.is_some());
    }

    #[tokio::test]
    async fn copy_hands_png_bytes_to_the_clipboard() {
        let pipeline = pipeline();
        let snapshot = Snapshot {
            settings: EditorSettings {
                background_type: BackgroundType::Custom,
                custom_color: "#112233".to_string(),
                padding: 4,
                noise_amount: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        let clipboard = RecordingClipboard::default();
        pipeline.copy(&snapshot, &clipboard).await.unwrap();

        let copied = clipboard.0.lock().unwrap();
        let decoded = image::load_from_memory(&copied[0]).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (16, 16));
        let expected = Rgba8::from_hex("#112233").unwrap().to_rgba_u8();
        assert_eq!(decoded.get_pixel(0, 0).0, expected);
    }
}
