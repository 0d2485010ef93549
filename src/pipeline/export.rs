//! High-fidelity export and the save/clipboard sinks

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use image::RgbaImage;
use tiny_skia::Pixmap;

use super::cache::ImageCache;
use super::resolve_background;
use crate::capture::SubjectImage;
use crate::domain::Snapshot;
use crate::error::{EditorError, Result};
use crate::render::{self, surface, text::SharedFonts};

pub const FILE_NAME_FORMAT: &str = "Screenshot_%Y-%m-%d_%H-%M-%S.png";

/// A finished full-resolution document
#[derive(Debug)]
pub struct Export {
    pub pixmap: Pixmap,
    /// Background failure that was replaced by the white fallback
    pub notice: Option<EditorError>,
}

/// Composite `snapshot` over `subject` at full resolution, annotations included
pub async fn render_export(
    subject: &SubjectImage,
    snapshot: &Snapshot,
    cache: &ImageCache,
    fonts: SharedFonts,
) -> Result<Export> {
    let background = resolve_background(cache, &snapshot.settings.background()).await;
    let subject = subject.shared_pixmap();
    let settings = snapshot.settings.clone();
    let annotations = snapshot.annotations.clone();
    let image = background.image.clone();

    let pixmap = tokio::task::spawn_blocking(move || {
        let mut rng = rand::rng();
        render::compose_document(
            &subject,
            &settings,
            image.as_deref(),
            &annotations,
            &fonts,
            &mut rng,
        )
    })
    .await
    .map_err(|e| EditorError::CanvasContextUnavailable(e.to_string()))??;

    log::debug!(
        "Rendered export {}x{} with {} annotations",
        pixmap.width(),
        pixmap.height(),
        snapshot.annotations.len()
    );
    Ok(Export {
        pixmap,
        notice: background.notice,
    })
}

fn write_png<W: io::Write>(w: W, image: &RgbaImage) -> std::result::Result<(), png::EncodingError> {
    let mut encoder = png::Encoder::new(w, image.width(), image.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(image.as_raw())
}

/// Encode a rendered document as PNG bytes
pub fn encode_png(pixmap: &Pixmap) -> Result<Vec<u8>> {
    let image = surface::pixmap_to_rgba(pixmap);
    let mut buffer = Vec::new();
    write_png(&mut buffer, &image).map_err(|e| EditorError::ExportEncodeFailure(e.to_string()))?;
    Ok(buffer)
}

/// File name for an export made at `now`
pub fn export_file_name(now: chrono::DateTime<chrono::Local>) -> String {
    now.format(FILE_NAME_FORMAT).to_string()
}

/// Receives encoded exports destined for the filesystem
#[async_trait]
pub trait ImageSaver: Send + Sync {
    /// Persist `png` and return where it landed
    async fn save(&self, png: Vec<u8>) -> Result<PathBuf>;
}

/// Receives encoded exports destined for the system clipboard
#[async_trait]
pub trait ClipboardWriter: Send + Sync {
    async fn copy_png(&self, png: Vec<u8>) -> Result<()>;
}

#[derive(Debug, Clone)]
enum SaveTarget {
    /// Timestamped file inside the directory
    Directory(PathBuf),
    File(PathBuf),
}

/// Writes exports to disk through a temporary file, so a failed write leaves nothing behind
#[derive(Debug, Clone)]
pub struct FileSaver {
    target: SaveTarget,
}

impl FileSaver {
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            target: SaveTarget::Directory(dir.into()),
        }
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            target: SaveTarget::File(path.into()),
        }
    }

    fn destination(&self) -> PathBuf {
        match &self.target {
            SaveTarget::Directory(dir) => dir.join(export_file_name(chrono::Local::now())),
            SaveTarget::File(path) => path.clone(),
        }
    }
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)?;
    let mut file = tempfile::Builder::new()
        .prefix(".snapframe-")
        .suffix(".png")
        .tempfile_in(&dir)?;
    file.write_all(bytes)?;
    file.flush()?;
    file.persist(path).map_err(|e| EditorError::from(e.error))?;
    Ok(())
}

#[async_trait]
impl ImageSaver for FileSaver {
    async fn save(&self, png: Vec<u8>) -> Result<PathBuf> {
        let path = self.destination();
        let target = path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&target, &png))
            .await
            .map_err(|e| EditorError::Io(e.to_string()))??;
        log::info!("Saved screenshot to {}", path.display());
        Ok(path)
    }
}

/// Clipboard stand-in for environments without one
#[derive(Debug, Clone, Copy, Default)]
pub struct NoClipboard;

#[async_trait]
impl ClipboardWriter for NoClipboard {
    async fn copy_png(&self, _png: Vec<u8>) -> Result<()> {
        Err(EditorError::ClipboardUnavailable(
            "no clipboard service configured".to_string(),
        ))
    }
}

/// Encode on the blocking pool
pub async fn encode_png_blocking(pixmap: Pixmap) -> Result<Vec<u8>> {
    let pixmap = Arc::new(pixmap);
    tokio::task::spawn_blocking(move || encode_png(&pixmap))
        .await
        .map_err(|e| EditorError::ExportEncodeFailure(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Annotation, AnnotationId, BackgroundType, Border, EditorSettings, Shape, Swatch,
    };
    use crate::pipeline::cache::AssetImageLoader;
    use crate::render::surface::pixel_at;
    use crate::render::text::FontBook;
    use chrono::TimeZone;
    use image::Rgba;

    fn subject() -> SubjectImage {
        SubjectImage::from_rgba(RgbaImage::from_pixel(80, 60, Rgba([10, 200, 10, 255]))).unwrap()
    }

    fn cache(dir: &Path) -> ImageCache {
        ImageCache::new(
            4,
            Arc::new(AssetImageLoader::new(crate::assets::AssetRegistry::new(dir))),
        )
    }

    #[test]
    fn file_names_use_the_timestamp_pattern() {
        let at = chrono::Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(export_file_name(at), "Screenshot_2024-03-09_14-05-07.png");
    }

    #[test]
    fn png_encoding_round_trips_pixels() {
        let mut pixmap = Pixmap::new(3, 2).unwrap();
        pixmap.fill(tiny_skia::Color::from_rgba8(12, 34, 56, 255));
        let bytes = encode_png(&pixmap).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.get_pixel(2, 1), &Rgba([12, 34, 56, 255]));
    }

    #[tokio::test]
    async fn export_includes_annotations_and_falls_back_on_missing_background() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = Snapshot {
            settings: EditorSettings {
                background_type: BackgroundType::Image,
                selected_image: Some("bg-19".to_string()),
                noise_amount: 0,
                padding: 20,
                border_radius: 0,
                ..Default::default()
            },
            annotations: Arc::new(vec![Annotation::new(
                AnnotationId(1),
                Shape::Rectangle {
                    x: 30.0,
                    y: 30.0,
                    width: 40.0,
                    height: 30.0,
                },
                Swatch::default(),
                Border::default(),
            )]),
        };

        let export = render_export(
            &subject(),
            &snapshot,
            &cache(dir.path()),
            Arc::new(FontBook::default()),
        )
        .await
        .unwrap();

        assert_eq!((export.pixmap.width(), export.pixmap.height()), (120, 100));
        assert_eq!(pixel_at(&export.pixmap, 2, 2), Some([255, 255, 255, 255]));
        assert!(matches!(
            export.notice,
            Some(EditorError::ImageDecodeFailure { ref reference, .. }) if reference == "bg-19"
        ));
        let stroke = pixel_at(&export.pixmap, 50, 30).unwrap();
        assert!(stroke[0] > 200 && stroke[1] < 100, "got {stroke:?}");
    }

    #[tokio::test]
    async fn file_saver_writes_into_directory() {
        let dir = tempfile::tempdir().unwrap();
        let saver = FileSaver::in_dir(dir.path().join("shots"));
        let path = saver.save(vec![1, 2, 3]).await.unwrap();
        assert!(path.starts_with(dir.path().join("shots")));
        assert_eq!(std::fs::read(&path).unwrap(), vec![1, 2, 3]);
        let entries = std::fs::read_dir(dir.path().join("shots")).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[tokio::test]
    async fn missing_clipboard_is_reported() {
        let err = NoClipboard.copy_png(vec![]).await.unwrap_err();
        assert!(matches!(err, EditorError::ClipboardUnavailable(_)));
    }
}
