//! Subject image loaded from a capture reference

use std::path::PathBuf;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::RgbaImage;
use tiny_skia::Pixmap;

use crate::domain::Size;
use crate::error::{EditorError, Result};
use crate::render::surface::rgba_to_pixmap;

/// Where the bytes behind a reference string live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    File(PathBuf),
    /// Decoded payload of a `data:` URL
    Inline(Vec<u8>),
}

pub fn is_data_url(reference: &str) -> bool {
    reference.starts_with("data:")
}

/// Classify a reference: `data:` URL, `file://` URL or plain filesystem path
pub fn parse_reference(reference: &str) -> Result<ImageSource> {
    if is_data_url(reference) {
        let (header, payload) = reference
            .split_once(',')
            .ok_or_else(|| EditorError::decode(short(reference), "data URL has no payload"))?;
        if !header.ends_with(";base64") {
            return Err(EditorError::decode(
                short(reference),
                "only base64 data URLs are supported",
            ));
        }
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| EditorError::decode(short(reference), e))?;
        return Ok(ImageSource::Inline(bytes));
    }
    if let Some(path) = reference.strip_prefix("file://") {
        return Ok(ImageSource::File(PathBuf::from(path.replace("%20", " "))));
    }
    Ok(ImageSource::File(PathBuf::from(reference)))
}

/// Truncate long references (data URLs) for diagnostics
pub fn short(reference: &str) -> String {
    const LIMIT: usize = 64;
    match reference.char_indices().nth(LIMIT) {
        Some((idx, _)) => format!("{}...", &reference[..idx]),
        None => reference.to_string(),
    }
}

/// Read and decode a reference into straight-alpha RGBA
pub fn decode_reference(reference: &str) -> Result<RgbaImage> {
    let bytes = match parse_reference(reference)? {
        ImageSource::Inline(bytes) => bytes,
        ImageSource::File(path) => std::fs::read(&path)
            .map_err(|e| EditorError::decode(short(reference), e))?,
    };
    let decoded = image::load_from_memory(&bytes)
        .map_err(|e| EditorError::decode(short(reference), e))?;
    Ok(decoded.to_rgba8())
}

/// The captured screenshot; immutable once loaded
#[derive(Clone, Debug)]
pub struct SubjectImage {
    rgba: Arc<RgbaImage>,
    pixmap: Arc<Pixmap>,
}

impl SubjectImage {
    pub fn from_rgba(rgba: RgbaImage) -> Result<Self> {
        let pixmap = rgba_to_pixmap(&rgba)?;
        log::debug!("Subject image: {}x{} pixels", rgba.width(), rgba.height());
        Ok(Self {
            rgba: Arc::new(rgba),
            pixmap: Arc::new(pixmap),
        })
    }

    /// Load the subject from a path, `file://` URL or data URL, off the async runtime
    pub async fn load(reference: &str) -> Result<Self> {
        let owned = reference.to_string();
        let rgba = tokio::task::spawn_blocking(move || decode_reference(&owned))
            .await
            .map_err(|e| EditorError::decode(short(reference), e))??;
        Self::from_rgba(rgba)
    }

    pub fn rgba(&self) -> &RgbaImage {
        &self.rgba
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Shared handle to the premultiplied raster, for off-thread compositing
    pub fn shared_pixmap(&self) -> Arc<Pixmap> {
        self.pixmap.clone()
    }

    pub fn width(&self) -> u32 {
        self.rgba.width()
    }

    pub fn height(&self) -> u32 {
        self.rgba.height()
    }

    pub fn size(&self) -> Size {
        Size::new(self.width(), self.height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(img: &RgbaImage) -> Vec<u8> {
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn classifies_references() {
        assert_eq!(
            parse_reference("/tmp/shot.png").unwrap(),
            ImageSource::File(PathBuf::from("/tmp/shot.png"))
        );
        assert_eq!(
            parse_reference("file:///tmp/my%20shot.png").unwrap(),
            ImageSource::File(PathBuf::from("/tmp/my shot.png"))
        );
        assert_eq!(
            parse_reference("data:image/png;base64,AAEC").unwrap(),
            ImageSource::Inline(vec![0, 1, 2])
        );
    }

    #[test]
    fn rejects_non_base64_data_urls() {
        let err = parse_reference("data:text/plain,hello").unwrap_err();
        assert!(matches!(err, EditorError::ImageDecodeFailure { .. }));
    }

    #[test]
    fn decodes_data_url_png() {
        let img = RgbaImage::from_pixel(3, 2, image::Rgba([1, 2, 3, 255]));
        let url = format!("data:image/png;base64,{}", STANDARD.encode(png_bytes(&img)));
        assert_eq!(decode_reference(&url).unwrap(), img);
    }

    #[test]
    fn missing_file_names_reference() {
        let err = decode_reference("/definitely/not/here.png").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.png"));
    }

    #[test]
    fn short_truncates_long_references() {
        let long = "x".repeat(200);
        assert_eq!(short(&long).len(), 67);
        assert_eq!(short("bg-18"), "bg-18");
    }

    #[tokio::test]
    async fn loads_subject_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot.png");
        let img = RgbaImage::from_pixel(8, 6, image::Rgba([9, 8, 7, 255]));
        std::fs::write(&path, png_bytes(&img)).unwrap();

        let subject = SubjectImage::load(path.to_str().unwrap()).await.unwrap();
        assert_eq!(subject.size(), Size::new(8, 6));
        assert_eq!(subject.rgba(), &img);
    }
}
