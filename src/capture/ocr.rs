//! OCR (Optical Character Recognition) adapter using rusty-tesseract
//!
//! The editor hands a rendered region to a [`TextRecognizer`] and gets plain
//! text back; everything else about recognition stays behind the trait.

use std::collections::HashMap;

use async_trait::async_trait;
use image::{DynamicImage, RgbaImage, imageops};

use crate::domain::Bounds;
use crate::error::{EditorError, Result};

/// Opaque image-to-text service
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn recognize(&self, region: RgbaImage) -> Result<String>;
}

/// Upscale factor applied before recognition; tesseract wants text 10-12 px tall
pub fn upscale_factor(img: &RgbaImage) -> u32 {
    let min_dimension = img.width().min(img.height());
    if min_dimension < 100 {
        4
    } else if min_dimension < 200 {
        2
    } else {
        1
    }
}

/// Crop a region of a rendered surface for recognition, clamped to the image
pub fn crop_region(img: &RgbaImage, region: Bounds) -> Option<RgbaImage> {
    let left = region.left.max(0.0).floor() as u32;
    let top = region.top.max(0.0).floor() as u32;
    let right = (region.right.ceil().max(0.0) as u32).min(img.width());
    let bottom = (region.bottom.ceil().max(0.0) as u32).min(img.height());
    if right <= left || bottom <= top {
        return None;
    }
    Some(imageops::crop_imm(img, left, top, right - left, bottom - top).to_image())
}

/// Recognizer backed by the system tesseract binary
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    pub lang: String,
}

impl Default for TesseractRecognizer {
    fn default() -> Self {
        Self {
            lang: "eng".to_string(),
        }
    }
}

impl TesseractRecognizer {
    fn run(&self, img: RgbaImage) -> Result<String> {
        use rusty_tesseract::{Args, Image};

        log::info!(
            "Running OCR with rusty-tesseract on {}x{} image...",
            img.width(),
            img.height()
        );
        let factor = upscale_factor(&img);
        let dynamic = DynamicImage::ImageRgba8(img);
        let processed = if factor > 1 {
            let (w, h) = (dynamic.width() * factor, dynamic.height() * factor);
            log::info!("Upscaling small image {}x to {}x{}", factor, w, h);
            dynamic.resize(w, h, imageops::FilterType::Lanczos3)
        } else {
            dynamic
        };

        let tess_img = Image::from_dynamic_image(&processed)
            .map_err(|e| EditorError::OcrFailure(format!("Failed to create tesseract image: {e}")))?;
        let args = Args {
            lang: self.lang.clone(),
            config_variables: HashMap::new(),
            dpi: Some(if factor > 1 { 300 } else { 150 }),
            psm: Some(11),
            oem: Some(3),
        };
        let text = rusty_tesseract::image_to_string(&tess_img, &args)
            .map_err(|e| EditorError::OcrFailure(format!("Tesseract OCR failed: {e}")))?;
        Ok(text.trim().to_string())
    }
}

#[async_trait]
impl TextRecognizer for TesseractRecognizer {
    async fn recognize(&self, region: RgbaImage) -> Result<String> {
        let this = self.clone();
        tokio::task::spawn_blocking(move || this.run(region))
            .await
            .map_err(|e| EditorError::OcrFailure(e.to_string()))?
    }
}
