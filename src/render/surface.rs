//! Conversions between `image` buffers and tiny-skia pixmaps
//!
//! Pixmaps hold premultiplied pixels, `RgbaImage` holds straight alpha. Every
//! crossing goes through these helpers so the two never get mixed up.

use image::RgbaImage;
use tiny_skia::{ColorU8, IntSize, Pixmap};

use crate::domain::Size;
use crate::error::{EditorError, Result};

/// Allocate a transparent drawing surface
pub fn new_pixmap(size: Size) -> Result<Pixmap> {
    Pixmap::new(size.width, size.height).ok_or_else(|| {
        EditorError::CanvasContextUnavailable(format!(
            "cannot allocate {}x{} surface",
            size.width, size.height
        ))
    })
}

pub fn size_of(pixmap: &Pixmap) -> Size {
    Size::new(pixmap.width(), pixmap.height())
}

/// Copy a straight-alpha image into a new premultiplied pixmap
pub fn rgba_to_pixmap(img: &RgbaImage) -> Result<Pixmap> {
    let size = IntSize::from_wh(img.width(), img.height()).ok_or_else(|| {
        EditorError::CanvasContextUnavailable("empty image has no surface".to_string())
    })?;
    let data: Vec<u8> = img
        .pixels()
        .flat_map(|p| {
            let c = ColorU8::from_rgba(p[0], p[1], p[2], p[3]).premultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();
    Pixmap::from_vec(data, size).ok_or_else(|| {
        EditorError::CanvasContextUnavailable("pixel buffer does not match size".to_string())
    })
}

/// Copy a premultiplied pixmap out to a straight-alpha image
pub fn pixmap_to_rgba(pixmap: &Pixmap) -> RgbaImage {
    let data: Vec<u8> = pixmap
        .pixels()
        .iter()
        .flat_map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();
    // Length always matches width * height * 4
    RgbaImage::from_raw(pixmap.width(), pixmap.height(), data)
        .unwrap_or_else(|| RgbaImage::new(pixmap.width(), pixmap.height()))
}

/// Run a pixel-level operation on the straight-alpha view of a pixmap and copy it back
pub fn with_rgba(pixmap: &mut Pixmap, f: impl FnOnce(&mut RgbaImage)) -> Result<()> {
    let mut img = pixmap_to_rgba(pixmap);
    f(&mut img);
    *pixmap = rgba_to_pixmap(&img)?;
    Ok(())
}

/// Straight-alpha RGBA of one pixel, for tests and diagnostics
pub fn pixel_at(pixmap: &Pixmap, x: u32, y: u32) -> Option<[u8; 4]> {
    let c = pixmap.pixel(x, y)?.demultiply();
    Some([c.red(), c.green(), c.blue(), c.alpha()])
}
