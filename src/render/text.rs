//! Glyph rasterization for text and number annotations

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ab_glyph::{Font, FontArc, GlyphId, ScaleFont, point};
use tiny_skia::{Color, Mask, Paint, Pixmap, Rect, Transform};

/// Fonts tried when no font paths are configured
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

const SYSTEM_BOLD_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

#[derive(Clone)]
struct NamedFont {
    name: String,
    font: FontArc,
}

/// Loaded fonts, looked up by family name with a first-loaded fallback
#[derive(Clone, Default)]
pub struct FontBook {
    regular: Vec<NamedFont>,
    bold: Vec<NamedFont>,
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook")
            .field("regular", &self.regular.iter().map(|f| &f.name).collect::<Vec<_>>())
            .field("bold", &self.bold.iter().map(|f| &f.name).collect::<Vec<_>>())
            .finish()
    }
}

fn load_font(path: &Path) -> Option<NamedFont> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::debug!("Font {} not readable: {}", path.display(), e);
            return None;
        }
    };
    match FontArc::try_from_vec(bytes) {
        Ok(font) => Some(NamedFont {
            name: path
                .file_stem()
                .map(|s| s.to_string_lossy().to_lowercase())
                .unwrap_or_default(),
            font,
        }),
        Err(e) => {
            log::warn!("Ignoring invalid font {}: {}", path.display(), e);
            None
        }
    }
}

fn looks_bold(name: &str) -> bool {
    name.contains("bold") || name.ends_with("bd")
}

impl FontBook {
    /// Load the given font files; bold faces are detected from the file name
    pub fn load(paths: &[PathBuf]) -> Self {
        let mut book = FontBook::default();
        for font in paths.iter().filter_map(|p| load_font(p)) {
            if looks_bold(&font.name) {
                book.bold.push(font);
            } else {
                book.regular.push(font);
            }
        }
        book
    }

    /// Configured fonts, or well-known system fonts when none are configured
    pub fn with_system_fallback(paths: &[PathBuf]) -> Self {
        let mut book = Self::load(paths);
        if book.regular.is_empty() {
            book.regular = SYSTEM_FONTS
                .iter()
                .filter_map(|p| load_font(Path::new(p)))
                .take(1)
                .collect();
        }
        if book.bold.is_empty() {
            book.bold = SYSTEM_BOLD_FONTS
                .iter()
                .filter_map(|p| load_font(Path::new(p)))
                .take(1)
                .collect();
        }
        if book.is_empty() {
            log::warn!("No fonts available, text annotations will not be drawn");
        }
        book
    }

    pub fn is_empty(&self) -> bool {
        self.regular.is_empty() && self.bold.is_empty()
    }

    /// Font for a CSS-like family name; any loaded font stands in for an unknown family
    pub fn font(&self, family: &str, bold: bool) -> Option<&FontArc> {
        let family = family.to_lowercase().replace(' ', "");
        let (preferred, other) = if bold {
            (&self.bold, &self.regular)
        } else {
            (&self.regular, &self.bold)
        };
        preferred
            .iter()
            .find(|f| f.name.replace(['-', '_', ' '], "").contains(&family))
            .or_else(|| preferred.first())
            .or_else(|| other.first())
            .map(|f| &f.font)
    }
}

/// Where the anchor point sits relative to the laid-out text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    /// Anchor is the left end of the baseline
    Baseline,
    /// Anchor is the centre of the text box
    Center,
}

/// Rasterize a single line of text in `color` onto the surface
pub fn draw_text(
    pixmap: &mut Pixmap,
    font: &FontArc,
    text: &str,
    anchor: (f32, f32),
    size: f32,
    color: Color,
    placement: TextAnchor,
) {
    if text.is_empty() || size <= 0.0 {
        return;
    }
    let scaled = font.as_scaled(size);

    let mut advances: Vec<(GlyphId, f32)> = Vec::with_capacity(text.len());
    let mut cursor = 0.0f32;
    let mut prev: Option<GlyphId> = None;
    for ch in text.chars() {
        let gid = font.glyph_id(ch);
        if let Some(prev) = prev {
            cursor += scaled.kern(prev, gid);
        }
        advances.push((gid, cursor));
        cursor += scaled.h_advance(gid);
        prev = Some(gid);
    }

    let (origin_x, baseline) = match placement {
        TextAnchor::Baseline => anchor,
        TextAnchor::Center => (
            anchor.0 - cursor / 2.0,
            anchor.1 + (scaled.ascent() + scaled.descent()) / 2.0,
        ),
    };

    let Some(mut mask) = Mask::new(pixmap.width(), pixmap.height()) else {
        return;
    };
    let (mask_w, mask_h) = (pixmap.width() as i64, pixmap.height() as i64);
    let data = mask.data_mut();
    let mut touched = false;

    for (gid, offset) in advances {
        let glyph = gid.with_scale_and_position(size, point(origin_x + offset, baseline));
        let Some(outlined) = font.outline_glyph(glyph) else {
            continue;
        };
        let bounds = outlined.px_bounds();
        outlined.draw(|px, py, coverage| {
            let x = bounds.min.x as i64 + px as i64;
            let y = bounds.min.y as i64 + py as i64;
            if x < 0 || y < 0 || x >= mask_w || y >= mask_h {
                return;
            }
            let idx = (y * mask_w + x) as usize;
            let value = (coverage.clamp(0.0, 1.0) * 255.0).round() as u8;
            data[idx] = data[idx].max(value);
            touched = true;
        });
    }

    if !touched {
        return;
    }
    let mut paint = Paint::default();
    paint.set_color(color);
    if let Some(full) = Rect::from_xywh(0.0, 0.0, pixmap.width() as f32, pixmap.height() as f32) {
        pixmap.fill_rect(full, &paint, Transform::identity(), Some(&mask));
    }
}

/// Shared handle so preview and export render with the same fonts
pub type SharedFonts = Arc<FontBook>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_font_files_are_skipped() {
        let book = FontBook::load(&[PathBuf::from("/nonexistent/font.ttf")]);
        assert!(book.is_empty());
        assert!(book.font("Arial", false).is_none());
    }

    #[test]
    fn invalid_font_data_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Broken-Bold.ttf");
        std::fs::write(&path, b"not a font").unwrap();
        assert!(FontBook::load(&[path]).is_empty());
    }

    #[test]
    fn bold_detection_uses_file_name() {
        assert!(looks_bold("dejavusans-bold"));
        assert!(looks_bold("arialbd"));
        assert!(!looks_bold("dejavusans"));
    }

    #[test]
    fn draws_with_any_available_system_font() {
        let book = FontBook::with_system_fallback(&[]);
        let Some(font) = book.font("Arial", true) else {
            // nothing to rasterize with on this machine
            return;
        };
        let mut pixmap = Pixmap::new(80, 80).unwrap();
        draw_text(
            &mut pixmap,
            font,
            "1",
            (40.0, 40.0),
            38.4,
            Color::WHITE,
            TextAnchor::Center,
        );
        assert!(pixmap.pixels().iter().any(|p| p.alpha() > 0));
    }
}
