//! Compositing primitives and the fixed layer order
//!
//! This module contains:
//! - Surface conversions between `image` buffers and tiny-skia pixmaps
//! - One primitive per visual layer (background, effects, subject, annotations)
//! - Shared geometry used by both export and interactive overlays
//!
//! [`compose_base`] and [`compose_document`] are the only places the layers
//! are stacked, so the order cannot drift between preview and export.

pub mod annotations;
pub mod background;
pub mod effects;
pub mod geometry;
pub mod subject;
pub mod surface;
pub mod text;

use rand::RngCore;
use tiny_skia::Pixmap;

use crate::domain::{Annotation, EditorSettings, Size};
use crate::error::Result;

/// Background fill, then blur, then noise, then the shadowed subject.
///
/// `background_image` is the decoded raster for image/gradient backgrounds;
/// `None` selects the documented fallback fill.
pub fn compose_base(
    subject: &Pixmap,
    settings: &EditorSettings,
    background_image: Option<&Pixmap>,
    rng: &mut dyn RngCore,
) -> Result<Pixmap> {
    let size = Size::framed(surface::size_of(subject), settings.padding);
    let mut canvas = surface::new_pixmap(size)?;

    background::paint_background(&mut canvas, &settings.background(), background_image);

    let (blur, noise) = (settings.blur_amount, settings.noise_amount);
    if blur > 0 || noise > 0 {
        let mut img = surface::pixmap_to_rgba(&canvas);
        if blur > 0 {
            img = effects::apply_blur(&img, blur)?;
        }
        effects::apply_noise(&mut img, noise, rng);
        canvas = surface::rgba_to_pixmap(&img)?;
    }

    subject::draw_subject(
        &mut canvas,
        subject,
        settings.padding,
        settings.border_radius as f32,
        &settings.shadow,
    )?;
    log::debug!(
        "Composited {}x{} base (blur {}, noise {})",
        size.width,
        size.height,
        blur,
        noise
    );
    Ok(canvas)
}

/// Full document: [`compose_base`] with the annotations drawn on top in order
pub fn compose_document(
    subject: &Pixmap,
    settings: &EditorSettings,
    background_image: Option<&Pixmap>,
    annotations: &[Annotation],
    fonts: &text::FontBook,
    rng: &mut dyn RngCore,
) -> Result<Pixmap> {
    let mut canvas = compose_base(subject, settings, background_image, rng)?;
    annotations::draw_annotations(&mut canvas, annotations, fonts)?;
    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        AnnotationId, BackgroundType, Border, Shape, Swatch,
    };
    use crate::error::EditorError;
    use crate::render::surface::pixel_at;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tiny_skia::Color;

    fn subject(w: u32, h: u32) -> Pixmap {
        let mut p = Pixmap::new(w, h).unwrap();
        p.fill(Color::from_rgba8(30, 90, 200, 255));
        p
    }

    fn white_settings() -> EditorSettings {
        EditorSettings {
            background_type: BackgroundType::White,
            noise_amount: 0,
            padding: 100,
            border_radius: 18,
            ..Default::default()
        }
    }

    #[test]
    fn framed_white_document_has_clean_padding_and_exact_subject() {
        let mut rng = StdRng::seed_from_u64(1);
        let out = compose_base(&subject(800, 600), &white_settings(), None, &mut rng).unwrap();
        assert_eq!((out.width(), out.height()), (1000, 800));
        assert_eq!(pixel_at(&out, 500, 15), Some([255, 255, 255, 255]));
        assert_eq!(pixel_at(&out, 500, 400), Some([30, 90, 200, 255]));
    }

    #[test]
    fn noise_and_blur_at_zero_match_plain_background() {
        let mut rng = StdRng::seed_from_u64(5);
        let settings = EditorSettings {
            background_type: BackgroundType::Transparent,
            blur_amount: 0,
            ..white_settings()
        };
        let a = compose_base(&subject(40, 30), &settings, None, &mut rng).unwrap();
        let b = compose_base(&subject(40, 30), &settings, None, &mut rng).unwrap();
        assert_eq!(a.data(), b.data());
    }

    #[test]
    fn noise_only_touches_background() {
        let mut rng = StdRng::seed_from_u64(9);
        let settings = EditorSettings {
            noise_amount: 60,
            padding: 20,
            border_radius: 0,
            ..white_settings()
        };
        let out = compose_base(&subject(40, 30), &settings, None, &mut rng).unwrap();
        assert_eq!(pixel_at(&out, 40, 35), Some([30, 90, 200, 255]));
        let noisy = (0..20).any(|x| pixel_at(&out, x, 2) != Some([255, 255, 255, 255]));
        assert!(noisy);
    }

    #[test]
    fn unclamped_huge_blur_fails_the_render() {
        let mut rng = StdRng::seed_from_u64(4);
        let settings = EditorSettings {
            blur_amount: 1_500_000_000,
            ..white_settings()
        };
        let result = compose_base(&subject(40, 30), &settings, None, &mut rng);
        assert!(matches!(result, Err(EditorError::CanvasContextUnavailable(_))));
    }

    #[test]
    fn annotations_draw_over_the_subject() {
        let mut rng = StdRng::seed_from_u64(2);
        let rect = Annotation::new(
            AnnotationId(1),
            Shape::Rectangle {
                x: 110.0,
                y: 110.0,
                width: 100.0,
                height: 50.0,
            },
            Swatch::default(),
            Border::default(),
        );
        let out = compose_document(
            &subject(800, 600),
            &white_settings(),
            None,
            &[rect],
            &text::FontBook::default(),
            &mut rng,
        )
        .unwrap();
        let edge = pixel_at(&out, 160, 110).unwrap();
        assert!(edge[0] > 200 && edge[2] < 60, "got {edge:?}");
    }
}
