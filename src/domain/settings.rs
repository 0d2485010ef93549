//! Document settings and the snapshot unit of undo/redo

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::annotation::Annotation;
use super::color::Rgba8;

pub const CHECKER_SIZE: u32 = 10;
pub const CHECKER_LIGHT: Rgba8 = Rgba8::opaque(0xff, 0xff, 0xff);
pub const CHECKER_DARK: Rgba8 = Rgba8::opaque(0xe0, 0xe0, 0xe0);
pub const GRAY: Rgba8 = Rgba8::opaque(0xf5, 0xf5, 0xf5);

/// Background kind chosen in the background selector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundType {
    Transparent,
    White,
    Black,
    Gray,
    Custom,
    Gradient,
    #[default]
    Image,
}

/// A gradient preset: image reference plus the colour pair drawn when the image is unavailable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradientChoice {
    pub id: String,
    pub image: String,
    pub colors: (String, String),
}

impl Default for GradientChoice {
    fn default() -> Self {
        Self {
            id: "gradient-1".to_string(),
            image: "gradient-1".to_string(),
            colors: ("#667eea".to_string(), "#764ba2".to_string()),
        }
    }
}

/// Resolved background to paint, derived from [`EditorSettings`]
#[derive(Debug, Clone, PartialEq)]
pub enum BackgroundSpec {
    Transparent,
    White,
    Black,
    Gray,
    Custom(Rgba8),
    Gradient {
        id: String,
        image: String,
        fallback: (Rgba8, Rgba8),
    },
    Image(String),
}

impl BackgroundSpec {
    /// Image reference that must be decoded before painting, if any
    pub fn image_ref(&self) -> Option<&str> {
        match self {
            BackgroundSpec::Gradient { image, .. } | BackgroundSpec::Image(image) => {
                Some(image.as_str())
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadowSettings {
    pub blur: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    /// 0-100
    pub opacity: f32,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            blur: 20.0,
            offset_x: 0.0,
            offset_y: 10.0,
            opacity: 30.0,
        }
    }
}

impl ShadowSettings {
    pub fn is_visible(&self) -> bool {
        self.opacity > 0.0
    }
}

/// Background and effect settings; one history unit together with the annotations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    pub background_type: BackgroundType,
    pub custom_color: String,
    pub selected_image: Option<String>,
    pub gradient: GradientChoice,
    /// Background blur, 0-100 px
    pub blur_amount: u32,
    /// 0-100
    pub noise_amount: u32,
    /// 0-200 px
    pub padding: u32,
    /// 0-50 px
    pub border_radius: u32,
    pub shadow: ShadowSettings,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            background_type: BackgroundType::Image,
            custom_color: "#667eea".to_string(),
            selected_image: Some(DEFAULT_BACKGROUND_ID.to_string()),
            gradient: GradientChoice::default(),
            blur_amount: 0,
            noise_amount: 20,
            padding: 100,
            border_radius: 18,
            shadow: ShadowSettings::default(),
        }
    }
}

/// Asset id of the bundled default background image
pub const DEFAULT_BACKGROUND_ID: &str = "bg-18";

pub const MAX_BLUR: u32 = 100;
pub const MAX_NOISE: u32 = 100;
pub const MAX_PADDING: u32 = 200;
pub const MAX_BORDER_RADIUS: u32 = 50;

impl EditorSettings {
    /// Background to paint for the current settings
    pub fn background(&self) -> BackgroundSpec {
        match self.background_type {
            BackgroundType::Transparent => BackgroundSpec::Transparent,
            BackgroundType::White => BackgroundSpec::White,
            BackgroundType::Black => BackgroundSpec::Black,
            BackgroundType::Gray => BackgroundSpec::Gray,
            BackgroundType::Custom => BackgroundSpec::Custom(
                Rgba8::from_hex(&self.custom_color).unwrap_or(Rgba8::WHITE),
            ),
            BackgroundType::Gradient => {
                let (a, b) = &self.gradient.colors;
                BackgroundSpec::Gradient {
                    id: self.gradient.id.clone(),
                    image: self.gradient.image.clone(),
                    fallback: (
                        Rgba8::from_hex(a).unwrap_or(Rgba8::WHITE),
                        Rgba8::from_hex(b).unwrap_or(Rgba8::WHITE),
                    ),
                }
            }
            BackgroundType::Image => match &self.selected_image {
                Some(image) => BackgroundSpec::Image(image.clone()),
                None => BackgroundSpec::White,
            },
        }
    }

    /// Clamp slider-driven values into their documented ranges
    pub fn clamped(mut self) -> Self {
        self.blur_amount = self.blur_amount.min(MAX_BLUR);
        self.noise_amount = self.noise_amount.min(MAX_NOISE);
        self.padding = self.padding.min(MAX_PADDING);
        self.border_radius = self.border_radius.min(MAX_BORDER_RADIUS);
        self.shadow.blur = self.shadow.blur.max(0.0);
        self.shadow.opacity = self.shadow.opacity.clamp(0.0, 100.0);
        self
    }
}

/// Whole-document state: the unit stored in undo/redo history.
///
/// Annotations sit behind an `Arc` so snapshots that only differ in settings
/// share the annotation list; mutation goes through [`Snapshot::annotations_mut`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub settings: EditorSettings,
    pub annotations: Arc<Vec<Annotation>>,
}

impl Snapshot {
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn annotations_mut(&mut self) -> &mut Vec<Annotation> {
        Arc::make_mut(&mut self.annotations)
    }

    pub fn find(&self, id: super::AnnotationId) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }
}
