//! Color specifications used by backgrounds and annotations

use serde::{Deserialize, Serialize};

/// Straight-alpha RGBA color, 0-255 per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const WHITE: Rgba8 = Rgba8::opaque(0xff, 0xff, 0xff);
    pub const BLACK: Rgba8 = Rgba8::opaque(0, 0, 0);

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse `#rrggbb` or `#rgb` (leading `#` optional)
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.trim().trim_start_matches('#');
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match digits.len() {
            6 => Some(Self::opaque(
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
            )),
            3 => {
                let expand = |c: &str| channel(c).map(|v| v * 17);
                Some(Self::opaque(
                    expand(&digits[0..1])?,
                    expand(&digits[1..2])?,
                    expand(&digits[2..3])?,
                ))
            }
            _ => None,
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Convert to image crate RGBA format
    pub fn to_rgba_u8(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn to_skia(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }
}

/// A hex color with an opacity percentage (0-100)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Swatch {
    pub hex: String,
    pub opacity: f32,
}

impl Swatch {
    pub fn new(hex: impl Into<String>, opacity: f32) -> Self {
        Self {
            hex: hex.into(),
            opacity,
        }
    }

    /// Resolve hex + opacity to a drawable color; unparsable hex falls back to black
    pub fn resolve(&self) -> Rgba8 {
        let base = Rgba8::from_hex(&self.hex).unwrap_or(Rgba8::BLACK);
        let alpha = (self.opacity.clamp(0.0, 100.0) / 100.0 * 255.0).round() as u8;
        Rgba8 { a: alpha, ..base }
    }

    pub fn to_skia(&self) -> tiny_skia::Color {
        self.resolve().to_skia()
    }
}

impl Default for Swatch {
    fn default() -> Self {
        Self::new("#FF3300", 100.0)
    }
}

/// Stroke specification of an annotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Border {
    pub width: f32,
    pub color: Swatch,
}

impl Border {
    /// Width used when the configured width is zero
    pub const FALLBACK_WIDTH: f32 = 5.0;

    pub fn stroke_width(&self) -> f32 {
        if self.width > 0.0 {
            self.width
        } else {
            Self::FALLBACK_WIDTH
        }
    }
}

impl Default for Border {
    fn default() -> Self {
        Self {
            width: 5.0,
            color: Swatch::default(),
        }
    }
}
