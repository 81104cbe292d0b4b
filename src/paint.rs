//! Paint attributes: colors, pattern paints, brush size presets and the
//! opacity arithmetic shared by the canvas and the opacity dialog.

use std::fmt;
use std::sync::Arc;

use image::{Rgba, RgbaImage};

/// Names of the built-in pattern paints, in palette order.
pub const PATTERN_NAMES: &[&str] = &[
    "pattern1", "pattern2", "pattern3", "pattern4", "pattern5", "pattern6",
];

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum PaintError {
    /// A `#`-prefixed value that is not `#RRGGBB` / `#AARRGGBB`.
    InvalidColor(String),
    /// A pattern name with no built-in tile.
    UnknownPattern(String),
}

impl fmt::Display for PaintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaintError::InvalidColor(s) => write!(f, "Invalid color: {}", s),
            PaintError::UnknownPattern(s) => write!(f, "Unknown pattern: {}", s),
        }
    }
}

impl std::error::Error for PaintError {}

// ============================================================================
// COLORS
// ============================================================================

/// Parse `#RRGGBB` or `#AARRGGBB` into RGBA.
pub fn parse_color(s: &str) -> Result<Rgba<u8>, PaintError> {
    let invalid = || PaintError::InvalidColor(s.to_string());
    let hex = s.strip_prefix('#').ok_or_else(invalid)?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
    match hex.len() {
        6 => Ok(Rgba([byte(0)?, byte(2)?, byte(4)?, 255])),
        8 => Ok(Rgba([byte(2)?, byte(4)?, byte(6)?, byte(0)?])),
        _ => Err(invalid()),
    }
}

/// Format as `#AARRGGBB`.
pub fn format_color(c: Rgba<u8>) -> String {
    format!("#{:02X}{:02X}{:02X}{:02X}", c[3], c[0], c[1], c[2])
}

// ============================================================================
// PAINT SOURCE
// ============================================================================

/// What a stroke is filled with.
#[derive(Clone, Debug, PartialEq)]
pub enum PaintSource {
    Solid(Rgba<u8>),
    /// Tile repeated across the canvas in canvas coordinates.
    Pattern(Arc<RgbaImage>),
}

impl PaintSource {
    /// Resolve a palette tag: `#…` is a color, anything else a pattern name.
    pub fn from_tag(tag: &str) -> Result<Self, PaintError> {
        if tag.starts_with('#') {
            Ok(PaintSource::Solid(parse_color(tag)?))
        } else {
            pattern_tile(tag)
                .map(|tile| PaintSource::Pattern(Arc::new(tile)))
                .ok_or_else(|| PaintError::UnknownPattern(tag.to_string()))
        }
    }

    /// Source color at canvas pixel (x, y).
    #[inline]
    pub fn sample(&self, x: u32, y: u32) -> Rgba<u8> {
        match self {
            PaintSource::Solid(c) => *c,
            PaintSource::Pattern(tile) => *tile.get_pixel(x % tile.width(), y % tile.height()),
        }
    }
}

/// Build one of the procedural pattern tiles.
pub fn pattern_tile(name: &str) -> Option<RgbaImage> {
    let ink = Rgba([40, 40, 120, 255]);
    let paper = Rgba([250, 230, 140, 255]);
    let pick = |on: bool| if on { ink } else { paper };
    let tile = match name {
        // Diagonal stripes
        "pattern1" => RgbaImage::from_fn(16, 16, |x, y| pick((x + y) % 8 < 3)),
        // Checker
        "pattern2" => RgbaImage::from_fn(16, 16, |x, y| pick((x / 8 + y / 8) % 2 == 0)),
        // Dots
        "pattern3" => RgbaImage::from_fn(12, 12, |x, y| {
            let dx = x as i32 - 6;
            let dy = y as i32 - 6;
            pick(dx * dx + dy * dy <= 9)
        }),
        // Horizontal stripes
        "pattern4" => RgbaImage::from_fn(16, 16, |_, y| pick(y % 8 < 4)),
        // Grid
        "pattern5" => RgbaImage::from_fn(16, 16, |x, y| pick(x % 8 == 0 || y % 8 == 0)),
        // Zigzag
        "pattern6" => RgbaImage::from_fn(24, 12, |x, y| {
            let phase = (x % 12) as i32;
            let crest = if phase < 6 { phase } else { 12 - phase };
            pick((y as i32 - crest - 3).abs() <= 1)
        }),
        _ => return None,
    };
    Some(tile)
}

// ============================================================================
// BRUSH SIZES
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BrushSize {
    Small,
    Medium,
    Large,
}

impl BrushSize {
    pub fn label(&self) -> &'static str {
        match self {
            BrushSize::Small => "Small",
            BrushSize::Medium => "Medium",
            BrushSize::Large => "Large",
        }
    }

    pub fn all() -> &'static [BrushSize] {
        &[BrushSize::Small, BrushSize::Medium, BrushSize::Large]
    }
}

/// Brush widths in dp for each preset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BrushPresets {
    pub small: f32,
    pub medium: f32,
    pub large: f32,
}

impl Default for BrushPresets {
    fn default() -> Self {
        Self {
            small: 10.0,
            medium: 20.0,
            large: 30.0,
        }
    }
}

impl BrushPresets {
    pub fn dp(&self, size: BrushSize) -> f32 {
        match size {
            BrushSize::Small => self.small,
            BrushSize::Medium => self.medium,
            BrushSize::Large => self.large,
        }
    }
}

// ============================================================================
// OPACITY
// ============================================================================

/// Opacity percent (0–100) to an 8-bit alpha, rounding to nearest.
pub fn percent_to_alpha(percent: u8) -> u8 {
    let p = percent.min(100) as f32;
    (p / 100.0 * 255.0).round() as u8
}

/// 8-bit alpha to opacity percent, rounding to nearest.
pub fn alpha_to_percent(alpha: u8) -> u8 {
    (alpha as f32 / 255.0 * 100.0).round() as u8
}

/// Paint captured when a stroke starts; later setter calls do not affect it.
#[derive(Clone, Debug, PartialEq)]
pub struct StrokePaint {
    pub source: PaintSource,
    /// Stroke width in canvas pixels
    pub width: f32,
    pub alpha: u8,
    pub erase: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rgb_and_argb() {
        assert_eq!(parse_color("#FF0000").unwrap(), Rgba([255, 0, 0, 255]));
        assert_eq!(parse_color("#FF660000").unwrap(), Rgba([0x66, 0, 0, 255]));
        assert_eq!(parse_color("#80ffcc00").unwrap(), Rgba([0xff, 0xcc, 0, 0x80]));
    }

    #[test]
    fn rejects_malformed_colors() {
        for bad in ["FF0000", "#FF00", "#GG0000", "#FF0000000", "#", "#+1234567"] {
            assert_eq!(
                parse_color(bad),
                Err(PaintError::InvalidColor(bad.to_string())),
                "{bad}"
            );
        }
    }

    #[test]
    fn format_uses_argb_order() {
        assert_eq!(format_color(Rgba([0x66, 0, 0, 255])), "#FF660000");
    }

    #[test]
    fn tags_resolve_to_sources() {
        assert_eq!(
            PaintSource::from_tag("#FF000000").unwrap(),
            PaintSource::Solid(Rgba([0, 0, 0, 255]))
        );
        for name in PATTERN_NAMES {
            assert!(matches!(PaintSource::from_tag(name), Ok(PaintSource::Pattern(_))));
        }
        assert_eq!(
            PaintSource::from_tag("plaid"),
            Err(PaintError::UnknownPattern("plaid".to_string()))
        );
    }

    #[test]
    fn pattern_sample_wraps() {
        let src = PaintSource::from_tag("pattern2").unwrap();
        assert_eq!(src.sample(0, 0), src.sample(16, 32));
        assert_ne!(src.sample(0, 0), src.sample(8, 0));
    }

    #[test]
    fn opacity_rounding() {
        assert_eq!(percent_to_alpha(100), 255);
        assert_eq!(percent_to_alpha(0), 0);
        assert_eq!(percent_to_alpha(50), 128);
        assert_eq!(percent_to_alpha(200), 255);
        assert_eq!(alpha_to_percent(255), 100);
        assert_eq!(alpha_to_percent(128), 50);
        assert_eq!(alpha_to_percent(0), 0);
        for p in 0..=100u8 {
            assert_eq!(alpha_to_percent(percent_to_alpha(p)), p);
        }
    }
}
