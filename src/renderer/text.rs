//! Text layout and glyph rendering
//!
//! Glyphs come from `fontdue`, using the bundled DejaVu Sans unless a font
//! file overrides it. Without a font the renderer still measures and
//! aligns (so callers get stable anchors) but draws nothing.

use std::path::Path;
use std::sync::Arc;

use fontdue::{Font, FontSettings};
use glam::Vec2;
use tiny_skia::{Color, ColorU8, Pixmap};

use super::raster::Raster;
use crate::error::{BridgeError, BridgeResult};

pub const ALIGN_HLEFT: i32 = 0;
pub const ALIGN_HCENTRE: i32 = 1;
pub const ALIGN_HRIGHT: i32 = 2;
pub const ALIGN_VNORMAL: i32 = 0;
pub const ALIGN_VCENTRE: i32 = 0x100;

/// Vertical centring drops the baseline by this fraction of the font size.
/// An approximation; labels only need to look roughly centred.
const VCENTRE_OFFSET: f32 = 0.3;
/// Advance per character when no font is loaded.
const FALLBACK_ADVANCE: f32 = 0.6;

const DEFAULT_FONT_BYTES: &[u8] = include_bytes!("../../fonts/DejaVuSans.ttf");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HAlign {
    Left,
    Centre,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VAlign {
    Baseline,
    Centre,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextAlign {
    pub h: HAlign,
    pub v: VAlign,
}

impl TextAlign {
    /// Decode the engine's alignment bit mask.
    pub fn from_raw(raw: i32) -> Self {
        let h = match raw & 0xff {
            ALIGN_HCENTRE => HAlign::Centre,
            ALIGN_HRIGHT => HAlign::Right,
            _ => HAlign::Left,
        };
        let v = if raw & ALIGN_VCENTRE != 0 {
            VAlign::Centre
        } else {
            VAlign::Baseline
        };
        Self { h, v }
    }
}

/// Fixed or proportional face. Both map to the one loaded font.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontType {
    Fixed,
    Variable,
}

impl FontType {
    pub fn from_raw(raw: i32) -> Self {
        if raw == 0 {
            FontType::Fixed
        } else {
            FontType::Variable
        }
    }
}

#[derive(Clone)]
pub struct TextRenderer {
    font: Option<Arc<Font>>,
}

impl TextRenderer {
    /// Renderer that measures but draws no glyphs.
    pub fn without_font() -> Self {
        Self { font: None }
    }

    /// Renderer using the bundled font.
    pub fn embedded() -> BridgeResult<Self> {
        Self::from_bytes(DEFAULT_FONT_BYTES)
    }

    /// Font file at `path` if given and readable, else the bundled font.
    pub fn with_override(path: Option<&Path>) -> Self {
        if let Some(path) = path {
            match Self::load(path) {
                Ok(renderer) => return renderer,
                Err(e) => log::warn!("{}; using bundled font", e),
            }
        }
        Self::embedded().unwrap_or_else(|e| {
            log::warn!("{}; engine text will not be drawn", e);
            Self::without_font()
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> BridgeResult<Self> {
        let font = Font::from_bytes(bytes, FontSettings::default())
            .map_err(|e| BridgeError::Font(e.to_string()))?;
        Ok(Self {
            font: Some(Arc::new(font)),
        })
    }

    pub fn load(path: &Path) -> BridgeResult<Self> {
        let bytes = std::fs::read(path)?;
        let renderer = Self::from_bytes(&bytes)?;
        log::info!("Loaded font from {}", path.display());
        Ok(renderer)
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Rendered width of `text` at `size`.
    pub fn measure(&self, text: &str, size: f32) -> f32 {
        match &self.font {
            Some(font) => text
                .chars()
                .filter(|c| !c.is_control())
                .map(|c| font.metrics(c, size).advance_width)
                .sum(),
            None => FALLBACK_ADVANCE * size * text.chars().count() as f32,
        }
    }

    /// Baseline origin in raster space for text anchored at `anchor`.
    pub fn anchor(&self, text: &str, anchor: Vec2, size: f32, align: TextAlign) -> Vec2 {
        let width = self.measure(text, size);
        let x = match align.h {
            HAlign::Left => anchor.x,
            HAlign::Centre => anchor.x - width / 2.0,
            HAlign::Right => anchor.x - width,
        };
        let y = match align.v {
            VAlign::Baseline => anchor.y,
            VAlign::Centre => anchor.y - size * VCENTRE_OFFSET,
        };
        Vec2::new(x, y)
    }

    /// Draw `text` with its baseline starting at `origin` (raster space).
    pub fn draw(&self, raster: &mut Raster, text: &str, origin: Vec2, size: f32, colour: Color) {
        let Some(font) = &self.font else {
            log::debug!("no font loaded, skipping text {:?}", text);
            return;
        };
        let c = colour.to_color_u8();
        let canvas_height = raster.space().height() as f32;
        let mut pen_x = origin.x;

        for ch in text.chars() {
            if ch.is_control() {
                continue;
            }
            let (metrics, coverage) = font.rasterize(ch, size);
            if metrics.width > 0 && metrics.height > 0 {
                if let Some(glyph) =
                    glyph_image(metrics.width, metrics.height, &coverage, c)
                {
                    let left = (pen_x + metrics.xmin as f32).round() as i32;
                    let top_raster = origin.y + metrics.ymin as f32 + metrics.height as f32;
                    let top = (canvas_height - top_raster).round() as i32;
                    raster.blend_image(&glyph, left, top);
                }
            }
            pen_x += metrics.advance_width;
        }
    }
}

/// Tint a coverage bitmap into a premultiplied image.
fn glyph_image(width: usize, height: usize, coverage: &[u8], colour: ColorU8) -> Option<Pixmap> {
    let mut image = Pixmap::new(width as u32, height as u32)?;
    for (dst, &cov) in image.pixels_mut().iter_mut().zip(coverage) {
        let alpha = ((colour.alpha() as u16 * cov as u16) / 255) as u8;
        *dst = ColorU8::from_rgba(colour.red(), colour.green(), colour.blue(), alpha).premultiply();
    }
    Some(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_from_raw() {
        let a = TextAlign::from_raw(ALIGN_HCENTRE | ALIGN_VCENTRE);
        assert_eq!(a.h, HAlign::Centre);
        assert_eq!(a.v, VAlign::Centre);
        let b = TextAlign::from_raw(ALIGN_HRIGHT | ALIGN_VNORMAL);
        assert_eq!(b.h, HAlign::Right);
        assert_eq!(b.v, VAlign::Baseline);
        assert_eq!(TextAlign::from_raw(ALIGN_HLEFT).h, HAlign::Left);
    }

    #[test]
    fn test_fallback_measure() {
        let r = TextRenderer::without_font();
        assert!((r.measure("abcd", 10.0) - 24.0).abs() < 1e-4);
    }

    #[test]
    fn test_anchor_offsets() {
        let r = TextRenderer::without_font();
        let at = Vec2::new(100.0, 50.0);
        // "ab" at size 10 measures 12 wide.
        let left = r.anchor("ab", at, 10.0, TextAlign::from_raw(ALIGN_HLEFT));
        assert_eq!(left, at);
        let centre = r.anchor("ab", at, 10.0, TextAlign::from_raw(ALIGN_HCENTRE));
        assert!((centre.x - 94.0).abs() < 1e-4);
        let right = r.anchor("ab", at, 10.0, TextAlign::from_raw(ALIGN_HRIGHT | ALIGN_VCENTRE));
        assert!((right.x - 88.0).abs() < 1e-4);
        assert!((right.y - 47.0).abs() < 1e-4);
    }

    #[test]
    fn test_bad_font_bytes() {
        assert!(matches!(
            TextRenderer::from_bytes(b"not a font"),
            Err(BridgeError::Font(_))
        ));
    }

    #[test]
    fn test_bundled_font_loads() {
        assert!(TextRenderer::embedded().unwrap().has_font());
        let missing = TextRenderer::with_override(Some(Path::new("/nonexistent/font.ttf")));
        assert!(missing.has_font());
    }

    #[test]
    fn test_glyph_image_tints_coverage() {
        let img = glyph_image(2, 1, &[255, 0], ColorU8::from_rgba(255, 0, 0, 255)).unwrap();
        let px = img.pixels();
        assert_eq!(px[0].red(), 255);
        assert_eq!(px[0].alpha(), 255);
        assert_eq!(px[1].alpha(), 0);
    }
}
