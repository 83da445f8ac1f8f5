//! Engine colour indices to raster colours

use tiny_skia::Color;

/// Index the engine passes when a shape should not be filled.
pub const NO_COLOUR: i32 = -1;

/// The engine's colour table for the current game.
#[derive(Debug, Clone)]
pub struct Palette {
    colours: Vec<Color>,
}

impl Palette {
    /// Build from the engine's RGB float triples.
    ///
    /// With `dark_theme` the background entry (index 0) becomes black.
    pub fn from_rgb(rgb: &[[f32; 3]], dark_theme: bool) -> Self {
        let mut colours: Vec<Color> = rgb
            .iter()
            .map(|&[r, g, b]| {
                Color::from_rgba(r.clamp(0.0, 1.0), g.clamp(0.0, 1.0), b.clamp(0.0, 1.0), 1.0)
                    .unwrap_or(Color::BLACK)
            })
            .collect();
        if dark_theme {
            if let Some(first) = colours.first_mut() {
                *first = Color::BLACK;
            }
        }
        Self { colours }
    }

    pub fn len(&self) -> usize {
        self.colours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colours.is_empty()
    }

    /// Background colour (index 0), or the default grey for an empty table.
    pub fn background(&self) -> Color {
        self.colours.first().copied().unwrap_or_else(|| {
            let g = crate::consts::DEFAULT_BACKGROUND;
            Color::from_rgba(g, g, g, 1.0).unwrap_or(Color::WHITE)
        })
    }

    /// Resolve an engine colour index.
    ///
    /// [`NO_COLOUR`] gives `None`. Any other unknown index logs and falls
    /// back to black so the engine's call still completes.
    pub fn resolve(&self, index: i32) -> Option<Color> {
        if index == NO_COLOUR {
            return None;
        }
        match usize::try_from(index).ok().and_then(|i| self.colours.get(i)) {
            Some(colour) => Some(*colour),
            None => {
                log::warn!(
                    "colour index {} outside palette of {}, using black",
                    index,
                    self.colours.len()
                );
                Some(Color::BLACK)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn palette() -> Palette {
        Palette::from_rgb(&[[0.8, 0.8, 0.8], [1.0, 0.0, 0.0]], false)
    }

    #[test]
    fn test_resolve_known_index() {
        let red = palette().resolve(1).unwrap();
        assert_eq!(red.to_color_u8().red(), 255);
        assert_eq!(red.to_color_u8().green(), 0);
    }

    #[test]
    fn test_resolve_no_colour() {
        assert!(palette().resolve(NO_COLOUR).is_none());
    }

    #[test]
    fn test_resolve_out_of_range_is_black() {
        assert_eq!(palette().resolve(7), Some(Color::BLACK));
        assert_eq!(palette().resolve(-5), Some(Color::BLACK));
    }

    #[test]
    fn test_dark_theme_replaces_background() {
        let dark = Palette::from_rgb(&[[0.8, 0.8, 0.8], [1.0, 0.0, 0.0]], true);
        assert_eq!(dark.background(), Color::BLACK);
        assert_eq!(dark.resolve(1), palette().resolve(1));
    }

    #[test]
    fn test_out_of_gamut_is_clamped() {
        let p = Palette::from_rgb(&[[2.0, -1.0, 0.5]], false);
        let c = p.background().to_color_u8();
        assert_eq!(c.red(), 255);
        assert_eq!(c.green(), 0);
    }
}
