//! Drawing target for the engine
//!
//! The engine draws by calling primitives through [`DrawingApi`]. All
//! coordinates arrive in engine space (origin top-left); the implementation
//! is responsible for flipping them into its raster.

pub mod blitter;
pub mod palette;
pub mod raster;
pub mod shapes;
pub mod surface;
pub mod text;

pub use blitter::{BLITTER_FROMSAVED, BlitterHandle, BlitterStore};
pub use palette::{NO_COLOUR, Palette};
pub use surface::DrawingSurface;
pub use text::{FontType, TextAlign, TextRenderer};

use glam::Vec2;

/// Every primitive an engine can call while drawing.
///
/// Calls are synchronous and happen inside the engine's own call stack,
/// so implementations must never fail outward: bad input degrades to a
/// skipped draw or a substitute colour.
pub trait DrawingApi {
    /// Text anchored at `(x, y)` per `align`.
    #[allow(clippy::too_many_arguments)]
    fn draw_text(
        &mut self,
        x: i32,
        y: i32,
        font: FontType,
        size: i32,
        align: TextAlign,
        colour: i32,
        text: &str,
    );

    fn draw_rect(&mut self, x: i32, y: i32, w: i32, h: i32, colour: i32);

    fn draw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, colour: i32);

    /// Polygon with an outline, filled unless `fill` is [`NO_COLOUR`].
    fn draw_polygon(&mut self, points: &[(i32, i32)], fill: i32, outline: i32);

    /// Circle with an outline, filled unless `fill` is [`NO_COLOUR`].
    fn draw_circle(&mut self, cx: i32, cy: i32, radius: i32, fill: i32, outline: i32);

    /// Wide line. Hosts without native support get a filled quad.
    fn draw_thick_line(&mut self, thickness: f32, x1: f32, y1: f32, x2: f32, y2: f32, colour: i32) {
        let quad = shapes::thick_line_quad(Vec2::new(x1, y1), Vec2::new(x2, y2), thickness);
        let points: Vec<(i32, i32)> = quad
            .iter()
            .map(|p| (p.x.round() as i32, p.y.round() as i32))
            .collect();
        self.draw_polygon(&points, colour, colour);
    }

    /// The engine changed this region; the host should present it.
    fn draw_update(&mut self, x: i32, y: i32, w: i32, h: i32);

    fn clip(&mut self, x: i32, y: i32, w: i32, h: i32);

    /// Undo [`Self::clip`]. Does nothing when not clipped.
    fn unclip(&mut self);

    fn start_draw(&mut self);

    fn end_draw(&mut self);

    fn status_bar(&mut self, text: &str);

    fn blitter_new(&mut self, w: i32, h: i32) -> BlitterHandle;

    fn blitter_free(&mut self, handle: BlitterHandle);

    fn blitter_save(&mut self, handle: BlitterHandle, x: i32, y: i32);

    /// Restore a saved fragment; `(BLITTER_FROMSAVED, BLITTER_FROMSAVED)`
    /// restores where it was saved from.
    fn blitter_load(&mut self, handle: BlitterHandle, x: i32, y: i32);

    /// Pick the first string this host can render from a list of
    /// increasingly plain alternatives.
    fn text_fallback(&mut self, candidates: &[&str]) -> Option<String> {
        candidates.first().map(|s| (*s).to_string())
    }
}
