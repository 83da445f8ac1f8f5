//! Raster target with a bottom-left origin
//!
//! Backed by a `tiny_skia::Pixmap`, which stores rows top-down. Every
//! path and rect call takes raster-space coordinates (origin bottom-left)
//! and is mapped to pixmap rows by a single Y-flip transform. Fragment
//! copies work directly on pixmap rows, top-left origin.

use tiny_skia::{
    BlendMode, Color, FillRule, IntRect, Mask, Paint, Path, PathBuilder, Pixmap, PixmapPaint,
    PremultipliedColorU8, Rect, Stroke, Transform,
};

use crate::coords::CoordinateSpace;
use crate::error::{BridgeError, BridgeResult};

/// Active clip: the raster-space rectangle and its rendered mask.
struct ClipRegion {
    rect: Option<Rect>,
    mask: Mask,
}

pub struct Raster {
    pixmap: Pixmap,
    space: CoordinateSpace,
    clip: Option<ClipRegion>,
}

impl Raster {
    /// Allocate a raster for a puzzle of the given size.
    pub fn new(space: CoordinateSpace) -> BridgeResult<Self> {
        let alloc_err = || BridgeError::SurfaceAllocation {
            width: space.width(),
            height: space.height(),
        };
        let width = u32::try_from(space.width()).map_err(|_| alloc_err())?;
        let height = u32::try_from(space.height()).map_err(|_| alloc_err())?;
        let pixmap = Pixmap::new(width, height).ok_or_else(alloc_err)?;
        Ok(Self {
            pixmap,
            space,
            clip: None,
        })
    }

    pub fn space(&self) -> &CoordinateSpace {
        &self.space
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Raster space to pixmap rows.
    fn flip(&self) -> Transform {
        Transform::from_row(1.0, 0.0, 0.0, -1.0, 0.0, self.space.height() as f32)
    }

    fn paint(colour: Color, anti_alias: bool) -> Paint<'static> {
        let mut paint = Paint::default();
        paint.set_color(colour);
        paint.anti_alias = anti_alias;
        paint
    }

    pub fn clear(&mut self, colour: Color) {
        self.pixmap.fill(colour);
    }

    /// Fill an axis-aligned rectangle given by its bottom-left corner.
    pub fn fill_rect(&mut self, rect: Rect, colour: Color) {
        let paint = Self::paint(colour, false);
        let transform = self.flip();
        let mask = self.clip.as_ref().map(|c| &c.mask);
        self.pixmap.fill_rect(rect, &paint, transform, mask);
    }

    pub fn fill_path(&mut self, path: &Path, colour: Color) {
        let paint = Self::paint(colour, true);
        let transform = self.flip();
        let mask = self.clip.as_ref().map(|c| &c.mask);
        self.pixmap
            .fill_path(path, &paint, FillRule::Winding, transform, mask);
    }

    pub fn stroke_path(&mut self, path: &Path, colour: Color, width: f32) {
        let paint = Self::paint(colour, true);
        let stroke = Stroke {
            width,
            ..Stroke::default()
        };
        let transform = self.flip();
        let mask = self.clip.as_ref().map(|c| &c.mask);
        self.pixmap
            .stroke_path(path, &paint, &stroke, transform, mask);
    }

    /// Restrict drawing to `rect` (raster space), intersected with any
    /// clip already in force.
    pub fn clip_to(&mut self, rect: Rect) {
        let rect = match &self.clip {
            Some(existing) => existing.rect.and_then(|r| r.intersect(&rect)),
            None => Some(rect),
        };
        let Some(mut mask) = Mask::new(self.pixmap.width(), self.pixmap.height()) else {
            log::warn!("clip mask allocation failed, drawing unclipped");
            return;
        };
        if let Some(r) = rect {
            let path = PathBuilder::from_rect(r);
            mask.fill_path(&path, FillRule::Winding, false, self.flip());
        }
        self.clip = Some(ClipRegion { rect, mask });
    }

    /// Drop the clip. Harmless when nothing is clipped.
    pub fn unclip(&mut self) {
        self.clip = None;
    }

    pub fn is_clipped(&self) -> bool {
        self.clip.is_some()
    }

    /// Copy a fragment addressed in pixmap rows (origin top-left).
    ///
    /// The rectangle must already lie within the canvas.
    pub fn copy_fragment(&self, x: i32, y: i32, width: u32, height: u32) -> Option<Pixmap> {
        let rect = IntRect::from_xywh(x, y, width, height)?;
        self.pixmap.clone_rect(rect)
    }

    /// Paste a fragment whose top-left corner is given in pixmap rows.
    pub fn place_fragment_top_left(&mut self, fragment: &Pixmap, x: i32, y: i32) {
        let paint = PixmapPaint {
            blend_mode: BlendMode::Source,
            ..PixmapPaint::default()
        };
        let mask = self.clip.as_ref().map(|c| &c.mask);
        self.pixmap.draw_pixmap(
            x,
            y,
            fragment.as_ref(),
            &paint,
            Transform::identity(),
            mask,
        );
    }

    /// Paste a fragment whose bottom-left corner is given in raster space.
    pub fn place_fragment(&mut self, fragment: &Pixmap, x: i32, raster_y: i32) {
        let top = self.space.height() - raster_y - fragment.height() as i32;
        self.place_fragment_top_left(fragment, x, top);
    }

    /// Composite a pre-coloured glyph image whose top-left corner is given
    /// in pixmap rows.
    pub fn blend_image(&mut self, image: &Pixmap, x: i32, y: i32) {
        let mask = self.clip.as_ref().map(|c| &c.mask);
        self.pixmap.draw_pixmap(
            x,
            y,
            image.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            mask,
        );
    }

    /// Pixel at an engine-space (top-left origin) location.
    pub fn pixel(&self, x: i32, y: i32) -> Option<PremultipliedColorU8> {
        if !self.space.contains(x, y) {
            return None;
        }
        self.pixmap.pixel(x as u32, y as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raster() -> Raster {
        let mut r = Raster::new(CoordinateSpace::new(10, 10)).unwrap();
        r.clear(Color::WHITE);
        r
    }

    fn is_black(r: &Raster, x: i32, y: i32) -> bool {
        let p = r.pixel(x, y).unwrap();
        p.red() == 0 && p.green() == 0 && p.blue() == 0
    }

    #[test]
    fn test_zero_size_is_allocation_error() {
        let err = Raster::new(CoordinateSpace::new(0, 10)).err().unwrap();
        assert!(matches!(err, BridgeError::SurfaceAllocation { width: 0, height: 10 }));
        assert!(Raster::new(CoordinateSpace::new(-3, 10)).is_err());
    }

    #[test]
    fn test_fill_rect_uses_bottom_left_origin() {
        let mut r = raster();
        // Bottom two rows in raster space are the last two pixmap rows.
        r.fill_rect(Rect::from_xywh(0.0, 0.0, 10.0, 2.0).unwrap(), Color::BLACK);
        assert!(is_black(&r, 5, 9));
        assert!(is_black(&r, 5, 8));
        assert!(!is_black(&r, 5, 7));
    }

    #[test]
    fn test_clip_blocks_outside() {
        let mut r = raster();
        r.clip_to(Rect::from_xywh(0.0, 0.0, 5.0, 10.0).unwrap());
        r.fill_rect(Rect::from_xywh(0.0, 0.0, 10.0, 10.0).unwrap(), Color::BLACK);
        assert!(is_black(&r, 2, 2));
        assert!(!is_black(&r, 7, 2));
        r.unclip();
        assert!(!r.is_clipped());
    }

    #[test]
    fn test_nested_clip_intersects() {
        let mut r = raster();
        r.clip_to(Rect::from_xywh(0.0, 0.0, 6.0, 10.0).unwrap());
        r.clip_to(Rect::from_xywh(4.0, 0.0, 6.0, 10.0).unwrap());
        r.fill_rect(Rect::from_xywh(0.0, 0.0, 10.0, 10.0).unwrap(), Color::BLACK);
        assert!(!is_black(&r, 2, 5));
        assert!(is_black(&r, 5, 5));
        assert!(!is_black(&r, 8, 5));
    }

    #[test]
    fn test_place_fragment_conventions_agree() {
        let mut r = raster();
        let mut frag = Pixmap::new(2, 3).unwrap();
        frag.fill(Color::BLACK);
        // Top-left (4, 1) is raster bottom-left (4, 10 - 1 - 3).
        r.place_fragment(&frag, 4, 6);
        assert!(is_black(&r, 4, 1));
        assert!(is_black(&r, 5, 3));
        assert!(!is_black(&r, 4, 4));
        assert!(!is_black(&r, 4, 0));
    }
}
