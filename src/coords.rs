//! Coordinate conversions between engine, raster and view space
//!
//! - Engine space: origin top-left, Y down, integer pixels.
//! - Raster space: origin bottom-left, Y up, same pixel grid.
//! - View space: the on-screen image, which may be displayed at any size.

use glam::Vec2;

/// Pixel dimensions of the active puzzle, fixed for the life of one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinateSpace {
    width: i32,
    height: i32,
}

impl CoordinateSpace {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    /// Flip an engine Y into raster space.
    ///
    /// Elements with a height pass it so their top edge lands where the
    /// engine asked after the flip.
    pub fn to_raster_y(&self, engine_y: i32, element_height: i32) -> i32 {
        self.height - engine_y - element_height
    }

    /// Float version of [`Self::to_raster_y`] for zero-height points.
    pub fn to_raster_yf(&self, engine_y: f32) -> f32 {
        self.height as f32 - engine_y
    }

    /// Engine point to raster point.
    pub fn to_raster(&self, x: i32, y: i32) -> Vec2 {
        Vec2::new(x as f32, self.to_raster_y(y, 0) as f32)
    }

    /// Whether an engine pixel lies on the canvas.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }
}

/// Maps points on the displayed image back to engine pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewMapping {
    /// Size the image is displayed at, in view points.
    pub frame: Vec2,
}

impl ViewMapping {
    pub fn new(frame: Vec2) -> Self {
        Self { frame }
    }

    /// View point to engine pixel: `point / (frame / puzzle)`.
    pub fn to_engine(&self, space: &CoordinateSpace, point: Vec2) -> (i32, i32) {
        if self.frame.x <= 0.0 || self.frame.y <= 0.0 {
            return (point.x as i32, point.y as i32);
        }
        let ratio = self.frame / space.size();
        let p = point / ratio;
        (p.x.floor() as i32, p.y.floor() as i32)
    }

    /// Engine pixels per view point, per axis.
    pub fn engine_per_point(&self, space: &CoordinateSpace) -> Vec2 {
        if self.frame.x <= 0.0 || self.frame.y <= 0.0 {
            return Vec2::ONE;
        }
        space.size() / self.frame
    }
}
