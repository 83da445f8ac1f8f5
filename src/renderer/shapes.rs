//! Path generation for 2D primitives
//!
//! All points are in raster space. Callers flip engine coordinates first.

use glam::Vec2;
use tiny_skia::{Path, PathBuilder, Rect};

/// Closed polygon through the given points.
pub fn polygon(points: &[Vec2]) -> Option<Path> {
    let (first, rest) = points.split_first()?;
    let mut pb = PathBuilder::new();
    pb.move_to(first.x, first.y);
    for p in rest {
        pb.line_to(p.x, p.y);
    }
    pb.close();
    pb.finish()
}

/// Open segment between two points.
pub fn line(a: Vec2, b: Vec2) -> Option<Path> {
    let mut pb = PathBuilder::new();
    pb.move_to(a.x, a.y);
    pb.line_to(b.x, b.y);
    pb.finish()
}

/// Circle outline path.
///
/// Zero radius still produces a one-pixel dot rather than nothing.
pub fn circle(center: Vec2, radius: f32) -> Option<Path> {
    PathBuilder::from_circle(center.x, center.y, radius.max(0.5))
}

/// Corners of a segment widened to `thickness`, as a quad.
pub fn thick_line_quad(a: Vec2, b: Vec2, thickness: f32) -> [Vec2; 4] {
    let dir = (b - a).normalize_or_zero();
    // Perpendicular for width
    let perp = Vec2::new(-dir.y, dir.x) * (thickness * 0.5);
    [a + perp, b + perp, b - perp, a - perp]
}

/// Rectangle from its bottom-left corner. Non-positive sizes give `None`.
pub fn rect(x: f32, y: f32, width: f32, height: f32) -> Option<Rect> {
    if width <= 0.0 || height <= 0.0 {
        return None;
    }
    Rect::from_xywh(x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polygon_needs_points() {
        assert!(polygon(&[]).is_none());
        let tri = polygon(&[Vec2::new(0.0, 0.0), Vec2::new(4.0, 0.0), Vec2::new(0.0, 4.0)]);
        let bounds = tri.unwrap().bounds();
        assert_eq!(bounds.width(), 4.0);
        assert_eq!(bounds.height(), 4.0);
    }

    #[test]
    fn test_circle_bounds() {
        let path = circle(Vec2::new(10.0, 10.0), 5.0).unwrap();
        let b = path.bounds();
        assert!((b.left() - 5.0).abs() < 0.01);
        assert!((b.right() - 15.0).abs() < 0.01);
    }

    #[test]
    fn test_thick_line_quad_width() {
        let quad = thick_line_quad(Vec2::ZERO, Vec2::new(10.0, 0.0), 4.0);
        assert_eq!(quad[0], Vec2::new(0.0, 2.0));
        assert_eq!(quad[2], Vec2::new(10.0, -2.0));
    }

    #[test]
    fn test_thick_line_quad_degenerate() {
        let p = Vec2::new(3.0, 3.0);
        let quad = thick_line_quad(p, p, 4.0);
        assert!(quad.iter().all(|&c| c == p));
    }

    #[test]
    fn test_rect_rejects_empty() {
        assert!(rect(0.0, 0.0, 0.0, 5.0).is_none());
        assert!(rect(0.0, 0.0, 2.0, 5.0).is_some());
    }
}
