//! Pan and pinch-zoom tracking for the puzzle view
//!
//! Pan and zoom can overlap, so the phase records both. The view transform
//! is snapshotted when the first gesture of a sequence starts and becomes
//! the new baseline only when the last one ends.
//!
//! Panning is clamped hard: once an edge of the content has moved past the
//! allowed overscroll fraction of the viewport, further movement in that
//! direction is dropped. There is no spring-back.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{MAX_ZOOM, MIN_ZOOM, OVERSCROLL_FRACTION};

/// Offset and uniform scale applied to the puzzle image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub offset: Vec2,
    pub scale: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            scale: 1.0,
        }
    }
}

impl ViewTransform {
    /// Viewport point to unscaled image point.
    pub fn to_content(&self, point: Vec2) -> Vec2 {
        (point - self.offset) / self.scale
    }

    pub fn to_view(&self, point: Vec2) -> Vec2 {
        point * self.scale + self.offset
    }
}

/// Zoom range and how far content may be dragged off screen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GestureBounds {
    pub min_zoom: f32,
    pub max_zoom: f32,
    /// Fraction of the viewport an edge may travel past, per axis.
    pub overscroll: Vec2,
}

impl Default for GestureBounds {
    fn default() -> Self {
        Self {
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            overscroll: Vec2::splat(OVERSCROLL_FRACTION),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Pan,
    Zoom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GesturePhase {
    #[default]
    Idle,
    Pan,
    Zoom,
    PanAndZoom,
}

impl GesturePhase {
    pub fn has(self, gesture: Gesture) -> bool {
        matches!(
            (self, gesture),
            (GesturePhase::Pan | GesturePhase::PanAndZoom, Gesture::Pan)
                | (GesturePhase::Zoom | GesturePhase::PanAndZoom, Gesture::Zoom)
        )
    }

    fn with(self, gesture: Gesture) -> Self {
        match (self, gesture) {
            (GesturePhase::Idle, Gesture::Pan) => GesturePhase::Pan,
            (GesturePhase::Idle, Gesture::Zoom) => GesturePhase::Zoom,
            (GesturePhase::Pan, Gesture::Zoom) | (GesturePhase::Zoom, Gesture::Pan) => {
                GesturePhase::PanAndZoom
            }
            (phase, _) => phase,
        }
    }

    fn without(self, gesture: Gesture) -> Self {
        match (self, gesture) {
            (GesturePhase::PanAndZoom, Gesture::Pan) => GesturePhase::Zoom,
            (GesturePhase::PanAndZoom, Gesture::Zoom) => GesturePhase::Pan,
            (GesturePhase::Pan, Gesture::Pan) | (GesturePhase::Zoom, Gesture::Zoom) => {
                GesturePhase::Idle
            }
            (phase, _) => phase,
        }
    }
}

/// Where an axis sits relative to its pan limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AxisBound {
    #[default]
    Free,
    AtMin,
    AtMax,
}

pub struct GestureTracker {
    bounds: GestureBounds,
    viewport: Vec2,
    /// Unscaled image size in view points.
    content: Vec2,
    transform: ViewTransform,
    baseline: ViewTransform,
    phase: GesturePhase,
    anchor: Vec2,
    /// Translation applied during this sequence.
    pan: Vec2,
    /// Last cumulative translation reported by the platform.
    last_translation: Vec2,
    /// Zoom multiplier relative to the baseline.
    zoom: f32,
    /// Last cumulative pinch scale reported by the platform.
    last_pinch: f32,
    axes: [AxisBound; 2],
}

impl GestureTracker {
    pub fn new(bounds: GestureBounds, viewport: Vec2, content: Vec2) -> Self {
        Self {
            bounds,
            viewport,
            content,
            transform: ViewTransform::default(),
            baseline: ViewTransform::default(),
            phase: GesturePhase::Idle,
            anchor: Vec2::ZERO,
            pan: Vec2::ZERO,
            last_translation: Vec2::ZERO,
            zoom: 1.0,
            last_pinch: 1.0,
            axes: [AxisBound::Free; 2],
        }
    }

    pub fn transform(&self) -> ViewTransform {
        self.transform
    }

    pub fn phase(&self) -> GesturePhase {
        self.phase
    }

    pub fn axis_bounds(&self) -> [AxisBound; 2] {
        self.axes
    }

    /// Back to identity, e.g. for a new game.
    pub fn reset(&mut self, viewport: Vec2, content: Vec2) {
        *self = Self::new(self.bounds, viewport, content);
    }

    pub fn begin(&mut self, gesture: Gesture, anchor: Vec2) {
        if self.phase == GesturePhase::Idle {
            self.baseline = self.transform;
            self.anchor = anchor;
            self.pan = Vec2::ZERO;
            self.last_translation = Vec2::ZERO;
            self.zoom = 1.0;
            self.last_pinch = 1.0;
        }
        self.phase = self.phase.with(gesture);
    }

    /// Finish one gesture. Shared state is only rebased when none remain.
    pub fn end(&mut self, gesture: Gesture) {
        self.phase = self.phase.without(gesture);
        if self.phase == GesturePhase::Idle {
            self.baseline = self.transform;
            self.pan = Vec2::ZERO;
            self.last_translation = Vec2::ZERO;
            self.zoom = 1.0;
            self.last_pinch = 1.0;
            self.axes = [AxisBound::Free; 2];
        }
    }

    /// Allowed offset range on one axis at the current scale.
    fn axis_range(&self, axis: usize) -> (f32, f32) {
        let f = self.bounds.overscroll[axis];
        let view = self.viewport[axis];
        let content = self.content[axis] * self.transform.scale;
        let lo = view * (1.0 - f) - content;
        let hi = view * f;
        if lo <= hi { (lo, hi) } else { (hi, lo) }
    }

    fn pan_axis(&mut self, axis: usize, delta: f32) {
        if delta == 0.0 {
            return;
        }
        let (lo, hi) = self.axis_range(axis);
        let current = self.transform.offset[axis];
        if delta > 0.0 && current >= hi {
            self.axes[axis] = AxisBound::AtMax;
            return;
        }
        if delta < 0.0 && current <= lo {
            self.axes[axis] = AxisBound::AtMin;
            return;
        }
        let wanted = current + delta;
        let (next, bound) = if wanted > hi {
            (hi, AxisBound::AtMax)
        } else if wanted < lo {
            (lo, AxisBound::AtMin)
        } else {
            (wanted, AxisBound::Free)
        };
        self.pan[axis] += next - current;
        self.transform.offset[axis] = next;
        self.axes[axis] = bound;
    }

    /// Platform pan update: cumulative translation since the pan began.
    pub fn pan_to(&mut self, translation: Vec2) {
        if !self.phase.has(Gesture::Pan) {
            return;
        }
        let delta = translation - self.last_translation;
        self.last_translation = translation;
        self.pan_axis(0, delta.x);
        self.pan_axis(1, delta.y);
    }

    /// Platform pinch update: cumulative scale since the pinch began.
    pub fn pinch_to(&mut self, scale: f32) {
        if !self.phase.has(Gesture::Zoom) {
            return;
        }
        let delta = scale - self.last_pinch;
        self.last_pinch = scale;

        let effective = self.baseline.scale * self.zoom;
        if (effective >= self.bounds.max_zoom && delta > 0.0)
            || (effective <= self.bounds.min_zoom && delta < 0.0)
        {
            return;
        }

        let base = self.baseline.scale.max(f32::EPSILON);
        let lo = self.bounds.min_zoom / base;
        let hi = (self.bounds.max_zoom / base).max(lo);
        self.zoom = (self.zoom + delta).clamp(lo, hi);
        self.transform.scale = base * self.zoom;
        self.transform.offset = self.anchor + (self.baseline.offset - self.anchor) * self.zoom + self.pan;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> GestureTracker {
        GestureTracker::new(
            GestureBounds::default(),
            Vec2::new(100.0, 100.0),
            Vec2::new(100.0, 100.0),
        )
    }

    #[test]
    fn test_phase_transitions() {
        let p = GesturePhase::Idle.with(Gesture::Pan).with(Gesture::Zoom);
        assert_eq!(p, GesturePhase::PanAndZoom);
        assert_eq!(p.without(Gesture::Pan), GesturePhase::Zoom);
        assert_eq!(p.without(Gesture::Pan).without(Gesture::Zoom), GesturePhase::Idle);
        assert!(p.has(Gesture::Pan) && p.has(Gesture::Zoom));
    }

    #[test]
    fn test_zoom_clamps_at_max_and_unclamps() {
        let mut t = tracker();
        t.begin(Gesture::Zoom, Vec2::new(50.0, 50.0));
        t.pinch_to(5.3);
        assert!((t.transform().scale - 5.0).abs() < 1e-5);

        // Still pushing out: ignored.
        t.pinch_to(6.0);
        assert!((t.transform().scale - 5.0).abs() < 1e-5);

        // Any pull back is applied at once.
        t.pinch_to(5.9);
        assert!(t.transform().scale < 5.0);
        assert!((t.transform().scale - 4.9).abs() < 1e-4);
    }

    #[test]
    fn test_zoom_clamps_at_min() {
        let mut t = tracker();
        t.begin(Gesture::Zoom, Vec2::ZERO);
        t.pinch_to(0.5);
        assert!((t.transform().scale - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_zoom_keeps_anchor_fixed() {
        let mut t = tracker();
        let anchor = Vec2::new(30.0, 40.0);
        t.begin(Gesture::Zoom, anchor);
        t.pinch_to(2.0);
        let content = Vec2::new(30.0, 40.0);
        assert!((t.transform().to_view(content) - anchor).length() < 1e-4);
    }

    #[test]
    fn test_pan_clamps_hard_at_overscroll() {
        let mut t = tracker();
        t.begin(Gesture::Pan, Vec2::ZERO);
        // Allowed x offset at scale 1 is [-50, 50].
        t.pan_to(Vec2::new(30.0, 0.0));
        assert_eq!(t.transform().offset.x, 30.0);
        assert_eq!(t.axis_bounds()[0], AxisBound::Free);

        t.pan_to(Vec2::new(80.0, 0.0));
        assert_eq!(t.transform().offset.x, 50.0);
        assert_eq!(t.axis_bounds()[0], AxisBound::AtMax);

        // Further push is dropped, not accumulated.
        t.pan_to(Vec2::new(120.0, 0.0));
        assert_eq!(t.transform().offset.x, 50.0);

        // Moving back applies immediately.
        t.pan_to(Vec2::new(110.0, 0.0));
        assert_eq!(t.transform().offset.x, 40.0);
        assert_eq!(t.axis_bounds()[0], AxisBound::Free);
    }

    #[test]
    fn test_pan_axes_independent() {
        let mut t = tracker();
        t.begin(Gesture::Pan, Vec2::ZERO);
        t.pan_to(Vec2::new(-200.0, 10.0));
        assert_eq!(t.transform().offset, Vec2::new(-50.0, 10.0));
        assert_eq!(t.axis_bounds(), [AxisBound::AtMin, AxisBound::Free]);
    }

    #[test]
    fn test_partial_end_keeps_sequence() {
        let mut t = tracker();
        t.begin(Gesture::Pan, Vec2::ZERO);
        t.begin(Gesture::Zoom, Vec2::new(50.0, 50.0));
        t.pinch_to(2.0);
        t.end(Gesture::Zoom);
        assert_eq!(t.phase(), GesturePhase::Pan);
        // Zoom accumulator survives the partial end.
        assert!((t.zoom - 2.0).abs() < 1e-6);

        t.end(Gesture::Pan);
        assert_eq!(t.phase(), GesturePhase::Idle);
        assert_eq!(t.zoom, 1.0);
        assert!((t.baseline.scale - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_snapshot_taken_once_per_sequence() {
        let mut t = tracker();
        t.begin(Gesture::Pan, Vec2::ZERO);
        t.pan_to(Vec2::new(10.0, 0.0));
        t.begin(Gesture::Zoom, Vec2::ZERO);
        assert_eq!(t.baseline.offset, Vec2::ZERO);
    }

    #[test]
    fn test_updates_without_begin_ignored() {
        let mut t = tracker();
        t.pan_to(Vec2::new(10.0, 10.0));
        t.pinch_to(3.0);
        assert_eq!(t.transform(), ViewTransform::default());
    }

    #[test]
    fn test_to_content_inverts_to_view() {
        let vt = ViewTransform {
            offset: Vec2::new(5.0, -3.0),
            scale: 2.0,
        };
        let p = Vec2::new(7.0, 11.0);
        assert!((vt.to_content(vt.to_view(p)) - p).length() < 1e-5);
    }
}
