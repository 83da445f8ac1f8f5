//! Animation timer driven by the host's frame clock

use crate::consts::{FRAME_INTERVAL, MAX_FRAME_DT, MAX_SUBSTEPS};

/// Fixed-step timer the engine switches on for animations.
///
/// It only runs while the engine has asked for it *and* the puzzle view is
/// visible; either condition going away drops any accumulated time.
#[derive(Debug, Default)]
pub struct AnimationTimer {
    requested: bool,
    visible: bool,
    accumulator: f32,
}

impl AnimationTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.requested && self.visible
    }

    pub fn is_requested(&self) -> bool {
        self.requested
    }

    pub fn activate(&mut self) {
        if !self.requested {
            log::debug!("animation timer on");
        }
        self.requested = true;
    }

    pub fn deactivate(&mut self) {
        if self.requested {
            log::debug!("animation timer off");
        }
        self.requested = false;
        self.accumulator = 0.0;
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        if !visible {
            self.accumulator = 0.0;
        }
    }

    /// Stop for good, e.g. when the game is replaced.
    pub fn reset(&mut self) {
        self.requested = false;
        self.accumulator = 0.0;
    }

    /// Feed elapsed wall time, get the number of fixed steps due.
    pub fn advance(&mut self, dt: f32) -> u32 {
        if !self.is_running() {
            return 0;
        }
        self.accumulator += dt.clamp(0.0, MAX_FRAME_DT);

        let mut steps = 0;
        while self.accumulator >= FRAME_INTERVAL && steps < MAX_SUBSTEPS {
            self.accumulator -= FRAME_INTERVAL;
            steps += 1;
        }
        // Fell behind: drop the backlog rather than spiral.
        if steps == MAX_SUBSTEPS {
            self.accumulator = 0.0;
        }
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_until_requested_and_visible() {
        let mut t = AnimationTimer::new();
        assert_eq!(t.advance(1.0), 0);
        t.activate();
        assert_eq!(t.advance(1.0), 0);
        t.set_visible(true);
        assert!(t.is_running());
        assert_eq!(t.advance(0.035), 3);
    }

    #[test]
    fn test_remainder_carries() {
        let mut t = AnimationTimer::new();
        t.activate();
        t.set_visible(true);
        assert_eq!(t.advance(0.006), 0);
        assert_eq!(t.advance(0.006), 1);
    }

    #[test]
    fn test_substeps_capped() {
        let mut t = AnimationTimer::new();
        t.activate();
        t.set_visible(true);
        assert_eq!(t.advance(5.0), MAX_SUBSTEPS);
        assert_eq!(t.advance(0.0), 0);
    }

    #[test]
    fn test_hidden_view_stops_timer() {
        let mut t = AnimationTimer::new();
        t.activate();
        t.set_visible(true);
        t.advance(0.005);
        t.set_visible(false);
        assert!(!t.is_running());
        assert!(t.is_requested());
        t.set_visible(true);
        assert_eq!(t.advance(0.006), 0);
    }
}
