//! Single-touch press, long-press and drag translation
//!
//! Turns one finger's down/move/up stream into engine keycodes according to
//! the active [`ControlConfig`]. Positions are engine pixels. Time is passed
//! in explicitly so the long-press timer is driven by the caller's clock.

use std::time::{Duration, Instant};

use glam::Vec2;

use super::controls::{ControlConfig, PressAction};
use crate::effects::{EffectsSink, Feedback};
use crate::keys::*;

/// Where translated keycodes go.
pub trait KeySink {
    fn send_key(&mut self, x: i32, y: i32, code: i32) -> KeyResult;
}

#[derive(Debug, Clone, Copy)]
struct ActiveTouch {
    started: Instant,
    position: Vec2,
    action: PressAction,
    long_pending: bool,
    long_fired: bool,
    /// Mouse mode: the down code has gone out.
    down_sent: bool,
    /// Arrow mode: drag distance not yet turned into keys.
    carry: Vec2,
}

pub struct TapTranslator {
    control: ControlConfig,
    tile_size: f32,
    long_press: Duration,
    single_finger_nav: bool,
    touch: Option<ActiveTouch>,
}

impl TapTranslator {
    pub fn new(control: ControlConfig, tile_size: f32, long_press: Duration) -> Self {
        Self {
            control,
            tile_size,
            long_press,
            single_finger_nav: false,
            touch: None,
        }
    }

    pub fn control(&self) -> &ControlConfig {
        &self.control
    }

    /// Takes effect from the next touch.
    pub fn set_control(&mut self, control: ControlConfig) {
        self.control = control;
    }

    pub fn set_tile_size(&mut self, tile_size: f32) {
        self.tile_size = tile_size;
    }

    /// When on, single-finger moves pan the view instead of dragging.
    pub fn set_single_finger_nav(&mut self, enabled: bool) {
        self.single_finger_nav = enabled;
    }

    pub fn is_touching(&self) -> bool {
        self.touch.is_some()
    }

    /// Arrow-mode distance carried over to the next move.
    pub fn carry(&self) -> Option<Vec2> {
        self.touch.map(|t| t.carry)
    }

    pub fn touch_down(&mut self, position: Vec2, now: Instant) {
        self.touch = Some(ActiveTouch {
            started: now,
            position,
            action: self.control.short_press,
            long_pending: self.control.long_press.is_some(),
            long_fired: false,
            down_sent: false,
            carry: Vec2::ZERO,
        });
    }

    /// Drop the current touch without sending anything.
    pub fn cancel(&mut self) {
        self.touch = None;
    }

    /// Fire the long press if its timer has run out.
    pub fn poll(&mut self, now: Instant, keys: &mut dyn KeySink, effects: &mut dyn EffectsSink) {
        let Some(long) = self.control.long_press else {
            return;
        };
        let Some(touch) = self.touch.as_mut() else {
            return;
        };
        if !touch.long_pending || now.duration_since(touch.started) < self.long_press {
            return;
        }

        touch.long_pending = false;
        touch.long_fired = true;
        touch.action = long;
        log::debug!("long press at {:?}", touch.position);

        if let PressAction::Mouse { down, .. } = long {
            touch.down_sent = true;
            let at = touch.position;
            send(keys, effects, at, down, Feedback::LongPress);
        }
    }

    pub fn touch_move(
        &mut self,
        position: Vec2,
        touches: usize,
        now: Instant,
        keys: &mut dyn KeySink,
        effects: &mut dyn EffectsSink,
    ) {
        self.poll(now, keys, effects);
        let tile = self.tile_size;
        let Some(touch) = self.touch.as_mut() else {
            return;
        };
        // Any movement ends the wait for a long press.
        touch.long_pending = false;
        if touches != 1 || self.single_finger_nav {
            return;
        }
        let feedback = if touch.long_fired {
            Feedback::LongPress
        } else {
            Feedback::ShortPress
        };

        match touch.action {
            PressAction::Mouse { down, drag, .. } => {
                let code = if touch.down_sent { drag } else { down };
                touch.down_sent = true;
                touch.position = position;
                send(keys, effects, position, code, feedback);
            }
            PressAction::ArrowKeys { modifier, reverse } => {
                touch.carry += position - touch.position;
                touch.position = position;
                if tile <= 0.0 {
                    return;
                }
                let mut emitted = Vec::new();
                for axis in 0..2 {
                    while touch.carry[axis].abs() >= tile {
                        let forward = touch.carry[axis] > 0.0;
                        touch.carry[axis] -= tile.copysign(touch.carry[axis]);
                        emitted.push(arrow_key(axis, forward != reverse) | modifier);
                    }
                }
                for code in emitted {
                    let at = Vec2::new(NO_POSITION.0 as f32, NO_POSITION.1 as f32);
                    send(keys, effects, at, code, feedback);
                }
            }
        }
    }

    /// Finish the touch, lifted at `position`.
    pub fn touch_up(
        &mut self,
        position: Vec2,
        now: Instant,
        keys: &mut dyn KeySink,
        effects: &mut dyn EffectsSink,
    ) {
        self.poll(now, keys, effects);
        let Some(touch) = self.touch.take() else {
            return;
        };
        let feedback = if touch.long_fired {
            Feedback::LongPress
        } else {
            Feedback::ShortPress
        };
        if let PressAction::Mouse { down, up, .. } = touch.action {
            if !touch.down_sent {
                send(keys, effects, touch.position, down, feedback);
            }
            send(keys, effects, position, up, feedback);
        }
    }
}

/// Cursor key for one axis (0 = x, 1 = y) in engine direction.
fn arrow_key(axis: usize, positive: bool) -> i32 {
    match (axis, positive) {
        (0, true) => CURSOR_RIGHT,
        (0, false) => CURSOR_LEFT,
        (_, true) => CURSOR_DOWN,
        (_, false) => CURSOR_UP,
    }
}

fn send(keys: &mut dyn KeySink, effects: &mut dyn EffectsSink, at: Vec2, code: i32, feedback: Feedback) {
    if keys.send_key(at.x as i32, at.y as i32, code) == KeyResult::SomeEffect {
        effects.signal(feedback);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::effects::tests::Recorder;

    /// Records every key and answers with a fixed result.
    #[derive(Default)]
    pub(crate) struct KeyLog {
        pub sent: Vec<(i32, i32, i32)>,
        pub answer: Option<KeyResult>,
    }

    impl KeySink for KeyLog {
        fn send_key(&mut self, x: i32, y: i32, code: i32) -> KeyResult {
            self.sent.push((x, y, code));
            self.answer.unwrap_or(KeyResult::SomeEffect)
        }
    }

    fn codes(log: &KeyLog) -> Vec<i32> {
        log.sent.iter().map(|k| k.2).collect()
    }

    fn arrows(reverse: bool) -> ControlConfig {
        ControlConfig::new("Move", PressAction::ArrowKeys {
            modifier: 0,
            reverse,
        })
    }

    const LONG: Duration = Duration::from_millis(500);

    #[test]
    fn test_tap_sends_down_then_up() {
        let mut t = TapTranslator::new(ControlConfig::default(), 20.0, LONG);
        let (mut keys, mut fx) = (KeyLog::default(), Recorder::default());
        let t0 = Instant::now();
        t.touch_down(Vec2::new(12.0, 34.0), t0);
        t.touch_up(Vec2::new(12.0, 34.0), t0 + Duration::from_millis(100), &mut keys, &mut fx);
        assert_eq!(keys.sent, vec![(12, 34, LEFT_BUTTON), (12, 34, LEFT_RELEASE)]);
        assert_eq!(fx.events(), vec![Feedback::ShortPress; 2]);
        assert!(!t.is_touching());
    }

    #[test]
    fn test_long_press_switches_binding() {
        let mut t = TapTranslator::new(ControlConfig::default(), 20.0, LONG);
        let (mut keys, mut fx) = (KeyLog::default(), Recorder::default());
        let t0 = Instant::now();
        t.touch_down(Vec2::new(5.0, 5.0), t0);
        t.poll(t0 + Duration::from_millis(499), &mut keys, &mut fx);
        assert!(keys.sent.is_empty());
        t.poll(t0 + LONG, &mut keys, &mut fx);
        assert_eq!(codes(&keys), [RIGHT_BUTTON]);
        t.touch_up(Vec2::new(5.0, 5.0), t0 + Duration::from_secs(1), &mut keys, &mut fx);
        assert_eq!(codes(&keys), [RIGHT_BUTTON, RIGHT_RELEASE]);
        assert_eq!(fx.events(), vec![Feedback::LongPress; 2]);
    }

    #[test]
    fn test_up_after_timeout_fires_long_press() {
        let mut t = TapTranslator::new(ControlConfig::default(), 20.0, LONG);
        let (mut keys, mut fx) = (KeyLog::default(), Recorder::default());
        let t0 = Instant::now();
        t.touch_down(Vec2::ZERO, t0);
        t.touch_up(Vec2::ZERO, t0 + Duration::from_millis(800), &mut keys, &mut fx);
        assert_eq!(codes(&keys), [RIGHT_BUTTON, RIGHT_RELEASE]);
    }

    #[test]
    fn test_move_cancels_long_press_and_drags() {
        let mut t = TapTranslator::new(ControlConfig::default(), 20.0, LONG);
        let (mut keys, mut fx) = (KeyLog::default(), Recorder::default());
        let t0 = Instant::now();
        t.touch_down(Vec2::ZERO, t0);
        let ms = |n| t0 + Duration::from_millis(n);
        t.touch_move(Vec2::new(3.0, 0.0), 1, ms(50), &mut keys, &mut fx);
        t.touch_move(Vec2::new(6.0, 0.0), 1, ms(600), &mut keys, &mut fx);
        t.touch_move(Vec2::new(9.0, 0.0), 1, ms(700), &mut keys, &mut fx);
        t.touch_up(Vec2::new(9.0, 0.0), ms(900), &mut keys, &mut fx);
        assert_eq!(codes(&keys), [LEFT_BUTTON, LEFT_DRAG, LEFT_DRAG, LEFT_RELEASE]);
        assert_eq!(keys.sent[3], (9, 0, LEFT_RELEASE));
    }

    #[test]
    fn test_multi_touch_moves_ignored() {
        let mut t = TapTranslator::new(ControlConfig::default(), 20.0, LONG);
        let (mut keys, mut fx) = (KeyLog::default(), Recorder::default());
        let t0 = Instant::now();
        t.touch_down(Vec2::ZERO, t0);
        t.touch_move(Vec2::new(30.0, 0.0), 2, t0, &mut keys, &mut fx);
        assert!(keys.sent.is_empty());

        t.set_single_finger_nav(true);
        t.touch_move(Vec2::new(30.0, 0.0), 1, t0, &mut keys, &mut fx);
        assert!(keys.sent.is_empty());
    }

    #[test]
    fn test_release_goes_to_lift_point() {
        let mut t = TapTranslator::new(ControlConfig::default(), 20.0, LONG);
        let (mut keys, mut fx) = (KeyLog::default(), Recorder::default());
        let t0 = Instant::now();
        t.touch_down(Vec2::new(10.0, 10.0), t0);
        t.touch_up(Vec2::new(14.0, 12.0), t0 + Duration::from_millis(60), &mut keys, &mut fx);
        assert_eq!(keys.sent, vec![(10, 10, LEFT_BUTTON), (14, 12, LEFT_RELEASE)]);
    }

    #[test]
    fn test_ignored_move_still_cancels_long_press() {
        for (touches, nav) in [(1, true), (2, false)] {
            let mut t = TapTranslator::new(ControlConfig::default(), 20.0, LONG);
            t.set_single_finger_nav(nav);
            let (mut keys, mut fx) = (KeyLog::default(), Recorder::default());
            let t0 = Instant::now();
            t.touch_down(Vec2::ZERO, t0);
            t.touch_move(Vec2::new(4.0, 0.0), touches, t0 + Duration::from_millis(100), &mut keys, &mut fx);
            t.poll(t0 + Duration::from_millis(600), &mut keys, &mut fx);
            assert!(keys.sent.is_empty());
            t.touch_up(Vec2::new(4.0, 0.0), t0 + Duration::from_millis(700), &mut keys, &mut fx);
            assert_eq!(codes(&keys), [LEFT_BUTTON, LEFT_RELEASE]);
        }
    }

    #[test]
    fn test_arrow_drag_emits_per_tile_and_keeps_remainder() {
        let mut t = TapTranslator::new(arrows(false), 20.0, LONG);
        let (mut keys, mut fx) = (KeyLog::default(), Recorder::default());
        let t0 = Instant::now();
        t.touch_down(Vec2::new(100.0, 100.0), t0);
        t.touch_move(Vec2::new(147.0, 100.0), 1, t0, &mut keys, &mut fx);
        assert_eq!(keys.sent, vec![(-1, -1, CURSOR_RIGHT); 2]);
        assert_eq!(t.carry(), Some(Vec2::new(7.0, 0.0)));

        // Remainder counts toward the next crossing.
        t.touch_move(Vec2::new(160.0, 100.0), 1, t0, &mut keys, &mut fx);
        assert_eq!(codes(&keys).len(), 3);
        assert_eq!(t.carry(), Some(Vec2::ZERO));

        // Never an up in arrow mode.
        t.touch_up(Vec2::new(160.0, 100.0), t0, &mut keys, &mut fx);
        assert_eq!(codes(&keys).len(), 3);
    }

    #[test]
    fn test_arrow_drag_reversed_with_modifier() {
        let control = ControlConfig::new("Slide", PressAction::ArrowKeys {
            modifier: MOD_SHFT,
            reverse: true,
        });
        let mut t = TapTranslator::new(control, 10.0, LONG);
        let (mut keys, mut fx) = (KeyLog::default(), Recorder::default());
        let t0 = Instant::now();
        t.touch_down(Vec2::ZERO, t0);
        t.touch_move(Vec2::new(0.0, -25.0), 1, t0, &mut keys, &mut fx);
        assert_eq!(codes(&keys), [CURSOR_DOWN | MOD_SHFT; 2]);
        assert_eq!(t.carry(), Some(Vec2::new(0.0, -5.0)));
    }

    #[test]
    fn test_long_press_into_arrow_mode_sends_nothing() {
        let control = ControlConfig::default().with_long_press(PressAction::ArrowKeys {
            modifier: 0,
            reverse: false,
        });
        let mut t = TapTranslator::new(control, 20.0, LONG);
        let (mut keys, mut fx) = (KeyLog::default(), Recorder::default());
        let t0 = Instant::now();
        t.touch_down(Vec2::ZERO, t0);
        t.poll(t0 + LONG, &mut keys, &mut fx);
        assert!(keys.sent.is_empty());
        t.touch_move(Vec2::new(-20.0, 0.0), 1, t0 + LONG, &mut keys, &mut fx);
        assert_eq!(codes(&keys), [CURSOR_LEFT]);
        assert_eq!(fx.events(), vec![Feedback::LongPress]);
    }

    #[test]
    fn test_no_effect_means_no_feedback() {
        let mut t = TapTranslator::new(ControlConfig::default(), 20.0, LONG);
        let mut keys = KeyLog {
            answer: Some(KeyResult::NoEffect),
            ..Default::default()
        };
        let mut fx = Recorder::default();
        let t0 = Instant::now();
        t.touch_down(Vec2::ZERO, t0);
        t.touch_up(Vec2::ZERO, t0, &mut keys, &mut fx);
        assert_eq!(keys.sent.len(), 2);
        assert!(fx.events().is_empty());
    }
}
