//! Touch and keyboard interaction for one puzzle view
//!
//! [`InteractionEngine`] sits between the platform's raw events and the
//! engine bridge. Multi-finger gestures move the view; single touches become
//! keycodes through the active [`ControlConfig`]; keyboard keys and control
//! buttons go straight through. Every keycode is handed to a [`KeySink`].

pub mod controls;
pub mod gesture;
pub mod touch;

pub use controls::{ControlConfig, PressAction};
pub use gesture::{AxisBound, Gesture, GestureBounds, GesturePhase, GestureTracker, ViewTransform};
pub use touch::{KeySink, TapTranslator};

use std::time::{Duration, Instant};

use glam::Vec2;

use crate::coords::{CoordinateSpace, ViewMapping};
use crate::effects::{EffectsSink, Feedback, FeedbackGate};
use crate::keys::{HostKey, KeyResult, Modifiers, NO_POSITION, keycode_for};
use crate::settings::HostSettings;

pub struct InteractionEngine {
    gestures: GestureTracker,
    taps: TapTranslator,
    effects: FeedbackGate,
    mapping: ViewMapping,
    space: CoordinateSpace,
}

impl InteractionEngine {
    pub fn new(settings: &HostSettings, effects: Box<dyn EffectsSink>) -> Self {
        let mut taps = TapTranslator::new(
            ControlConfig::default(),
            1.0,
            Duration::from_millis(settings.long_press_ms),
        );
        taps.set_single_finger_nav(settings.single_finger_nav);
        Self {
            gestures: GestureTracker::new(settings.gestures, Vec2::ZERO, Vec2::ZERO),
            taps,
            effects: FeedbackGate::new(effects, settings.haptics, settings.sound),
            mapping: ViewMapping::new(Vec2::ZERO),
            space: CoordinateSpace::new(0, 0),
        }
    }

    /// Attach to a freshly started puzzle shown at `frame` view points.
    pub fn set_puzzle(&mut self, space: CoordinateSpace, tile_size: i32, frame: Vec2) {
        log::debug!(
            "interaction for {}x{} puzzle, tile {}, frame {:?}",
            space.width(),
            space.height(),
            tile_size,
            frame
        );
        self.space = space;
        self.mapping = ViewMapping::new(frame);
        self.taps.cancel();
        self.taps.set_tile_size(tile_size as f32);
        self.gestures.reset(frame, frame);
    }

    pub fn set_control(&mut self, control: ControlConfig) {
        self.taps.set_control(control);
    }

    pub fn control(&self) -> &ControlConfig {
        self.taps.control()
    }

    pub fn set_feedback(&mut self, haptics: bool, sound: bool) {
        self.effects.set_haptics(haptics);
        self.effects.set_sound(sound);
    }

    pub fn transform(&self) -> ViewTransform {
        self.gestures.transform()
    }

    pub fn phase(&self) -> GesturePhase {
        self.gestures.phase()
    }

    /// View point on screen to engine pixel, through the current zoom/pan.
    pub fn to_engine(&self, screen: Vec2) -> (i32, i32) {
        let content = self.gestures.transform().to_content(screen);
        self.mapping.to_engine(&self.space, content)
    }

    fn engine_point(&self, screen: Vec2) -> Vec2 {
        let (x, y) = self.to_engine(screen);
        Vec2::new(x as f32, y as f32)
    }

    pub fn touch_down(&mut self, screen: Vec2, now: Instant) {
        let at = self.engine_point(screen);
        self.taps.touch_down(at, now);
    }

    pub fn touch_move(&mut self, screen: Vec2, touches: usize, now: Instant, keys: &mut dyn KeySink) {
        let at = self.engine_point(screen);
        self.taps.touch_move(at, touches, now, keys, &mut self.effects);
    }

    pub fn touch_up(&mut self, screen: Vec2, now: Instant, keys: &mut dyn KeySink) {
        let at = self.engine_point(screen);
        self.taps.touch_up(at, now, keys, &mut self.effects);
    }

    /// Drive the long-press timer; call from the UI's frame or timer tick.
    pub fn poll(&mut self, now: Instant, keys: &mut dyn KeySink) {
        self.taps.poll(now, keys, &mut self.effects);
    }

    pub fn pan_began(&mut self, anchor: Vec2) {
        self.taps.cancel();
        self.gestures.begin(Gesture::Pan, anchor);
    }

    pub fn pan_changed(&mut self, translation: Vec2) {
        self.gestures.pan_to(translation);
    }

    pub fn pan_ended(&mut self) {
        self.gestures.end(Gesture::Pan);
    }

    pub fn pinch_began(&mut self, anchor: Vec2) {
        self.taps.cancel();
        self.gestures.begin(Gesture::Zoom, anchor);
    }

    pub fn pinch_changed(&mut self, scale: f32) {
        self.gestures.pinch_to(scale);
    }

    pub fn pinch_ended(&mut self) {
        self.gestures.end(Gesture::Zoom);
    }

    /// Fire a button control's command key, if it has one.
    pub fn press_control(&mut self, control: &ControlConfig, keys: &mut dyn KeySink) -> Option<KeyResult> {
        let code = control.command?;
        Some(self.send_command(code, keys))
    }

    /// Returns true when the engine reacted to the key.
    pub fn host_key(&mut self, key: HostKey, modifiers: Modifiers, keys: &mut dyn KeySink) -> bool {
        match keycode_for(key, modifiers) {
            Some(code) => self.send_command(code, keys) == KeyResult::SomeEffect,
            None => false,
        }
    }

    fn send_command(&mut self, code: i32, keys: &mut dyn KeySink) -> KeyResult {
        let result = keys.send_key(NO_POSITION.0, NO_POSITION.1, code);
        if result == KeyResult::SomeEffect {
            self.effects.signal(Feedback::Command);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::tests::Recorder;
    use crate::input::touch::tests::KeyLog;
    use crate::keys::*;

    fn engine(rec: &Recorder) -> InteractionEngine {
        let settings = HostSettings::default();
        let mut e = InteractionEngine::new(&settings, Box::new(rec.clone()));
        // 200 engine pixels shown in a 100 point frame.
        e.set_puzzle(CoordinateSpace::new(200, 200), 40, Vec2::splat(100.0));
        e
    }

    #[test]
    fn test_touch_maps_through_frame() {
        let rec = Recorder::default();
        let mut e = engine(&rec);
        let mut keys = KeyLog::default();
        let now = Instant::now();
        e.touch_down(Vec2::new(10.0, 20.0), now);
        e.touch_up(Vec2::new(12.0, 20.0), now, &mut keys);
        assert_eq!(keys.sent, vec![(20, 40, LEFT_BUTTON), (24, 40, LEFT_RELEASE)]);
        assert_eq!(rec.events(), vec![Feedback::ShortPress; 2]);
    }

    #[test]
    fn test_touch_maps_through_zoom() {
        let rec = Recorder::default();
        let mut e = engine(&rec);
        e.pinch_began(Vec2::ZERO);
        e.pinch_changed(2.0);
        e.pinch_ended();
        assert_eq!(e.phase(), GesturePhase::Idle);
        assert_eq!(e.to_engine(Vec2::new(50.0, 50.0)), (50, 50));
    }

    #[test]
    fn test_gesture_start_cancels_touch() {
        let rec = Recorder::default();
        let mut e = engine(&rec);
        let mut keys = KeyLog::default();
        let now = Instant::now();
        e.touch_down(Vec2::new(10.0, 10.0), now);
        e.pan_began(Vec2::new(10.0, 10.0));
        e.pan_changed(Vec2::new(5.0, 0.0));
        e.touch_up(Vec2::new(15.0, 10.0), now, &mut keys);
        assert!(keys.sent.is_empty());
        assert_eq!(e.transform().offset, Vec2::new(5.0, 0.0));
        e.pan_ended();
    }

    #[test]
    fn test_control_button_command() {
        let rec = Recorder::default();
        let mut e = engine(&rec);
        let mut keys = KeyLog::default();
        let result = e.press_control(&ControlConfig::clear_button(), &mut keys);
        assert_eq!(result, Some(KeyResult::SomeEffect));
        assert_eq!(keys.sent, vec![(-1, -1, CLEAR_KEY)]);
        assert_eq!(rec.events(), vec![Feedback::Command]);
        assert_eq!(e.press_control(&ControlConfig::default(), &mut keys), None);
    }

    #[test]
    fn test_host_key_translation() {
        let rec = Recorder::default();
        let mut e = engine(&rec);
        let mut keys = KeyLog::default();
        let mods = Modifiers {
            ctrl: false,
            shift: true,
        };
        assert!(e.host_key(HostKey::Left, mods, &mut keys));
        assert_eq!(keys.sent, vec![(-1, -1, CURSOR_LEFT | MOD_SHFT)]);
        assert!(!e.host_key(HostKey::Char('é'), Modifiers::default(), &mut keys));
    }

    #[test]
    fn test_feedback_muted_by_settings() {
        let rec = Recorder::default();
        let mut e = engine(&rec);
        e.set_feedback(false, false);
        let mut keys = KeyLog::default();
        e.press_control(&ControlConfig::marks_button(), &mut keys);
        assert!(rec.events().is_empty());
    }
}
