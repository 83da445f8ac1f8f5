//! Feedback signals for haptics and sound
//!
//! The interaction layer only says *that* a press had an effect; whether
//! anything buzzes or clicks is up to the sink the host plugs in.

/// Feedback event kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    /// A short press changed the puzzle
    ShortPress,
    /// A long press changed the puzzle
    LongPress,
    /// A keyboard or button command changed the puzzle
    Command,
}

/// Receiver of feedback events.
pub trait EffectsSink {
    fn signal(&mut self, feedback: Feedback);
}

/// Sink that only logs. Used when the host has nothing better.
#[derive(Debug, Default)]
pub struct LogEffects;

impl EffectsSink for LogEffects {
    fn signal(&mut self, feedback: Feedback) {
        log::debug!("feedback: {:?}", feedback);
    }
}

/// Forwards feedback to an inner sink when the user has it enabled.
pub struct FeedbackGate {
    inner: Box<dyn EffectsSink>,
    haptics: bool,
    sound: bool,
}

impl FeedbackGate {
    pub fn new(inner: Box<dyn EffectsSink>, haptics: bool, sound: bool) -> Self {
        Self {
            inner,
            haptics,
            sound,
        }
    }

    pub fn set_haptics(&mut self, enabled: bool) {
        self.haptics = enabled;
    }

    pub fn set_sound(&mut self, enabled: bool) {
        self.sound = enabled;
    }

    fn enabled(&self) -> bool {
        self.haptics || self.sound
    }
}

impl EffectsSink for FeedbackGate {
    fn signal(&mut self, feedback: Feedback) {
        if self.enabled() {
            self.inner.signal(feedback);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Records every signal, shareable with the test body.
    #[derive(Clone, Default)]
    pub(crate) struct Recorder(pub Arc<Mutex<Vec<Feedback>>>);

    impl Recorder {
        pub(crate) fn events(&self) -> Vec<Feedback> {
            self.0.lock().unwrap().clone()
        }
    }

    impl EffectsSink for Recorder {
        fn signal(&mut self, feedback: Feedback) {
            self.0.lock().unwrap().push(feedback);
        }
    }

    #[test]
    fn test_gate_forwards_when_enabled() {
        let rec = Recorder::default();
        let mut gate = FeedbackGate::new(Box::new(rec.clone()), true, false);
        gate.signal(Feedback::ShortPress);
        assert_eq!(rec.events(), vec![Feedback::ShortPress]);
    }

    #[test]
    fn test_gate_mutes_when_both_off() {
        let rec = Recorder::default();
        let mut gate = FeedbackGate::new(Box::new(rec.clone()), false, false);
        gate.signal(Feedback::LongPress);
        assert!(rec.events().is_empty());
        gate.set_sound(true);
        gate.signal(Feedback::LongPress);
        assert_eq!(rec.events().len(), 1);
    }
}
