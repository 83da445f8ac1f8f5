//! Declarative control bindings
//!
//! A control says what a short press and (optionally) a long press on the
//! puzzle mean: either a mouse-style button triple or "emit arrow keys
//! while dragging". Controls can also be plain buttons that send one key.

use crate::keys::*;

/// What one kind of press sends to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressAction {
    /// Down on press, drag on every move, up on release.
    Mouse { down: i32, drag: i32, up: i32 },
    /// One cursor key per tile of drag distance, never an "up".
    ArrowKeys { modifier: i32, reverse: bool },
}

impl PressAction {
    pub const LEFT: Self = PressAction::Mouse {
        down: LEFT_BUTTON,
        drag: LEFT_DRAG,
        up: LEFT_RELEASE,
    };

    pub const MIDDLE: Self = PressAction::Mouse {
        down: MIDDLE_BUTTON,
        drag: MIDDLE_DRAG,
        up: MIDDLE_RELEASE,
    };

    pub const RIGHT: Self = PressAction::Mouse {
        down: RIGHT_BUTTON,
        drag: RIGHT_DRAG,
        up: RIGHT_RELEASE,
    };

    pub fn is_arrow_keys(&self) -> bool {
        matches!(self, PressAction::ArrowKeys { .. })
    }
}

/// One UI control. Immutable once built.
#[derive(Debug, Clone)]
pub struct ControlConfig {
    pub label: String,
    pub icon: Option<String>,
    pub short_press: PressAction,
    pub long_press: Option<PressAction>,
    /// Key sent when the control is a button rather than a press mode.
    pub command: Option<i32>,
    /// Shown only for games where this returns true.
    pub display_condition: Option<fn(&str) -> bool>,
}

impl Default for ControlConfig {
    /// Short press is a left click, long press a right click.
    fn default() -> Self {
        Self::new("Left Click", PressAction::LEFT).with_long_press(PressAction::RIGHT)
    }
}

impl ControlConfig {
    pub fn new(label: impl Into<String>, short_press: PressAction) -> Self {
        Self {
            label: label.into(),
            icon: None,
            short_press,
            long_press: None,
            command: None,
            display_condition: None,
        }
    }

    /// A button that sends a single key.
    pub fn button(label: impl Into<String>, key: i32) -> Self {
        Self {
            command: Some(key),
            ..Self::new(label, PressAction::LEFT)
        }
    }

    pub fn clear_button() -> Self {
        Self::button("Clear", CLEAR_KEY).with_icon("delete.left")
    }

    pub fn marks_button() -> Self {
        Self::button("Marks", MARKS_KEY).with_icon("pencil")
    }

    pub fn with_long_press(mut self, action: PressAction) -> Self {
        self.long_press = Some(action);
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_condition(mut self, condition: fn(&str) -> bool) -> Self {
        self.display_condition = Some(condition);
        self
    }

    /// Whether the control applies to the game with this id.
    pub fn visible_for(&self, game_id: &str) -> bool {
        self.display_condition.is_none_or(|f| f(game_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_left_then_right() {
        let c = ControlConfig::default();
        assert_eq!(c.label, "Left Click");
        assert_eq!(c.short_press, PressAction::LEFT);
        assert_eq!(c.long_press, Some(PressAction::RIGHT));
        assert!(c.command.is_none());
    }

    #[test]
    fn test_buttons() {
        assert_eq!(ControlConfig::clear_button().command, Some(8));
        assert_eq!(ControlConfig::marks_button().command, Some('m' as i32));
    }

    #[test]
    fn test_display_condition() {
        fn wide(id: &str) -> bool {
            id.starts_with("9")
        }
        let c = ControlConfig::new("Slide", PressAction::ArrowKeys {
            modifier: MOD_SHFT,
            reverse: false,
        })
        .with_condition(wide);
        assert!(c.visible_for("9wh:0101"));
        assert!(!c.visible_for("5:0101"));
        assert!(ControlConfig::default().visible_for("anything"));
        assert!(c.short_press.is_arrow_keys());
    }
}
