//! Keypress codes understood by the engine
//!
//! A keypress is a plain integer: an ASCII character, a reserved control
//! code, or a mouse-style event that carries a coordinate.

pub const LEFT_BUTTON: i32 = 0x200;
pub const MIDDLE_BUTTON: i32 = 0x201;
pub const RIGHT_BUTTON: i32 = 0x202;
pub const LEFT_DRAG: i32 = 0x203;
pub const MIDDLE_DRAG: i32 = 0x204;
pub const RIGHT_DRAG: i32 = 0x205;
pub const LEFT_RELEASE: i32 = 0x206;
pub const MIDDLE_RELEASE: i32 = 0x207;
pub const RIGHT_RELEASE: i32 = 0x208;
pub const CURSOR_UP: i32 = 0x209;
pub const CURSOR_DOWN: i32 = 0x20a;
pub const CURSOR_LEFT: i32 = 0x20b;
pub const CURSOR_RIGHT: i32 = 0x20c;
pub const CURSOR_SELECT: i32 = 0x20d;
pub const CURSOR_SELECT2: i32 = 0x20e;
pub const UI_QUIT: i32 = 0x210;
pub const UI_NEWGAME: i32 = 0x211;
pub const UI_SOLVE: i32 = 0x212;
pub const UI_UNDO: i32 = 0x213;
pub const UI_REDO: i32 = 0x214;

pub const MOD_CTRL: i32 = 0x1000;
pub const MOD_SHFT: i32 = 0x2000;
pub const MOD_NUM_KEYPAD: i32 = 0x4000;
pub const MOD_MASK: i32 = 0x7000;

/// Backspace, used by number-entry puzzles to clear a cell.
pub const CLEAR_KEY: i32 = 8;
/// Toggles pencil marks in the puzzles that support them.
pub const MARKS_KEY: i32 = b'm' as i32;

/// Coordinate sent with events that carry no position.
pub const NO_POSITION: (i32, i32) = (-1, -1);

/// Outcome of one keypress as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyResult {
    /// The engine asked to quit.
    Quit,
    /// The key changed something.
    SomeEffect,
    /// The key was understood but did nothing.
    NoEffect,
    /// The key means nothing to this puzzle.
    Unused,
}

impl KeyResult {
    /// Decode the engine's integer result. Unknown values count as unused.
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            0 => KeyResult::Quit,
            1 => KeyResult::SomeEffect,
            2 => KeyResult::NoEffect,
            _ => KeyResult::Unused,
        }
    }

    pub fn to_raw(self) -> i32 {
        match self {
            KeyResult::Quit => 0,
            KeyResult::SomeEffect => 1,
            KeyResult::NoEffect => 2,
            KeyResult::Unused => 3,
        }
    }
}

/// Whether a code is one of the mouse-style down/drag/release codes.
pub fn is_mouse_code(code: i32) -> bool {
    (LEFT_BUTTON..=RIGHT_RELEASE).contains(&(code & !MOD_MASK))
}

/// Whether a code is one of the four cursor movement codes.
pub fn is_cursor_move(code: i32) -> bool {
    (CURSOR_UP..=CURSOR_RIGHT).contains(&(code & !MOD_MASK))
}

/// A physical key from the host keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKey {
    Up,
    Down,
    Left,
    Right,
    Return,
    Space,
    Char(char),
}

/// Modifier keys held with a [`HostKey`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Control or Command
    pub ctrl: bool,
    pub shift: bool,
}

/// Translate a host key into an engine keycode.
///
/// Returns `None` for characters outside ASCII, which no engine handles.
pub fn keycode_for(key: HostKey, modifiers: Modifiers) -> Option<i32> {
    let base = match key {
        HostKey::Up => CURSOR_UP,
        HostKey::Down => CURSOR_DOWN,
        HostKey::Left => CURSOR_LEFT,
        HostKey::Right => CURSOR_RIGHT,
        HostKey::Return => CURSOR_SELECT,
        HostKey::Space => CURSOR_SELECT2,
        HostKey::Char(c) if c.is_ascii() => c as i32,
        HostKey::Char(_) => return None,
    };

    let mut code = base;
    if modifiers.ctrl {
        code |= MOD_CTRL;
    }
    if modifiers.shift {
        code |= MOD_SHFT;
    }
    Some(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_result_raw_values() {
        assert_eq!(KeyResult::from_raw(0), KeyResult::Quit);
        assert_eq!(KeyResult::from_raw(1), KeyResult::SomeEffect);
        assert_eq!(KeyResult::from_raw(2), KeyResult::NoEffect);
        assert_eq!(KeyResult::from_raw(3), KeyResult::Unused);
        assert_eq!(KeyResult::from_raw(42), KeyResult::Unused);
        assert_eq!(KeyResult::SomeEffect.to_raw(), 1);
    }

    #[test]
    fn test_keycode_for_arrows_and_select() {
        let none = Modifiers::default();
        assert_eq!(keycode_for(HostKey::Up, none), Some(CURSOR_UP));
        assert_eq!(keycode_for(HostKey::Right, none), Some(CURSOR_RIGHT));
        assert_eq!(keycode_for(HostKey::Return, none), Some(CURSOR_SELECT));
        assert_eq!(keycode_for(HostKey::Space, none), Some(CURSOR_SELECT2));
    }

    #[test]
    fn test_keycode_for_modifiers() {
        let mods = Modifiers {
            ctrl: true,
            shift: true,
        };
        assert_eq!(
            keycode_for(HostKey::Left, mods),
            Some(CURSOR_LEFT | MOD_CTRL | MOD_SHFT)
        );
        assert_eq!(
            keycode_for(HostKey::Char('z'), Modifiers { ctrl: true, shift: false }),
            Some('z' as i32 | MOD_CTRL)
        );
    }

    #[test]
    fn test_keycode_for_non_ascii() {
        assert_eq!(keycode_for(HostKey::Char('é'), Modifiers::default()), None);
    }

    #[test]
    fn test_code_classes() {
        assert!(is_mouse_code(LEFT_BUTTON));
        assert!(is_mouse_code(RIGHT_RELEASE | MOD_SHFT));
        assert!(!is_mouse_code(CURSOR_UP));
        assert!(is_cursor_move(CURSOR_LEFT | MOD_CTRL));
        assert!(!is_cursor_move(CURSOR_SELECT));
    }
}
