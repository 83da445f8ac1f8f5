//! The puzzle engine contract
//!
//! The engine is a black box: it generates and solves puzzles, keeps the
//! game state machine, and draws by calling back into the host. The
//! bridge only ever talks to it through [`Midend`].

pub mod config;
pub mod demo;
pub mod presets;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::keys::KeyResult;
use crate::renderer::DrawingApi;
use crate::stream::{ReadSource, WriteSink};

pub use config::{ChoiceOption, ConfigItem, ConfigMenu, ConfigMenuCodec, ConfigValue};
pub use presets::{Preset, PresetList, PresetMenuEntry};

/// Game progress as the engine reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PuzzleStatus {
    InProgress,
    Solved,
    /// The player has made the puzzle impossible (e.g. lost the game).
    Unsolvable,
}

impl PuzzleStatus {
    /// Decode the engine's integer status: positive solved, negative lost.
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            0 => PuzzleStatus::InProgress,
            r if r > 0 => PuzzleStatus::Solved,
            _ => PuzzleStatus::Unsolvable,
        }
    }
}

/// Which of the engine's config forms is being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKind {
    /// Generation parameters.
    Settings,
    /// Random seed entry.
    Seed,
    /// Game ID (description) entry.
    Description,
    /// User preferences.
    Preferences,
}

impl ConfigKind {
    pub fn to_raw(self) -> i32 {
        match self {
            ConfigKind::Settings => 0,
            ConfigKind::Seed => 1,
            ConfigKind::Description => 2,
            ConfigKind::Preferences => 3,
        }
    }
}

/// Value slot of one item in the engine's config array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawConfigValue {
    /// Free text, also used for small numbers.
    String(String),
    Boolean(bool),
    /// `names` is delimiter-prefixed, e.g. `":Easy:Hard"`.
    Choices { names: String, selected: i32 },
    /// Terminates the array.
    End,
}

/// One item of the engine's flat config array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawConfigItem {
    pub title: String,
    pub value: RawConfigValue,
}

impl RawConfigItem {
    pub fn new(title: impl Into<String>, value: RawConfigValue) -> Self {
        Self {
            title: title.into(),
            value,
        }
    }

    pub fn end() -> Self {
        Self::new("", RawConfigValue::End)
    }
}

/// Config form as the engine hands it out: window title plus items,
/// terminated by an [`RawConfigValue::End`] item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawConfig {
    pub title: String,
    pub items: Vec<RawConfigItem>,
}

/// Cooperative cancellation flag shared with a background generation.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// What the engine may call on the host besides drawing.
pub trait Frontend {
    fn drawing(&mut self) -> &mut dyn DrawingApi;

    /// The engine wants periodic [`Midend::timer`] calls.
    fn activate_timer(&mut self);

    fn deactivate_timer(&mut self);
}

/// Handle to one active puzzle inside the engine.
///
/// Calls that take a [`Frontend`] may draw any number of times before
/// returning, and the raster must reflect all of it when they do.
pub trait Midend: Send {
    /// Name of the puzzle kind, as written into save files.
    fn game_name(&self) -> &str;

    /// Fresh handle of the same kind with the same parameters and no game.
    /// Used to generate off-thread without touching the live handle.
    fn fork(&self) -> Box<dyn Midend>;

    /// Generate a new game. Must check `cancel` regularly and leave the
    /// handle unusable-but-safe when it returns early.
    fn new_game(&mut self, seed: &str, cancel: &CancelToken) -> Result<(), String>;

    /// Natural drawing size for a requested canvas.
    fn size(&mut self, requested: (i32, i32), user_size: bool, device_pixel_ratio: f32) -> (i32, i32);

    fn tilesize(&self) -> i32;

    /// RGB colour table, given the host's preferred background.
    fn colours(&self, background: [f32; 3]) -> Vec<[f32; 3]>;

    /// Redraw everything from scratch.
    fn force_redraw(&mut self, fe: &mut dyn Frontend);

    fn process_key(&mut self, x: i32, y: i32, button: i32, fe: &mut dyn Frontend) -> KeyResult;

    /// Advance animation by `tplus` seconds.
    fn timer(&mut self, tplus: f32, fe: &mut dyn Frontend);

    fn restart_game(&mut self, fe: &mut dyn Frontend);

    fn solve(&mut self, fe: &mut dyn Frontend) -> Result<(), String>;

    fn status(&self) -> PuzzleStatus;

    fn can_undo(&self) -> bool;

    fn can_redo(&self) -> bool;

    fn can_solve(&self) -> bool;

    fn can_configure(&self) -> bool;

    fn wants_statusbar(&self) -> bool;

    /// Id of the preset matching the current parameters, if any.
    fn which_preset(&self) -> Option<i32>;

    fn presets(&self) -> Vec<PresetMenuEntry>;

    /// Adopt a preset's parameters for the next game. False for unknown ids.
    fn set_preset(&mut self, id: i32) -> bool;

    fn game_id(&self) -> Option<String>;

    fn random_seed(&self) -> Option<String>;

    /// `None` when the engine offers no form of this kind.
    fn get_config(&self, kind: ConfigKind) -> Option<RawConfig>;

    /// Apply an edited form. On error the engine's state is untouched.
    fn set_config(&mut self, kind: ConfigKind, items: &[RawConfigItem]) -> Result<(), String>;

    fn serialise(&self, sink: &mut dyn WriteSink);

    /// Load a save. On error the engine's state is untouched.
    fn deserialise(&mut self, source: &mut dyn ReadSource) -> Result<(), String>;

    fn save_prefs(&self, sink: &mut dyn WriteSink);

    fn load_prefs(&mut self, source: &mut dyn ReadSource) -> Result<(), String>;

    /// Name the puzzle kind a save file belongs to, reading as little as needed.
    fn identify(&self, source: &mut dyn ReadSource) -> Result<String, String>;
}
