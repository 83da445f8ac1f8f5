//! Host settings and per-puzzle user records
//!
//! Both are plain JSON files. A missing or unreadable file is not an error:
//! defaults are used and the next save replaces it.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::consts::{DEVICE_PIXEL_RATIO, LONG_PRESS_MS, PUZZLE_SIZE};
use crate::engine::ConfigItem;
use crate::engine::config::DEFAULT_EXCLUSIONS;
use crate::error::BridgeResult;
use crate::input::GestureBounds;

/// Host behaviour the user or embedder can tune
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostSettings {
    // === Touch ===
    /// Hold time before a press becomes a long press
    pub long_press_ms: u64,
    /// One finger pans the view instead of dragging on the puzzle
    pub single_finger_nav: bool,
    /// Zoom range and overscroll fractions
    pub gestures: GestureBounds,

    // === Appearance ===
    pub dark_theme: bool,
    /// Font file for engine text, overriding the bundled one
    pub font_path: Option<PathBuf>,

    // === Feedback (forwarded, never interpreted) ===
    pub haptics: bool,
    pub sound: bool,

    // === Engine ===
    /// Canvas size requested from the engine, per side
    pub puzzle_size: i32,
    pub device_pixel_ratio: f32,
    /// Preference titles hidden from config menus
    pub config_exclusions: Vec<String>,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            long_press_ms: LONG_PRESS_MS,
            single_finger_nav: false,
            gestures: GestureBounds::default(),

            dark_theme: false,
            font_path: None,

            haptics: true,
            sound: false,

            puzzle_size: PUZZLE_SIZE,
            device_pixel_ratio: DEVICE_PIXEL_RATIO,
            config_exclusions: DEFAULT_EXCLUSIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl HostSettings {
    pub fn load(path: &Path) -> Self {
        load_json(path, "settings")
    }

    pub fn save(&self, path: &Path) -> BridgeResult<()> {
        save_json(self, path, "settings")
    }
}

/// Parameters a puzzle starts with when there is no save to resume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultParams {
    Preset(i32),
    /// Edited custom-parameters form, applied through the config codec
    Custom(Vec<ConfigItem>),
}

/// Everything stored for one puzzle kind
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PuzzleUserSettings {
    pub default_params: Option<DefaultParams>,
    /// Engine preferences text
    pub preferences: Option<String>,
    /// In-progress game to resume
    pub saved_game: Option<String>,
}

impl PuzzleUserSettings {
    pub fn load(path: &Path) -> Self {
        load_json(path, "puzzle settings")
    }

    pub fn save(&self, path: &Path) -> BridgeResult<()> {
        save_json(self, path, "puzzle settings")
    }
}

fn load_json<T: DeserializeOwned + Default>(path: &Path, what: &str) -> T {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            log::info!("No {} at {} ({}), using defaults", what, path.display(), e);
            return T::default();
        }
    };
    match serde_json::from_str(&text) {
        Ok(value) => {
            log::info!("Loaded {} from {}", what, path.display());
            value
        }
        Err(e) => {
            log::info!("Unreadable {} at {} ({}), using defaults", what, path.display(), e);
            T::default()
        }
    }
}

fn save_json<T: Serialize>(value: &T, path: &Path, what: &str) -> BridgeResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    log::info!("{} saved to {}", what, path.display());
    Ok(())
}
