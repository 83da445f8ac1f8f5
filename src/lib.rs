//! Puzzle Host - host bridge for callback-driven puzzle engines
//!
//! Core modules:
//! - `bridge`: One active puzzle: engine handle, surface, timer, generation
//! - `renderer`: Drawing surface the engine calls into, blitters, text
//! - `input`: Gestures, touch-to-keycode translation, control bindings
//! - `engine`: The engine contract, config menus, presets, a reference engine
//! - `stream`: Byte stream behind save files and preferences
//! - `ffi`: C function-pointer table for engines built as C

pub mod bridge;
pub mod coords;
pub mod effects;
pub mod engine;
pub mod error;
pub mod ffi;
pub mod input;
pub mod keys;
pub mod renderer;
pub mod settings;
pub mod stream;

pub use bridge::EngineBridge;
pub use coords::CoordinateSpace;
pub use error::{BridgeError, BridgeResult};
pub use input::InteractionEngine;
pub use settings::{HostSettings, PuzzleUserSettings};

/// Host configuration constants
pub mod consts {
    /// Canvas size requested from the engine, per side
    pub const PUZZLE_SIZE: i32 = 1024;
    /// Device pixel ratio passed to the engine's size query
    pub const DEVICE_PIXEL_RATIO: f32 = 2.0;

    /// Hold time before a press becomes a long press
    pub const LONG_PRESS_MS: u64 = 500;

    /// Zoom bounds for the puzzle view
    pub const MIN_ZOOM: f32 = 1.0;
    pub const MAX_ZOOM: f32 = 5.0;
    /// Fraction of the viewport the puzzle may be dragged past its edge
    pub const OVERSCROLL_FRACTION: f32 = 0.5;

    /// Animation timer step (100 Hz)
    pub const FRAME_INTERVAL: f32 = 0.01;
    /// Maximum timer steps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame time fed to the timer
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Background grey offered to the engine's colour query
    pub const DEFAULT_BACKGROUND: f32 = 0.8;

    /// Generation running longer than this shows a loading state
    pub const LOADING_THRESHOLD_SECS: f32 = 0.5;
}
