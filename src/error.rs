//! Bridge error types
//!
//! Drawing callbacks never return these: they run inside the engine's own
//! call stack and degrade instead. Everything the host-facing API can fail
//! with ends up here.

use thiserror::Error;

use crate::engine::ConfigKind;

/// Errors surfaced by the host-facing bridge API.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Error text reported by the engine, shown to the user verbatim.
    #[error("{0}")]
    Engine(String),

    /// The raster for a new puzzle could not be allocated.
    #[error("cannot allocate a {width}x{height} drawing surface")]
    SurfaceAllocation {
        /// Requested width in pixels.
        width: i32,
        /// Requested height in pixels.
        height: i32,
    },

    /// A choice item's option string had no leading delimiter or no options.
    #[error("malformed choices for '{title}': {names:?}")]
    MalformedChoices {
        /// Title of the offending config item.
        title: String,
        /// The raw option string.
        names: String,
    },

    /// The engine offers no config of this kind.
    #[error("no {0:?} configuration available")]
    NoConfig(ConfigKind),

    /// Preset id not present in the engine's preset menu.
    #[error("unknown preset {0}")]
    UnknownPreset(i32),

    /// Background generation was abandoned before it finished.
    #[error("game generation cancelled")]
    GenerationCancelled,

    /// Background generation gave up with an engine message.
    #[error("couldn't generate puzzle: {0}")]
    GenerationFailed(String),

    /// A generation is already running for this bridge.
    #[error("a game is already being generated")]
    GenerationInFlight,

    /// Font file could not be parsed.
    #[error("font error: {0}")]
    Font(String),

    /// No game has been started yet.
    #[error("no active game")]
    NoActiveGame,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;
