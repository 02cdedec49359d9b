//! Error types, one enum per concern.
//!
//! Only [`InitError`] is fatal: it is what the binary reports before the
//! session ever reaches `Wait`. Everything else is logged and absorbed on the
//! tick that produced it.

use thiserror::Error;

/// Invalid configuration values
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("canvas must be at least 2x2 pixels, got {width}x{height}")]
    CanvasTooSmall { width: u32, height: u32 },

    #[error("fade step must be in (0, 1], got {0}")]
    FadeStep(f32),

    #[error("player roster must not be empty")]
    EmptyRoster,

    #[error("player {index} cell size {cell_size} does not fit a {width}x{height} canvas")]
    CellSize {
        index: usize,
        cell_size: u32,
        width: u32,
        height: u32,
    },

    #[error("collision lifetime must be at least one tick")]
    CollisionLifetime,

    #[error("{name} must be > 0")]
    Zero { name: &'static str },
}

/// Score analysis failures
#[derive(Debug, Error, PartialEq)]
pub enum ScoreError {
    #[error("frame is {actual_w}x{actual_h}, score grid is {expected_w}x{expected_h}")]
    DimensionMismatch {
        expected_w: u32,
        expected_h: u32,
        actual_w: u32,
        actual_h: u32,
    },
}

/// Malformed inbound messages from the audio engine
#[derive(Debug, Error, PartialEq)]
pub enum MessageError {
    #[error("message on unsubscribed channel '{0}'")]
    UnknownChannel(String),

    #[error("unknown selector '{0}'")]
    UnknownSelector(String),

    #[error("'{selector}' expects {expected} arguments, got {actual}")]
    Arity {
        selector: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("argument {position} of '{selector}' must be a {expected}")]
    AtomKind {
        selector: &'static str,
        position: usize,
        expected: &'static str,
    },

    #[error("non-finite number in argument {position} of '{selector}'")]
    NotFinite {
        selector: &'static str,
        position: usize,
    },

    #[error("negative countdown {0}")]
    NegativeCountdown(f32),

    #[error("player index {index} out of range (roster has {len})")]
    PlayerIndex { index: f32, len: usize },

    #[error("unknown player field '{0}'")]
    PlayerField(String),
}

/// Frame acquisition failures
#[derive(Debug, Error)]
pub enum CameraError {
    #[error("failed to load image {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("no image path given for the still-image source")]
    MissingPath,
}

/// Audio engine failures
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no audio output device found")]
    NoDevice,

    #[error("failed to get audio config: {0}")]
    Config(String),

    #[error("failed to build audio stream: {0}")]
    BuildStream(String),

    #[error("failed to start audio stream: {0}")]
    PlayStream(String),

    #[error("synthesis engine init failed: {0}")]
    Synthesis(String),

    #[error("unknown array '{0}'")]
    UnknownArray(String),

    #[error("array '{name}' has {got} samples, expected {expected}")]
    ArrayLength {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("audio engine is no longer receiving messages")]
    Disconnected,
}

/// GPU presentation failures
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to create surface: {0}")]
    Surface(String),

    #[error("failed to find suitable GPU adapter")]
    Adapter,

    #[error("failed to request device: {0}")]
    Device(String),

    #[error("failed to create window: {0}")]
    Window(String),
}

/// Fatal startup failures: the session never enters `Wait`
#[derive(Debug, Error)]
pub enum InitError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("camera unavailable: {0}")]
    Camera(#[from] CameraError),

    #[error("audio engine unavailable: {0}")]
    Audio(#[from] AudioError),

    #[error("renderer unavailable: {0}")]
    Render(#[from] RenderError),
}
