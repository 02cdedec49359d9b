//! Parameter definitions with units and documented semantics.
//!
//! All magic numbers are extracted here with:
//! - Units (pixels, ticks, seconds, Hz)
//! - Documented ranges and meanings
//! - A `validate()` per concern

mod audio;
mod render;
mod score;
mod session;

// Re-export all types
pub use audio::{audio_constants, AudioConfig};
pub use render::{CameraPreset, NoiseCamera, RenderConfig};
pub use score::ScoreConfig;
pub use session::{PlayerColor, PlayerRosterConfig, PlayerSpec, SessionConfig};
