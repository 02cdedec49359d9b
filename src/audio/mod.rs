//! Audio engine boundary and the production engine behind it.
//!
//! The session only talks to an [`AudioEngine`]: it publishes whole arrays
//! and sends named messages. Replies come back through the
//! [`Inbox`](crate::messages::Inbox) the engine was built with.

mod patch;
mod synthesis;
mod system;

use std::sync::Arc;

use crate::error::AudioError;
use crate::messages::OutboundMessage;

// Re-export public types
pub use patch::{column_profile, PatchPhase, SonifyPatch};
pub use synthesis::{compose, LaneVoice};
pub use system::AudioSystem;

/// What the session needs from the synthesis engine
pub trait AudioEngine {
    /// Publish a complete named array. The engine must never observe a
    /// partially built array.
    fn write_array(&mut self, name: &str, data: Arc<Vec<f32>>) -> Result<(), AudioError>;

    /// Send a message on the session's outbound channel
    fn send(&mut self, message: OutboundMessage) -> Result<(), AudioError>;
}
