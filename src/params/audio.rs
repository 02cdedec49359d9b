//! Audio engine configuration and constants.

use crate::error::ConfigError;

/// Audio engine configuration
#[derive(Debug, Clone)]
pub struct AudioConfig {
    /// Audio sample rate (Hz)
    pub sample_rate_hz: usize,

    /// Synthesis blocks per device buffer
    /// 8 * 64 = buffer length of 512 frames
    pub ticks_per_buffer: usize,

    /// Countdown the patch starts from before capture (seconds)
    pub wait_seconds: u32,

    /// Seconds between direction re-evaluations of each lane during sonification
    pub lane_step_s: f32,

    /// Lowest lane pitch (Hz); score density raises it by up to two octaves
    pub base_pitch_hz: f32,

    /// Pixels skipped between samples when profiling a score column
    pub profile_stride: usize,

    /// Columns with less mean density than this are silent and their player idles
    pub silence_density: f32,

    /// Amplitude of a lane just above the silence threshold
    pub voice_floor: f32,

    /// Amplitude added at full column density
    pub voice_gain: f32,

    /// Extra amplitude a lane gets for one step after one of its collisions
    pub hit_boost: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 44100,
            ticks_per_buffer: 8,
            wait_seconds: 10,
            lane_step_s: 0.5,
            base_pitch_hz: 110.0,
            profile_stride: 4,
            silence_density: 0.01,
            voice_floor: 0.05,
            voice_gain: 0.15,
            hit_boost: 0.2,
        }
    }
}

impl AudioConfig {
    /// Device buffer length in frames
    pub fn buffer_frames(&self) -> usize {
        audio_constants::BLOCK_SIZE * self.ticks_per_buffer
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate_hz == 0 {
            return Err(ConfigError::Zero {
                name: "sample rate",
            });
        }
        if self.ticks_per_buffer == 0 {
            return Err(ConfigError::Zero {
                name: "ticks per buffer",
            });
        }
        if self.lane_step_s <= 0.0 {
            return Err(ConfigError::Zero { name: "lane step" });
        }
        if self.profile_stride == 0 {
            return Err(ConfigError::Zero {
                name: "profile stride",
            });
        }
        Ok(())
    }
}

/// Audio constants (compile-time, match synthesis engine setup)
pub mod audio_constants {
    /// Synthesis block size (frames per engine tick)
    pub const BLOCK_SIZE: usize = 64;

    /// Output channel count (stereo)
    pub const CHANNELS: usize = 2;

    /// Name of the array the score is published under
    pub const IMAGE_ARRAY: &str = "imageData";

    /// Channel the session sends on
    pub const FROM_SESSION: &str = "fromOF";

    /// Channel the session subscribes to
    pub const TO_SESSION: &str = "toOF";
}
