//! Score grid and difference-transform parameters.

use crate::error::ConfigError;

/// Score grid and edge-detection configuration
#[derive(Debug, Clone)]
pub struct ScoreConfig {
    /// Installation canvas width (pixels); the score grid is this wide
    /// regardless of the camera's native resolution
    pub width: u32,

    /// Installation canvas height (pixels)
    pub height: u32,

    /// Minimum neighbour difference (0-255 scale) that counts as an edge
    pub edge_threshold: u8,

    /// Multiplier applied to (hdiff + vdiff) at edge pixels
    pub edge_gain: u32,

    /// Sample written where there is no edge, and the initial fill colour
    pub background: u8,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            width: 1024,  // 16 columns of 64 px
            height: 768,  // 12 rows of 64 px
            edge_threshold: 10,
            edge_gain: 10,
            background: 255,
        }
    }
}

impl ScoreConfig {
    /// Number of samples in the score grid (and in the published array)
    pub fn sample_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width < 2 || self.height < 2 {
            return Err(ConfigError::CanvasTooSmall {
                width: self.width,
                height: self.height,
            });
        }
        if self.edge_gain == 0 {
            return Err(ConfigError::Zero { name: "edge gain" });
        }
        Ok(())
    }
}
