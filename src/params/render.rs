//! Window and frame-source configuration.

use std::path::PathBuf;

/// Rendering configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Window width (pixels)
    pub window_width: u32,

    /// Window height (pixels)
    pub window_height: u32,

    pub title: String,

    /// Tint over the trigger band in `Wait` (RGBA, straight alpha)
    pub band_rgba: [u8; 4],

    /// Countdown pip edge length (pixels)
    pub pip_size_px: f32,

    /// Space between countdown pips (pixels)
    pub pip_gap_px: f32,

    /// Countdown pip colour (RGBA)
    pub pip_rgba: [u8; 4],

    /// Stroke width of collision rings (pixels)
    pub ring_thickness_px: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window_width: 1024,
            window_height: 768,
            title: "Sonoscore".to_string(),
            band_rgba: [0, 0, 200, 100],
            pip_size_px: 12.0,
            pip_gap_px: 8.0,
            pip_rgba: [255, 255, 255, 230],
            ring_thickness_px: 3.0,
        }
    }
}

/// Where Wait-mode frames come from
#[derive(Debug, Clone, PartialEq)]
pub enum CameraPreset {
    /// Synthetic drifting noise scene (no capture hardware needed)
    Noise(NoiseCamera),
    /// A single still image, re-read into every Wait tick
    Image(PathBuf),
}

/// Synthetic camera parameters
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseCamera {
    /// Perlin noise seed
    pub seed: u32,

    /// Spatial frequency (cycles per pixel)
    pub frequency: f64,

    /// Scene drift per frame (noise-space units)
    pub drift_per_frame: f64,
}

impl Default for NoiseCamera {
    fn default() -> Self {
        Self {
            seed: 42,
            frequency: 0.01,
            drift_per_frame: 0.01,
        }
    }
}
