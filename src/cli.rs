//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::params::{AudioConfig, CameraPreset, NoiseCamera, RenderConfig, ScoreConfig};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "Sonoscore")]
#[command(about = "Turns a captured frame into a playable score", long_about = None)]
pub struct Args {
    /// Frame source: noise (default) or image
    #[arg(long, value_name = "SOURCE", default_value = "noise")]
    pub source: String,

    /// Still image used by the image source
    #[arg(long, value_name = "PATH")]
    pub image: Option<PathBuf>,

    /// Countdown before capture (seconds)
    #[arg(long, value_name = "SECONDS", default_value = "10")]
    pub wait: u32,

    /// Seed for the noise source
    #[arg(long, value_name = "N", default_value = "42")]
    pub seed: u32,

    /// Canvas width (pixels)
    #[arg(long, value_name = "PIXELS", default_value = "1024")]
    pub width: u32,

    /// Canvas height (pixels)
    #[arg(long, value_name = "PIXELS", default_value = "768")]
    pub height: u32,
}

impl Args {
    /// Parse the frame source from command-line arguments
    pub fn camera_preset(&self) -> CameraPreset {
        let noise = || {
            CameraPreset::Noise(NoiseCamera {
                seed: self.seed,
                ..NoiseCamera::default()
            })
        };
        match self.source.to_lowercase().as_str() {
            "noise" => noise(),
            "image" => CameraPreset::Image(self.image.clone().unwrap_or_default()),
            other => {
                tracing::warn!(source = other, "unknown frame source, using noise");
                noise()
            }
        }
    }

    pub fn score_config(&self) -> ScoreConfig {
        ScoreConfig {
            width: self.width,
            height: self.height,
            ..ScoreConfig::default()
        }
    }

    pub fn audio_config(&self) -> AudioConfig {
        AudioConfig {
            wait_seconds: self.wait,
            ..AudioConfig::default()
        }
    }

    /// Window matches the canvas so the score is shown pixel for pixel
    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            window_width: self.width,
            window_height: self.height,
            ..RenderConfig::default()
        }
    }
}
