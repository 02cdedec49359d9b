//! Frame sources feeding the `Wait` mode.
//!
//! Every source hands out grayscale frames already at canvas resolution, so
//! the session never has to know what the capture side looks like.

use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::{GrayImage, Luma};
use noise::{NoiseFn, Perlin};

use crate::error::CameraError;
use crate::params::{CameraPreset, NoiseCamera};

/// Supplies one grayscale frame per `Wait` tick
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<GrayImage, CameraError>;

    /// Human-readable name for startup logging
    fn describe(&self) -> String;
}

/// Open the frame source selected by `preset` at `width` x `height`
pub fn open(
    preset: &CameraPreset,
    width: u32,
    height: u32,
) -> Result<Box<dyn FrameSource>, CameraError> {
    let source: Box<dyn FrameSource> = match preset {
        CameraPreset::Noise(params) => Box::new(NoiseSource::new(params.clone(), width, height)),
        CameraPreset::Image(path) => Box::new(StillImage::open(path, width, height)?),
    };
    tracing::info!(source = %source.describe(), width, height, "frame source ready");
    Ok(source)
}

/// Synthetic scene: slowly drifting 3D Perlin noise
pub struct NoiseSource {
    params: NoiseCamera,
    perlin: Perlin,
    width: u32,
    height: u32,
    frame_num: u64,
}

impl NoiseSource {
    pub fn new(params: NoiseCamera, width: u32, height: u32) -> Self {
        Self {
            perlin: Perlin::new(params.seed),
            params,
            width,
            height,
            frame_num: 0,
        }
    }
}

impl FrameSource for NoiseSource {
    fn next_frame(&mut self) -> Result<GrayImage, CameraError> {
        let t = self.frame_num as f64 * self.params.drift_per_frame;
        let freq = self.params.frequency;
        let frame = GrayImage::from_fn(self.width, self.height, |x, y| {
            let n = self.perlin.get([x as f64 * freq, y as f64 * freq, t]);
            // Perlin output is roughly [-1, 1]
            Luma([((n * 0.5 + 0.5).clamp(0.0, 1.0) * 255.0) as u8])
        });
        self.frame_num += 1;
        Ok(frame)
    }

    fn describe(&self) -> String {
        format!("noise (seed {})", self.params.seed)
    }
}

/// A still image, loaded once and scaled to the canvas
pub struct StillImage {
    path: PathBuf,
    frame: GrayImage,
}

impl StillImage {
    pub fn open(path: &Path, width: u32, height: u32) -> Result<Self, CameraError> {
        if path.as_os_str().is_empty() {
            return Err(CameraError::MissingPath);
        }
        let image = image::open(path).map_err(|source| CameraError::Load {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::from_gray(path, image.to_luma8(), width, height))
    }

    /// Scale an already decoded grayscale image to the canvas
    pub fn from_gray(path: &Path, gray: GrayImage, width: u32, height: u32) -> Self {
        let frame = if gray.dimensions() == (width, height) {
            gray
        } else {
            imageops::resize(&gray, width, height, FilterType::Triangle)
        };
        Self {
            path: path.to_path_buf(),
            frame,
        }
    }
}

impl FrameSource for StillImage {
    fn next_frame(&mut self) -> Result<GrayImage, CameraError> {
        Ok(self.frame.clone())
    }

    fn describe(&self) -> String {
        format!("image {}", self.path.display())
    }
}
