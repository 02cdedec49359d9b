//! The score: a grayscale difference map plus its audio-ready float array.

mod analyzer;

pub use analyzer::{contrast_stretch, ScoreAnalyzer};

use std::sync::Arc;

use image::{GrayImage, Luma};

use crate::error::ScoreError;

/// Inverse-normalize one grid sample: white (255) -> 0.0, black (0) -> 1.0
#[inline]
pub fn normalize_sample(sample: u8) -> f32 {
    (255 - sample) as f32 / 255.0
}

/// Fixed-size score grid and its derived normalized array.
///
/// The array is always the element-wise [`normalize_sample`] of the grid in
/// row-major order. Both are replaced together inside one `&mut self` call,
/// so no caller ever sees one updated without the other.
#[derive(Debug, Clone)]
pub struct ScoreBuffer {
    grid: GrayImage,
    normalized: Arc<Vec<f32>>,
}

impl ScoreBuffer {
    /// Create a `width` x `height` buffer filled with `color`
    pub fn new(width: u32, height: u32, color: u8) -> Self {
        let grid = GrayImage::from_pixel(width, height, Luma([color]));
        let normalized = Arc::new(Self::derive(&grid));
        Self { grid, normalized }
    }

    /// Fill the whole grid with one base colour
    pub fn set_color(&mut self, color: u8) {
        let grid = GrayImage::from_pixel(self.grid.width(), self.grid.height(), Luma([color]));
        self.install(grid);
    }

    /// Replace the grid wholesale. The new grid must match the buffer's size.
    pub fn replace(&mut self, grid: GrayImage) -> Result<(), ScoreError> {
        if grid.dimensions() != self.grid.dimensions() {
            return Err(ScoreError::DimensionMismatch {
                expected_w: self.grid.width(),
                expected_h: self.grid.height(),
                actual_w: grid.width(),
                actual_h: grid.height(),
            });
        }
        self.install(grid);
        Ok(())
    }

    fn install(&mut self, grid: GrayImage) {
        // Build the array completely before swapping either field in.
        let normalized = Arc::new(Self::derive(&grid));
        self.grid = grid;
        self.normalized = normalized;
    }

    fn derive(grid: &GrayImage) -> Vec<f32> {
        grid.as_raw().iter().copied().map(normalize_sample).collect()
    }

    pub fn width(&self) -> u32 {
        self.grid.width()
    }

    pub fn height(&self) -> u32 {
        self.grid.height()
    }

    /// Grid for display
    pub fn grid(&self) -> &GrayImage {
        &self.grid
    }

    /// Normalized array, row-major
    pub fn normalized(&self) -> &[f32] {
        &self.normalized
    }

    /// Shared handle to the normalized array, for publishing to another thread
    pub fn shared_normalized(&self) -> Arc<Vec<f32>> {
        Arc::clone(&self.normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_normalization_holds(score: &ScoreBuffer) {
        let grid = score.grid().as_raw();
        assert_eq!(grid.len(), score.normalized().len());
        for (i, (&sample, &value)) in grid.iter().zip(score.normalized()).enumerate() {
            assert_eq!(value, (255 - sample) as f32 / 255.0, "index {}", i);
        }
    }

    #[test]
    fn test_new_buffer_is_uniform() {
        let score = ScoreBuffer::new(8, 4, 255);
        assert_eq!(score.normalized().len(), 32);
        assert!(score.normalized().iter().all(|&v| v == 0.0));
        assert_normalization_holds(&score);
    }

    #[test]
    fn test_set_color_regenerates_array() {
        let mut score = ScoreBuffer::new(4, 4, 255);
        score.set_color(0);
        assert!(score.normalized().iter().all(|&v| v == 1.0));
        assert_normalization_holds(&score);
    }

    #[test]
    fn test_replace_keeps_invariant() {
        let mut score = ScoreBuffer::new(3, 2, 255);
        let grid = GrayImage::from_raw(3, 2, vec![0, 51, 102, 153, 204, 255]).unwrap();
        score.replace(grid).unwrap();
        assert_normalization_holds(&score);
        assert_eq!(score.normalized()[1], 204.0 / 255.0);
    }

    #[test]
    fn test_replace_rejects_wrong_size() {
        let mut score = ScoreBuffer::new(3, 2, 255);
        let err = score.replace(GrayImage::new(2, 3)).unwrap_err();
        assert!(matches!(err, ScoreError::DimensionMismatch { actual_w: 2, .. }));
        // Untouched on failure
        assert!(score.normalized().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_shared_array_is_a_snapshot() {
        let mut score = ScoreBuffer::new(2, 2, 255);
        let published = score.shared_normalized();
        score.set_color(0);
        assert!(published.iter().all(|&v| v == 0.0));
        assert!(score.normalized().iter().all(|&v| v == 1.0));
    }
}
