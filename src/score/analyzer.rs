//! Frame -> score transform: contrast stretch, then a thresholded
//! neighbour-difference edge map.

use std::sync::Arc;

use image::{GrayImage, Luma};

use super::ScoreBuffer;
use crate::error::ScoreError;
use crate::params::ScoreConfig;

/// Remap the frame's observed [min, max] intensity range onto [0, 255].
///
/// A uniform frame has no range to stretch and is returned unchanged.
pub fn contrast_stretch(frame: &GrayImage) -> GrayImage {
    let raw = frame.as_raw();
    let (min, max) = raw
        .iter()
        .fold((u8::MAX, u8::MIN), |(lo, hi), &p| (lo.min(p), hi.max(p)));
    if max <= min {
        return frame.clone();
    }

    let range = (max - min) as u32;
    let stretched = raw
        .iter()
        .map(|&p| ((p - min) as u32 * 255 / range) as u8)
        .collect();
    // Same dimensions as the input, so the buffer length always matches.
    GrayImage::from_raw(frame.width(), frame.height(), stretched)
        .unwrap_or_else(|| frame.clone())
}

/// Edge-map generator for the score
#[derive(Debug, Clone)]
pub struct ScoreAnalyzer {
    threshold: u8,
    gain: u32,
    background: u8,
}

impl ScoreAnalyzer {
    pub fn new(config: &ScoreConfig) -> Self {
        Self {
            threshold: config.edge_threshold,
            gain: config.edge_gain,
            background: config.background,
        }
    }

    /// Run one analysis pass of `frame` into `score` and return the freshly
    /// built normalized array, ready to publish.
    pub fn analyze(
        &self,
        frame: &GrayImage,
        score: &mut ScoreBuffer,
    ) -> Result<Arc<Vec<f32>>, ScoreError> {
        if frame.dimensions() != (score.width(), score.height()) {
            return Err(ScoreError::DimensionMismatch {
                expected_w: score.width(),
                expected_h: score.height(),
                actual_w: frame.width(),
                actual_h: frame.height(),
            });
        }

        let stretched = contrast_stretch(frame);
        score.replace(self.difference_map(&stretched))?;
        Ok(score.shared_normalized())
    }

    /// Thresholded difference map of an (already stretched) frame.
    ///
    /// A pixel is an edge when its right or lower neighbour differs by more
    /// than the threshold; edge pixels get `min(255, (hdiff + vdiff) * gain)`,
    /// everything else the background. The last row and column have no
    /// neighbour and are always background.
    pub fn difference_map(&self, frame: &GrayImage) -> GrayImage {
        let (width, height) = frame.dimensions();
        let mut out = GrayImage::from_pixel(width, height, Luma([self.background]));
        let pixels = frame.as_raw();
        let w = width as usize;
        let threshold = self.threshold as i32;

        for y in 0..height.saturating_sub(1) as usize {
            let row = y * w;
            for x in 0..w.saturating_sub(1) {
                let here = pixels[row + x] as i32;
                let hdiff = (pixels[row + x + 1] as i32 - here).abs();
                let vdiff = (pixels[row + w + x] as i32 - here).abs();
                if hdiff > threshold || vdiff > threshold {
                    let value = ((hdiff + vdiff) as u32 * self.gain).min(255) as u8;
                    out.put_pixel(x as u32, y as u32, Luma([value]));
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> ScoreAnalyzer {
        ScoreAnalyzer::new(&ScoreConfig::default())
    }

    /// Left half `base`, right half `base + step`
    fn vertical_step(width: u32, height: u32, base: u8, step: u8) -> GrayImage {
        GrayImage::from_fn(width, height, |x, _| {
            if x < width / 2 {
                Luma([base])
            } else {
                Luma([base + step])
            }
        })
    }

    #[test]
    fn test_step_above_threshold_marks_edge() {
        let frame = vertical_step(8, 4, 100, 12);
        let map = analyzer().difference_map(&frame);
        let edge_x = 8 / 2 - 1;
        for y in 0..3 {
            for x in 0..8 {
                let expected = if x == edge_x { 120 } else { 255 };
                assert_eq!(map.get_pixel(x, y)[0], expected, "({}, {})", x, y);
            }
        }
    }

    #[test]
    fn test_step_at_or_below_threshold_is_background() {
        for step in [1, 5, 10] {
            let map = analyzer().difference_map(&vertical_step(8, 4, 100, step));
            assert!(map.as_raw().iter().all(|&p| p == 255), "step {}", step);
        }
    }

    #[test]
    fn test_edge_value_saturates() {
        let map = analyzer().difference_map(&vertical_step(8, 4, 0, 200));
        assert_eq!(map.get_pixel(3, 0)[0], 255);
        let map = analyzer().difference_map(&vertical_step(8, 4, 0, 25));
        assert_eq!(map.get_pixel(3, 0)[0], 250);
    }

    #[test]
    fn test_horizontal_and_vertical_differences_add() {
        // Single bright pixel at (1, 1): pixel (1, 0) sees vdiff, (0, 1) sees hdiff
        let mut frame = GrayImage::from_pixel(4, 4, Luma([50]));
        frame.put_pixel(1, 1, Luma([62]));
        let map = analyzer().difference_map(&frame);
        assert_eq!(map.get_pixel(1, 0)[0], 120);
        assert_eq!(map.get_pixel(0, 1)[0], 120);
        // The bright pixel itself differs from both neighbours
        assert_eq!(map.get_pixel(1, 1)[0], 240);
        assert_eq!(map.get_pixel(0, 0)[0], 255);
    }

    #[test]
    fn test_border_is_background() {
        // Checkerboard: every interior pixel is an edge
        let frame = GrayImage::from_fn(6, 5, |x, y| Luma([if (x + y) % 2 == 0 { 0 } else { 12 }]));
        let map = analyzer().difference_map(&frame);
        for x in 0..6 {
            assert_eq!(map.get_pixel(x, 4)[0], 255);
        }
        for y in 0..5 {
            assert_eq!(map.get_pixel(5, y)[0], 255);
        }
        assert_eq!(map.get_pixel(0, 0)[0], 240);
    }

    #[test]
    fn test_contrast_stretch_spans_full_range() {
        let frame = GrayImage::from_raw(4, 1, vec![100, 110, 120, 150]).unwrap();
        let stretched = contrast_stretch(&frame);
        assert_eq!(stretched.as_raw(), &vec![0, 51, 102, 255]);
    }

    #[test]
    fn test_uniform_frame_degrades_to_background() {
        let frame = GrayImage::from_pixel(16, 12, Luma([77]));
        assert_eq!(contrast_stretch(&frame), frame);

        let mut score = ScoreBuffer::new(16, 12, 0);
        let array = analyzer().analyze(&frame, &mut score).unwrap();
        assert!(score.grid().as_raw().iter().all(|&p| p == 255));
        assert!(array.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_analyze_output_matches_grid() {
        let frame = GrayImage::from_fn(32, 24, |x, y| Luma([((x * 7 + y * 13) % 256) as u8]));
        let mut score = ScoreBuffer::new(32, 24, 255);
        let array = analyzer().analyze(&frame, &mut score).unwrap();
        assert_eq!(array.len(), 32 * 24);
        for (&sample, &value) in score.grid().as_raw().iter().zip(array.iter()) {
            assert_eq!(value, (255 - sample) as f32 / 255.0);
        }
    }

    #[test]
    fn test_analyze_overwrites_stale_border() {
        let mut score = ScoreBuffer::new(8, 8, 0);
        let frame = GrayImage::from_fn(8, 8, |x, _| Luma([(x * 30) as u8]));
        analyzer().analyze(&frame, &mut score).unwrap();
        assert_eq!(score.grid().get_pixel(7, 3)[0], 255);
        assert_eq!(score.grid().get_pixel(3, 7)[0], 255);
    }

    #[test]
    fn test_analyze_rejects_wrong_frame_size() {
        let mut score = ScoreBuffer::new(8, 8, 255);
        let err = analyzer()
            .analyze(&GrayImage::new(4, 4), &mut score)
            .unwrap_err();
        assert!(matches!(err, ScoreError::DimensionMismatch { .. }));
    }
}
