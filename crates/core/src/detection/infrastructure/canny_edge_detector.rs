use image::GrayImage;

use crate::detection::domain::edge_detector::EdgeDetector;
use crate::shared::constants::{CANNY_HIGH_THRESHOLD, CANNY_LOW_THRESHOLD};

/// Canny edge detection with hysteresis thresholds, backed by `imageproc`.
///
/// `imageproc::edges::canny` smooths its input with its own Gaussian
/// (σ = 1.4) before taking gradients, so this stacks on top of any blur the
/// caller already applied. Low `blur_amount` values therefore change the edge
/// map less than the raw sigma suggests.
pub struct CannyEdgeDetector {
    low_threshold: f32,
    high_threshold: f32,
}

impl CannyEdgeDetector {
    pub fn new(low_threshold: f32, high_threshold: f32) -> Self {
        debug_assert!(low_threshold <= high_threshold);
        Self {
            low_threshold,
            high_threshold,
        }
    }
}

impl Default for CannyEdgeDetector {
    fn default() -> Self {
        Self::new(CANNY_LOW_THRESHOLD, CANNY_HIGH_THRESHOLD)
    }
}

impl EdgeDetector for CannyEdgeDetector {
    fn detect_edges(&self, gray: &GrayImage) -> GrayImage {
        if gray.width() == 0 || gray.height() == 0 {
            return gray.clone();
        }
        imageproc::edges::canny(gray, self.low_threshold, self.high_threshold)
    }
}
