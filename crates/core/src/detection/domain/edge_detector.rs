use image::GrayImage;

/// Domain interface for turning a grayscale image into a binary edge map.
///
/// Edge pixels are non-zero (255); everything else is 0. The output has the
/// same dimensions as the input.
pub trait EdgeDetector: Send + Sync {
    fn detect_edges(&self, gray: &GrayImage) -> GrayImage;
}
