use image::GrayImage;

use crate::shared::line_segment::LineSegment;

/// Domain interface for extracting straight segments from an edge map.
///
/// Implementations must be deterministic: the same edge map always yields
/// the same segments in the same order.
pub trait LineDetector: Send + Sync {
    fn detect_lines(&self, edges: &GrayImage) -> Vec<LineSegment>;
}
