use crate::shared::constants::ANGLE_THRESHOLD_DEGREES;
use crate::shared::line_segment::{AngledSegment, LineSegment};

/// Drops segments that are close to horizontal.
///
/// A segment survives when its angle from horizontal, folded into [0, 90],
/// is at least `threshold_degrees`.
#[derive(Clone, Copy, Debug)]
pub struct AngleFilter {
    threshold_degrees: f64,
}

impl AngleFilter {
    pub fn new(threshold_degrees: f64) -> Self {
        Self { threshold_degrees }
    }

    pub fn threshold_degrees(&self) -> f64 {
        self.threshold_degrees
    }

    pub fn accepts(&self, angle: f64) -> bool {
        angle >= self.threshold_degrees
    }

    /// Keeps input order.
    pub fn filter(&self, segments: &[LineSegment]) -> Vec<AngledSegment> {
        segments
            .iter()
            .map(|&segment| AngledSegment {
                segment,
                angle: segment.angle_from_horizontal(),
            })
            .filter(|s| self.accepts(s.angle))
            .collect()
    }
}

impl Default for AngleFilter {
    fn default() -> Self {
        Self::new(ANGLE_THRESHOLD_DEGREES)
    }
}
