use crate::shared::frame::Frame;
use crate::shared::line_segment::AngledSegment;

/// Domain interface for drawing detected segments and their angle labels.
///
/// Drawing happens in place. Anything falling outside the frame is clipped;
/// painting never changes the frame's dimensions.
pub trait OverlayPainter: Send + Sync {
    fn paint(&self, frame: &mut Frame, segments: &[AngledSegment]);
}
