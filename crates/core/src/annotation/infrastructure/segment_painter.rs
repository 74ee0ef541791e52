use imageproc::drawing::BresenhamLineIter;

use crate::annotation::domain::overlay_painter::OverlayPainter;
use crate::shared::constants::{LINE_COLOR_BGR, LINE_THICKNESS, TEXT_COLOR_BGR};
use crate::shared::frame::Frame;
use crate::shared::line_segment::{AngledSegment, LineSegment};

use super::glyphs::{self, GLYPH_HEIGHT, GLYPH_WIDTH};

/// Draws each segment as a thick line and writes its angle at the midpoint.
pub struct SegmentPainter {
    line_color: [u8; 3],
    text_color: [u8; 3],
    thickness: u32,
    text_scale: u32,
}

impl SegmentPainter {
    pub fn new(line_color: [u8; 3], text_color: [u8; 3], thickness: u32) -> Self {
        Self {
            line_color,
            text_color,
            thickness: thickness.max(1),
            text_scale: 1,
        }
    }

    /// Integer magnification of the label font.
    pub fn with_text_scale(mut self, scale: u32) -> Self {
        self.text_scale = scale.max(1);
        self
    }
}

impl Default for SegmentPainter {
    fn default() -> Self {
        Self::new(LINE_COLOR_BGR, TEXT_COLOR_BGR, LINE_THICKNESS)
    }
}

impl OverlayPainter for SegmentPainter {
    fn paint(&self, frame: &mut Frame, segments: &[AngledSegment]) {
        for s in segments {
            draw_thick_line(frame, &s.segment, self.line_color, self.thickness);
            let (mx, my) = s.segment.midpoint();
            draw_text(
                frame,
                &s.label(),
                (mx as i64, my as i64),
                self.text_color,
                self.text_scale,
            );
        }
    }
}

/// Stamps a `thickness`-wide square brush at every Bresenham step.
pub fn draw_thick_line(frame: &mut Frame, segment: &LineSegment, color: [u8; 3], thickness: u32) {
    let lo = -(thickness as i64 / 2);
    let hi = lo + thickness as i64 - 1;
    let start = (segment.x1 as f32, segment.y1 as f32);
    let end = (segment.x2 as f32, segment.y2 as f32);
    for (x, y) in BresenhamLineIter::new(start, end) {
        for dy in lo..=hi {
            for dx in lo..=hi {
                frame.put_pixel(x as i64 + dx, y as i64 + dy, color);
            }
        }
    }
}

/// Writes `text` with its baseline-left corner at `origin`.
///
/// Glyphs sit on the row just above the baseline. Characters without a glyph
/// still advance the pen.
pub fn draw_text(frame: &mut Frame, text: &str, origin: (i64, i64), color: [u8; 3], scale: u32) {
    let scale = scale.max(1) as i64;
    let advance = (GLYPH_WIDTH as i64 + 1) * scale;
    let top = origin.1 - GLYPH_HEIGHT as i64 * scale;
    let mut pen_x = origin.0;
    for c in text.chars() {
        if let Some(g) = glyphs::glyph(c) {
            for row in 0..GLYPH_HEIGHT {
                for col in 0..GLYPH_WIDTH {
                    if !glyphs::is_set(g, col, row) {
                        continue;
                    }
                    let x0 = pen_x + col as i64 * scale;
                    let y0 = top + row as i64 * scale;
                    for dy in 0..scale {
                        for dx in 0..scale {
                            frame.put_pixel(x0 + dx, y0 + dy, color);
                        }
                    }
                }
            }
        }
        pen_x += advance;
    }
}
