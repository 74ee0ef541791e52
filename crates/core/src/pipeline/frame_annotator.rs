use std::time::Instant;

use thiserror::Error;

use crate::annotation::domain::overlay_painter::OverlayPainter;
use crate::annotation::infrastructure::segment_painter::SegmentPainter;
use crate::detection::domain::angle_filter::AngleFilter;
use crate::detection::domain::edge_detector::EdgeDetector;
use crate::detection::domain::line_detector::LineDetector;
use crate::detection::infrastructure::canny_edge_detector::CannyEdgeDetector;
use crate::detection::infrastructure::probabilistic_hough::ProbabilisticHough;
use crate::filtering::domain::frame_filter::{ensure_bgr, FilterError, FrameFilter};
use crate::filtering::infrastructure::color::bgr_to_gray;
use crate::filtering::infrastructure::detail_enhancer::DetailEnhancer;
use crate::filtering::infrastructure::gaussian::GaussianBlurFilter;
use crate::shared::constants::BLUR_KERNEL_SIZE;
use crate::shared::frame::Frame;
use crate::shared::line_segment::AngledSegment;
use crate::shared::settings::AnnotatorSettings;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnnotateError {
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error("frame {index} is empty ({width}x{height})")]
    EmptyFrame { index: usize, width: u32, height: u32 },
    #[error("frame {index} holds {actual} bytes, expected {expected}")]
    BufferSize {
        index: usize,
        expected: usize,
        actual: usize,
    },
}

/// An annotated frame plus the segments that were drawn on it.
#[derive(Clone, Debug)]
pub struct AnnotatedFrame {
    pub frame: Frame,
    pub lines: Vec<AngledSegment>,
}

/// Per-stage wall-clock timings of one [`FrameAnnotator::process`] call, in ms.
#[derive(Clone, Copy, Debug, Default)]
pub struct StageTimings {
    pub blur_ms: f64,
    pub enhance_ms: f64,
    pub edges_ms: f64,
    pub lines_ms: f64,
    pub draw_ms: f64,
}

/// Highlights non-horizontal straight lines in a frame and labels their angles.
///
/// Stages run in a fixed order on a working copy: Gaussian blur, optional
/// detail enhancement, grayscale, edge detection, line detection, angle
/// filtering. Surviving segments are drawn on the untouched input frame.
/// No state is carried between calls.
pub struct FrameAnnotator {
    edge_detector: Box<dyn EdgeDetector>,
    line_detector: Box<dyn LineDetector>,
    angle_filter: AngleFilter,
    painter: Box<dyn OverlayPainter>,
    enhancer: DetailEnhancer,
}

impl FrameAnnotator {
    pub fn new(
        edge_detector: Box<dyn EdgeDetector>,
        line_detector: Box<dyn LineDetector>,
        angle_filter: AngleFilter,
        painter: Box<dyn OverlayPainter>,
    ) -> Self {
        Self {
            edge_detector,
            line_detector,
            angle_filter,
            painter,
            enhancer: DetailEnhancer::default(),
        }
    }

    pub fn annotate(
        &self,
        frame: &Frame,
        settings: &AnnotatorSettings,
    ) -> Result<Frame, AnnotateError> {
        self.process(frame, settings).map(|annotated| annotated.frame)
    }

    pub fn process(
        &self,
        frame: &Frame,
        settings: &AnnotatorSettings,
    ) -> Result<AnnotatedFrame, AnnotateError> {
        self.process_timed(frame, settings).map(|(annotated, _)| annotated)
    }

    /// Same as [`process`](Self::process), also reporting how long each stage took.
    pub fn process_timed(
        &self,
        frame: &Frame,
        settings: &AnnotatorSettings,
    ) -> Result<(AnnotatedFrame, StageTimings), AnnotateError> {
        validate(frame)?;
        let mut timings = StageTimings::default();

        let t = Instant::now();
        let mut work = frame.clone();
        GaussianBlurFilter::new(BLUR_KERNEL_SIZE, settings.blur_amount).apply(&mut work)?;
        timings.blur_ms = elapsed_ms(t);

        if settings.enhance_details {
            let t = Instant::now();
            self.enhancer.apply(&mut work)?;
            timings.enhance_ms = elapsed_ms(t);
        }

        let t = Instant::now();
        let edges = self.edge_detector.detect_edges(&bgr_to_gray(&work));
        timings.edges_ms = elapsed_ms(t);

        let t = Instant::now();
        let segments = self.line_detector.detect_lines(&edges);
        let lines = self.angle_filter.filter(&segments);
        timings.lines_ms = elapsed_ms(t);
        log::debug!(
            "frame {}: {} segment(s), {} above {:.1} deg",
            frame.index(),
            segments.len(),
            lines.len(),
            self.angle_filter.threshold_degrees()
        );

        let t = Instant::now();
        let mut out = frame.clone();
        self.painter.paint(&mut out, &lines);
        timings.draw_ms = elapsed_ms(t);

        Ok((AnnotatedFrame { frame: out, lines }, timings))
    }
}

impl Default for FrameAnnotator {
    fn default() -> Self {
        Self::new(
            Box::new(CannyEdgeDetector::default()),
            Box::new(ProbabilisticHough::default()),
            AngleFilter::default(),
            Box::new(SegmentPainter::default()),
        )
    }
}

fn validate(frame: &Frame) -> Result<(), AnnotateError> {
    ensure_bgr(frame)?;
    if frame.is_empty() {
        return Err(AnnotateError::EmptyFrame {
            index: frame.index(),
            width: frame.width(),
            height: frame.height(),
        });
    }
    let expected =
        frame.width() as usize * frame.height() as usize * frame.channels() as usize;
    if frame.data().len() != expected {
        return Err(AnnotateError::BufferSize {
            index: frame.index(),
            expected,
            actual: frame.data().len(),
        });
    }
    Ok(())
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::constants::{LINE_COLOR_BGR, TEXT_COLOR_BGR};

    const WHITE: [u8; 3] = [255, 255, 255];
    const BLACK: [u8; 3] = [0, 0, 0];

    /// Lower-left triangle white, rest black: one clean 45° edge along x == y.
    fn diagonal_frame(size: u32) -> Frame {
        let mut frame = Frame::filled(size, size, BLACK, 0);
        for y in 0..size {
            for x in 0..y {
                frame.put_pixel(x as i64, y as i64, WHITE);
            }
        }
        frame
    }

    fn horizontal_step_frame(width: u32, height: u32) -> Frame {
        let mut frame = Frame::filled(width, height, BLACK, 0);
        for y in height / 2..height {
            for x in 0..width {
                frame.put_pixel(x as i64, y as i64, WHITE);
            }
        }
        frame
    }

    #[test]
    fn test_output_has_input_shape() {
        let frame = diagonal_frame(120);
        let out = FrameAnnotator::default()
            .annotate(&frame, &AnnotatorSettings::default())
            .unwrap();
        assert!(out.same_shape(&frame));
        assert_eq!(out.index(), frame.index());
    }

    #[test]
    fn test_horizontal_edge_leaves_frame_unchanged() {
        let frame = horizontal_step_frame(200, 120);
        let annotated = FrameAnnotator::default()
            .process(&frame, &AnnotatorSettings::default())
            .unwrap();
        assert!(annotated.lines.is_empty());
        assert_eq!(annotated.frame, frame);
    }

    #[test]
    fn test_diagonal_edge_is_labelled_near_45_degrees() {
        let frame = diagonal_frame(240);
        let annotated = FrameAnnotator::default()
            .process(&frame, &AnnotatorSettings::default())
            .unwrap();
        assert!(!annotated.lines.is_empty());
        assert!(
            annotated
                .lines
                .iter()
                .any(|l| (l.angle - 45.0).abs() <= 1.0),
            "{:?}",
            annotated.lines
        );
        let data = annotated.frame.data();
        assert!(data.chunks_exact(3).any(|px| px == LINE_COLOR_BGR));
        assert!(data.chunks_exact(3).any(|px| px == TEXT_COLOR_BGR));
    }

    #[test]
    fn test_no_near_horizontal_segment_is_reported() {
        let frame = diagonal_frame(200);
        let annotated = FrameAnnotator::default()
            .process(&frame, &AnnotatorSettings::new(2.0, true))
            .unwrap();
        assert!(annotated.lines.iter().all(|l| l.angle >= 10.0));
    }

    #[test]
    fn test_is_deterministic() {
        let frame = diagonal_frame(160);
        let annotator = FrameAnnotator::default();
        let settings = AnnotatorSettings::new(1.5, true);
        let first = annotator.annotate(&frame, &settings).unwrap();
        let second = annotator.annotate(&frame, &settings).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_enhance_disabled_matches_blur_only_pass() {
        let frame = diagonal_frame(160);
        let settings = AnnotatorSettings::new(1.0, false);

        let mut blurred = frame.clone();
        GaussianBlurFilter::new(BLUR_KERNEL_SIZE, 1.0)
            .apply(&mut blurred)
            .unwrap();
        let edges = CannyEdgeDetector::default().detect_edges(&bgr_to_gray(&blurred));
        let segments = ProbabilisticHough::default().detect_lines(&edges);
        let lines = AngleFilter::default().filter(&segments);
        let mut expected = frame.clone();
        SegmentPainter::default().paint(&mut expected, &lines);

        let out = FrameAnnotator::default().annotate(&frame, &settings).unwrap();
        assert_eq!(out, expected);
    }

    #[test]
    fn test_input_frame_is_not_modified() {
        let frame = diagonal_frame(120);
        let copy = frame.clone();
        FrameAnnotator::default()
            .annotate(&frame, &AnnotatorSettings::new(3.5, true))
            .unwrap();
        assert_eq!(frame, copy);
    }

    #[test]
    fn test_timings_report_enhance_only_when_enabled() {
        let frame = diagonal_frame(64);
        let annotator = FrameAnnotator::default();
        let (_, off) = annotator
            .process_timed(&frame, &AnnotatorSettings::new(0.5, false))
            .unwrap();
        assert_eq!(off.enhance_ms, 0.0);
        let (_, on) = annotator
            .process_timed(&frame, &AnnotatorSettings::new(0.5, true))
            .unwrap();
        assert!(on.enhance_ms >= 0.0);
    }

    #[test]
    fn test_gray_frame_is_rejected() {
        let gray = Frame::new(vec![0; 16], 4, 4, 1, 3);
        let err = FrameAnnotator::default()
            .annotate(&gray, &AnnotatorSettings::default())
            .unwrap_err();
        assert_eq!(
            err,
            AnnotateError::Filter(FilterError::UnsupportedChannels { channels: 1 })
        );
    }

    #[test]
    fn test_empty_frame_is_rejected() {
        let empty = Frame::new(Vec::new(), 0, 0, 3, 7);
        let err = FrameAnnotator::default()
            .annotate(&empty, &AnnotatorSettings::default())
            .unwrap_err();
        assert_eq!(
            err,
            AnnotateError::EmptyFrame {
                index: 7,
                width: 0,
                height: 0
            }
        );
    }
}
