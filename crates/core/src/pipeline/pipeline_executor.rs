use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::pipeline::frame_annotator::FrameAnnotator;
use crate::pipeline::pipeline_logger::{NullPipelineLogger, PipelineLogger};
use crate::shared::line_segment::AngledSegment;
use crate::shared::settings::SettingsHandle;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;

/// Called with `(frames_done, total_frames)`; returning `false` cancels the run.
pub type ProgressCallback = Box<dyn Fn(usize, usize) -> bool + Send>;

/// Called with the frame index and the segments drawn on that frame.
pub type LinesCallback = Box<dyn Fn(usize, &[AngledSegment]) + Send>;

/// Configuration for a pipeline execution run.
pub struct PipelineConfig {
    /// Read once per frame; updates land on the next frame.
    pub settings: SettingsHandle,
    pub on_progress: Option<ProgressCallback>,
    pub on_lines: Option<LinesCallback>,
    pub cancelled: Arc<AtomicBool>,
    pub logger: Box<dyn PipelineLogger>,
}

impl PipelineConfig {
    pub fn new(settings: SettingsHandle) -> Self {
        Self {
            settings,
            on_progress: None,
            on_lines: None,
            cancelled: Arc::new(AtomicBool::new(false)),
            logger: Box::new(NullPipelineLogger),
        }
    }
}

/// Abstracts how the read → annotate → write pipeline is executed.
///
/// This is a port (application-layer interface). Infrastructure provides
/// concrete implementations.
pub trait PipelineExecutor: Send {
    fn execute(
        &self,
        reader: Box<dyn VideoReader>,
        writer: Box<dyn VideoWriter>,
        annotator: &FrameAnnotator,
        metadata: &VideoMetadata,
        output_path: &Path,
        config: PipelineConfig,
    ) -> Result<(), Box<dyn std::error::Error>>;
}
