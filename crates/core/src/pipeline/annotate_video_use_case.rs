use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::pipeline::frame_annotator::FrameAnnotator;
use crate::pipeline::pipeline_logger::{NullPipelineLogger, PipelineLogger};
use crate::shared::settings::SettingsHandle;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;

use super::pipeline_executor::{LinesCallback, PipelineConfig, PipelineExecutor, ProgressCallback};

/// Orchestrates the streaming annotation pipeline.
///
/// Wires the reader, writer and annotator together and delegates execution
/// to a `PipelineExecutor`. Single-use: `execute` consumes the owned
/// components, so a second call fails.
pub struct AnnotateVideoUseCase {
    reader: Option<Box<dyn VideoReader>>,
    writer: Option<Box<dyn VideoWriter>>,
    annotator: FrameAnnotator,
    executor: Box<dyn PipelineExecutor>,
    settings: SettingsHandle,
    on_progress: Option<ProgressCallback>,
    on_lines: Option<LinesCallback>,
    cancelled: Arc<AtomicBool>,
    logger: Option<Box<dyn PipelineLogger>>,
}

impl AnnotateVideoUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        writer: Box<dyn VideoWriter>,
        annotator: FrameAnnotator,
        executor: Box<dyn PipelineExecutor>,
        settings: SettingsHandle,
    ) -> Self {
        Self {
            reader: Some(reader),
            writer: Some(writer),
            annotator,
            executor,
            settings,
            on_progress: None,
            on_lines: None,
            cancelled: Arc::new(AtomicBool::new(false)),
            logger: None,
        }
    }

    pub fn with_progress(mut self, on_progress: ProgressCallback) -> Self {
        self.on_progress = Some(on_progress);
        self
    }

    pub fn with_lines_callback(mut self, on_lines: LinesCallback) -> Self {
        self.on_lines = Some(on_lines);
        self
    }

    pub fn with_cancel_flag(mut self, cancelled: Arc<AtomicBool>) -> Self {
        self.cancelled = cancelled;
        self
    }

    pub fn with_logger(mut self, logger: Box<dyn PipelineLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn execute(
        &mut self,
        metadata: &VideoMetadata,
        output_path: &Path,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let reader = self.reader.take().ok_or("Pipeline already executed")?;
        let writer = self.writer.take().ok_or("Pipeline already executed")?;

        let config = PipelineConfig {
            settings: self.settings.clone(),
            on_progress: self.on_progress.take(),
            on_lines: self.on_lines.take(),
            cancelled: self.cancelled.clone(),
            logger: self
                .logger
                .take()
                .unwrap_or_else(|| Box::new(NullPipelineLogger)),
        };

        self.executor.execute(
            reader,
            writer,
            &self.annotator,
            metadata,
            output_path,
            config,
        )
    }
}
