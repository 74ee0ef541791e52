use std::path::Path;

use crate::pipeline::frame_annotator::FrameAnnotator;
use crate::shared::line_segment::AngledSegment;
use crate::shared::settings::AnnotatorSettings;
use crate::video::domain::image_writer::ImageWriter;
use crate::video::domain::video_reader::VideoReader;

/// Single-image pipeline: read → annotate → write.
pub struct AnnotateImageUseCase {
    reader: Box<dyn VideoReader>,
    image_writer: Box<dyn ImageWriter>,
    annotator: FrameAnnotator,
}

impl AnnotateImageUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        image_writer: Box<dyn ImageWriter>,
        annotator: FrameAnnotator,
    ) -> Self {
        Self {
            reader,
            image_writer,
            annotator,
        }
    }

    /// Annotates the image at `input_path`, writes it to `output_path` and
    /// returns the segments that were drawn.
    pub fn execute(
        &mut self,
        input_path: &Path,
        output_path: &Path,
        settings: &AnnotatorSettings,
    ) -> Result<Vec<AngledSegment>, Box<dyn std::error::Error>> {
        let _metadata = self.reader.open(input_path)?;

        let frame = self.reader.frames().next().ok_or("No frames in image")??;
        self.reader.close();

        let annotated = self.annotator.process(&frame, settings)?;
        self.image_writer.write(output_path, &annotated.frame)?;

        log::info!(
            "{}: {} line(s) annotated",
            input_path.display(),
            annotated.lines.len()
        );
        Ok(annotated.lines)
    }
}
