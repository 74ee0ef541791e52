use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::pipeline::frame_annotator::FrameAnnotator;
use crate::pipeline::pipeline_executor::{PipelineConfig, PipelineExecutor};
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;

const DEFAULT_CHANNEL_CAPACITY: usize = 8;

type SendError = Box<dyn std::error::Error + Send + Sync>;

/// Executes the annotation pipeline with dedicated threads for I/O.
///
/// Layout: `reader → main [snapshot settings/annotate] → writer`
///
/// Decoding and encoding overlap with annotation. Queues are bounded, so a
/// slow stage applies backpressure instead of buffering the whole stream.
pub struct ThreadedPipelineExecutor {
    channel_capacity: usize,
}

impl ThreadedPipelineExecutor {
    pub fn new() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl Default for ThreadedPipelineExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineExecutor for ThreadedPipelineExecutor {
    fn execute(
        &self,
        reader: Box<dyn VideoReader>,
        mut writer: Box<dyn VideoWriter>,
        annotator: &FrameAnnotator,
        metadata: &VideoMetadata,
        output_path: &Path,
        mut config: PipelineConfig,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let cap = self.channel_capacity;

        writer.open(output_path, metadata)?;
        config.logger.info(&format!(
            "Annotating {}x{} @ {:.2} fps into {}",
            metadata.width,
            metadata.height,
            metadata.fps,
            output_path.display()
        ));

        let (frame_tx, frame_rx) = crossbeam_channel::bounded::<Result<Frame, SendError>>(cap);
        let (write_tx, write_rx) = crossbeam_channel::bounded::<Frame>(cap);

        let reader_handle = spawn_reader(reader, frame_tx, config.cancelled.clone());
        let writer_handle = spawn_writer(writer, write_rx);

        let main_error = run_main_loop(
            frame_rx,
            &write_tx,
            annotator,
            metadata.total_frames,
            &mut config,
        );

        drop(write_tx);

        let result = join_threads(reader_handle, writer_handle, main_error);
        config.logger.summary();
        result
    }
}

fn spawn_reader(
    mut reader: Box<dyn VideoReader>,
    frame_tx: crossbeam_channel::Sender<Result<Frame, SendError>>,
    cancelled: Arc<AtomicBool>,
) -> std::thread::JoinHandle<Box<dyn VideoReader>> {
    std::thread::spawn(move || {
        for frame_result in reader.frames() {
            if cancelled.load(Ordering::Relaxed) {
                break;
            }
            let mapped = frame_result.map_err(|e| -> SendError { e.to_string().into() });
            if frame_tx.send(mapped).is_err() {
                break;
            }
        }
        reader.close();
        reader
    })
}

fn spawn_writer(
    mut writer: Box<dyn VideoWriter>,
    write_rx: crossbeam_channel::Receiver<Frame>,
) -> std::thread::JoinHandle<Result<Box<dyn VideoWriter>, SendError>> {
    std::thread::spawn(move || {
        for frame in write_rx {
            writer
                .write(&frame)
                .map_err(|e| -> SendError { e.to_string().into() })?;
        }
        Ok(writer)
    })
}

/// Receives decoded frames, annotates each with the settings current at that
/// moment, and forwards the result to the writer in arrival order.
fn run_main_loop(
    frame_rx: crossbeam_channel::Receiver<Result<Frame, SendError>>,
    write_tx: &crossbeam_channel::Sender<Frame>,
    annotator: &FrameAnnotator,
    total_frames: usize,
    config: &mut PipelineConfig,
) -> Option<Box<dyn std::error::Error>> {
    let mut frames_processed: usize = 0;

    for frame_result in frame_rx {
        if config.cancelled.load(Ordering::Relaxed) {
            break;
        }

        let frame = match frame_result {
            Ok(frame) => frame,
            Err(e) => return Some(e.to_string().into()),
        };

        if let Err(e) = annotate_and_send(
            &frame,
            annotator,
            write_tx,
            &mut frames_processed,
            total_frames,
            config,
        ) {
            return Some(e);
        }
    }

    None
}

fn annotate_and_send(
    frame: &Frame,
    annotator: &FrameAnnotator,
    write_tx: &crossbeam_channel::Sender<Frame>,
    frames_processed: &mut usize,
    total_frames: usize,
    config: &mut PipelineConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let settings = config.settings.snapshot();

    let (annotated, timings) = annotator.process_timed(frame, &settings)?;
    let logger = config.logger.as_mut();
    logger.timing("blur", timings.blur_ms);
    if settings.enhance_details {
        logger.timing("enhance", timings.enhance_ms);
    }
    logger.timing("edges", timings.edges_ms);
    logger.timing("lines", timings.lines_ms);
    logger.timing("draw", timings.draw_ms);
    logger.metric("line_count", annotated.lines.len() as f64);

    if let Some(ref callback) = config.on_lines {
        callback(frame.index(), &annotated.lines);
    }

    let send_start = Instant::now();
    write_tx
        .send(annotated.frame)
        .map_err(|_| "Writer channel closed unexpectedly")?;
    config
        .logger
        .timing("write_wait", send_start.elapsed().as_secs_f64() * 1000.0);

    *frames_processed += 1;
    config.logger.progress(*frames_processed, total_frames);

    if let Some(ref callback) = config.on_progress {
        if !callback(*frames_processed, total_frames) {
            return Err("Cancelled".into());
        }
    }

    Ok(())
}

/// Joins all pipeline threads and coalesces the first error encountered.
fn join_threads(
    reader_handle: std::thread::JoinHandle<Box<dyn VideoReader>>,
    writer_handle: std::thread::JoinHandle<Result<Box<dyn VideoWriter>, SendError>>,
    mut first_error: Option<Box<dyn std::error::Error>>,
) -> Result<(), Box<dyn std::error::Error>> {
    fn set_if_none(slot: &mut Option<Box<dyn std::error::Error>>, err: Box<dyn std::error::Error>) {
        if slot.is_none() {
            *slot = Some(err);
        }
    }

    match reader_handle.join() {
        Ok(mut r) => r.close(),
        Err(_) => set_if_none(&mut first_error, "Reader thread panicked".into()),
    }

    match writer_handle.join() {
        Ok(Ok(mut w)) => {
            if let Err(e) = w.close() {
                set_if_none(&mut first_error, e);
            }
        }
        Ok(Err(e)) => set_if_none(&mut first_error, e.to_string().into()),
        Err(_) => set_if_none(&mut first_error, "Writer thread panicked".into()),
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
