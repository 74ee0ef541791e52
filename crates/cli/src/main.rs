use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use line_annotator_core::annotation::infrastructure::segment_painter::SegmentPainter;
use line_annotator_core::detection::domain::angle_filter::AngleFilter;
use line_annotator_core::detection::infrastructure::canny_edge_detector::CannyEdgeDetector;
use line_annotator_core::detection::infrastructure::probabilistic_hough::ProbabilisticHough;
use line_annotator_core::pipeline::annotate_image_use_case::AnnotateImageUseCase;
use line_annotator_core::pipeline::frame_annotator::FrameAnnotator;
use line_annotator_core::shared::constants::{IMAGE_EXTENSIONS, MAX_BLUR_AMOUNT, MIN_BLUR_AMOUNT};
use line_annotator_core::shared::line_segment::AngledSegment;
use line_annotator_core::shared::settings::AnnotatorSettings;
use line_annotator_core::video::domain::image_writer::ImageWriter;
use line_annotator_core::video::domain::video_reader::VideoReader;
use line_annotator_core::video::infrastructure::image_file_reader::ImageFileReader;
use line_annotator_core::video::infrastructure::image_file_writer::ImageFileWriter;

/// Highlights non-horizontal straight lines in videos and images and labels their angles.
#[derive(Parser)]
#[command(name = "line-annotator")]
struct Cli {
    /// Input video or image file.
    input: PathBuf,

    /// Output file.
    output: PathBuf,

    /// Gaussian blur standard deviation (0.5-3.5). Overrides the config file.
    #[arg(long)]
    blur: Option<f64>,

    /// Edge-preserving detail enhancement (`--enhance` or `--enhance=false`).
    /// Overrides the config file.
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    enhance: Option<bool>,

    /// Integer magnification of the angle labels.
    #[arg(long, default_value = "1")]
    text_scale: u32,

    /// JSON settings file (defaults to <config_dir>/line-annotator/settings.json).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Re-read the settings file while a video is being processed.
    #[arg(long)]
    watch_config: bool,

    /// Print every annotated segment and its angle.
    #[arg(long)]
    report: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let config_path = match &cli.config {
        Some(path) => Some(path.clone()),
        None => AnnotatorSettings::default_path().ok(),
    };
    let settings = resolve_settings(&cli, config_path.as_deref())?;
    log::info!(
        "Settings: blur {:.2}, enhance {}",
        settings.blur_amount,
        settings.enhance_details
    );

    let annotator = build_annotator(cli.text_scale);
    if is_image(&cli.input) {
        run_image(&cli.input, &cli.output, annotator, &settings, cli.report)
    } else {
        let watch_path = if cli.watch_config { config_path } else { None };
        run_video(
            &cli.input,
            &cli.output,
            annotator,
            settings,
            watch_path,
            cli.report,
        )
    }
}

fn build_annotator(text_scale: u32) -> FrameAnnotator {
    FrameAnnotator::new(
        Box::new(CannyEdgeDetector::default()),
        Box::new(ProbabilisticHough::default()),
        AngleFilter::default(),
        Box::new(SegmentPainter::default().with_text_scale(text_scale)),
    )
}

fn run_image(
    input: &Path,
    output: &Path,
    annotator: FrameAnnotator,
    settings: &AnnotatorSettings,
    report: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let reader: Box<dyn VideoReader> = Box::new(ImageFileReader::new());
    let image_writer: Box<dyn ImageWriter> = Box::new(ImageFileWriter::new());

    let mut use_case = AnnotateImageUseCase::new(reader, image_writer, annotator);
    let lines = use_case.execute(input, output, settings)?;
    if report {
        print_report(0, &lines);
    }
    log::info!("Output written to {}", output.display());
    Ok(())
}

#[cfg(feature = "ffmpeg")]
fn run_video(
    input: &Path,
    output: &Path,
    annotator: FrameAnnotator,
    settings: AnnotatorSettings,
    watch_path: Option<PathBuf>,
    report: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    use line_annotator_core::pipeline::annotate_video_use_case::AnnotateVideoUseCase;
    use line_annotator_core::pipeline::infrastructure::threaded_pipeline_executor::ThreadedPipelineExecutor;
    use line_annotator_core::pipeline::pipeline_logger::StdoutPipelineLogger;
    use line_annotator_core::shared::settings::SettingsHandle;
    use line_annotator_core::shared::settings_watcher::SettingsWatcher;
    use line_annotator_core::video::domain::video_writer::VideoWriter;
    use line_annotator_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
    use line_annotator_core::video::infrastructure::ffmpeg_writer::FfmpegWriter;

    let mut reader: Box<dyn VideoReader> = Box::new(FfmpegReader::new());
    let metadata = reader.open(input)?;
    let writer: Box<dyn VideoWriter> = Box::new(FfmpegWriter::new());

    let handle = SettingsHandle::new(settings);
    let _watcher = watch_path.map(|path| {
        log::info!("Watching {} for settings changes", path.display());
        SettingsWatcher::spawn(path, handle.clone())
    });

    let total = metadata.total_frames;
    let progress: Box<dyn Fn(usize, usize) -> bool + Send> = Box::new(move |current, _| {
        eprint!("\rProcessing frame {current}/{total}");
        true
    });

    let mut use_case = AnnotateVideoUseCase::new(
        reader,
        writer,
        annotator,
        Box::new(ThreadedPipelineExecutor::new()),
        handle,
    )
    .with_progress(progress)
    .with_logger(Box::new(StdoutPipelineLogger::default()));
    if report {
        use_case = use_case.with_lines_callback(Box::new(print_report));
    }

    use_case.execute(&metadata, output)?;
    eprintln!();
    log::info!("Output written to {}", output.display());
    Ok(())
}

#[cfg(not(feature = "ffmpeg"))]
fn run_video(
    input: &Path,
    _output: &Path,
    _annotator: FrameAnnotator,
    _settings: AnnotatorSettings,
    _watch_path: Option<PathBuf>,
    _report: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    Err(format!(
        "Video input {} requires a build with the `ffmpeg` feature",
        input.display()
    )
    .into())
}

/// File values first (when the file exists), then command-line overrides.
fn resolve_settings(
    cli: &Cli,
    config_path: Option<&Path>,
) -> Result<AnnotatorSettings, Box<dyn std::error::Error>> {
    let mut settings = match config_path {
        Some(path) if path.exists() => AnnotatorSettings::load(path)?,
        Some(path) if cli.config.is_some() => {
            return Err(format!("Config file not found: {}", path.display()).into());
        }
        _ => AnnotatorSettings::default(),
    };
    if let Some(blur) = cli.blur {
        settings.blur_amount = blur;
    }
    if let Some(enhance) = cli.enhance {
        settings.enhance_details = enhance;
    }
    Ok(settings.clamped())
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        return Err(format!("Input file not found: {}", cli.input.display()).into());
    }
    if let Some(blur) = cli.blur {
        if !(MIN_BLUR_AMOUNT..=MAX_BLUR_AMOUNT).contains(&blur) {
            return Err(format!(
                "Blur amount must be between {MIN_BLUR_AMOUNT} and {MAX_BLUR_AMOUNT}, got {blur}"
            )
            .into());
        }
    }
    if cli.text_scale == 0 {
        return Err("Text scale must be at least 1".into());
    }
    if cli.watch_config && is_image(&cli.input) {
        return Err("--watch-config only applies to video input".into());
    }
    Ok(())
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn print_report(frame_index: usize, lines: &[AngledSegment]) {
    for line in lines {
        let s = line.segment;
        println!(
            "frame {frame_index}: ({}, {}) -> ({}, {})  {} deg",
            s.x1,
            s.y1,
            s.x2,
            s.y2,
            line.label()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["line-annotator"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    fn write_config(dir: &Path, settings: &AnnotatorSettings) -> PathBuf {
        let path = dir.join("settings.json");
        settings.save(&path).unwrap();
        path
    }

    #[test]
    fn test_file_values_used_without_flags() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(dir.path(), &AnnotatorSettings::new(1.0, true));
        let cli = parse(&["in.png", "out.png"]);

        let settings = resolve_settings(&cli, Some(&config)).unwrap();
        assert_relative_eq!(settings.blur_amount, 1.0);
        assert!(settings.enhance_details);
    }

    #[test]
    fn test_flags_override_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(dir.path(), &AnnotatorSettings::new(1.0, true));
        let cli = parse(&["in.png", "out.png", "--blur", "2.5", "--enhance=false"]);

        let settings = resolve_settings(&cli, Some(&config)).unwrap();
        assert_relative_eq!(settings.blur_amount, 2.5);
        assert!(!settings.enhance_details);
    }

    #[test]
    fn test_bare_enhance_flag_enables() {
        let cli = parse(&["in.png", "out.png", "--enhance"]);
        assert_eq!(cli.enhance, Some(true));
        let settings = resolve_settings(&cli, None).unwrap();
        assert!(settings.enhance_details);
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.json");
        let cli = parse(&["in.png", "out.png", "--config", missing.to_str().unwrap()]);

        let err = resolve_settings(&cli, cli.config.as_deref()).unwrap_err();
        assert!(err.to_string().starts_with("Config file not found"), "{err}");
    }

    #[test]
    fn test_missing_default_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cli = parse(&["in.png", "out.png"]);
        let settings = resolve_settings(&cli, Some(&dir.path().join("absent.json"))).unwrap();
        assert_eq!(settings, AnnotatorSettings::default());
    }

    #[test]
    fn test_validate_rejects_out_of_range_blur() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.png");
        std::fs::write(&input, b"").unwrap();
        let cli = parse(&[input.to_str().unwrap(), "out.png", "--blur", "4.0"]);

        let err = validate(&cli).unwrap_err();
        assert!(err.to_string().starts_with("Blur amount must be between"), "{err}");
    }

    #[test]
    fn test_validate_accepts_in_range_blur() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.png");
        std::fs::write(&input, b"").unwrap();
        let cli = parse(&[input.to_str().unwrap(), "out.png", "--blur", "3.5"]);
        assert!(validate(&cli).is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_text_scale() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.png");
        std::fs::write(&input, b"").unwrap();
        let cli = parse(&[input.to_str().unwrap(), "out.png", "--text-scale", "0"]);
        assert!(validate(&cli).is_err());
    }

    #[test]
    fn test_validate_rejects_missing_input() {
        let cli = parse(&["/nonexistent/in.png", "out.png"]);
        let err = validate(&cli).unwrap_err();
        assert!(err.to_string().starts_with("Input file not found"));
    }
}
