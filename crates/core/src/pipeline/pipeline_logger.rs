use std::collections::BTreeMap;
use std::time::Instant;

/// Cross-cutting logger for annotation pipeline events.
///
/// Keeps the executor free of any particular output mechanism; the CLI
/// plugs in [`StdoutPipelineLogger`], tests and library callers use
/// [`NullPipelineLogger`].
pub trait PipelineLogger: Send {
    /// Report frame-level progress.
    fn progress(&mut self, current: usize, total: usize);

    /// Record how long a named stage took for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a per-frame metric (e.g. `line_count`).
    fn metric(&mut self, name: &str, value: f64);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Discards all events.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Running count/sum/max of one series.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SeriesStats {
    pub count: usize,
    pub sum: f64,
    pub max: f64,
}

impl SeriesStats {
    fn push(&mut self, value: f64) {
        if self.count == 0 || value > self.max {
            self.max = value;
        }
        self.count += 1;
        self.sum += value;
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

/// CLI logger: throttled progress through `log`, per-stage timings and
/// metrics aggregated into an end-of-run summary.
///
/// Only aggregates are kept, so memory stays flat on long streams.
pub struct StdoutPipelineLogger {
    throttle_frames: usize,
    timings: BTreeMap<String, SeriesStats>,
    metrics: BTreeMap<String, SeriesStats>,
    start_time: Instant,
    frames_done: usize,
    total_frames: usize,
}

impl StdoutPipelineLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            timings: BTreeMap::new(),
            metrics: BTreeMap::new(),
            start_time: Instant::now(),
            frames_done: 0,
            total_frames: 0,
        }
    }

    /// Returns the formatted summary, or `None` if nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let frames = self.frames_done;
        let mut lines = vec![format!(
            "Annotation summary ({frames} frames, {:.1}s total):",
            elapsed_ms / 1000.0
        )];

        for (stage, stats) in &self.timings {
            let pct = if elapsed_ms > 0.0 {
                stats.sum / elapsed_ms * 100.0
            } else {
                0.0
            };
            lines.push(format!(
                "  {stage:12}: avg {:6.1}ms  max {:6.1}ms  total {:7.0}ms  ({pct:4.1}%)",
                stats.mean(),
                stats.max,
                stats.sum
            ));
        }

        for (name, stats) in &self.metrics {
            lines.push(format!(
                "  {name}: avg {:.1}  max {:.0}  total {:.0}",
                stats.mean(),
                stats.max,
                stats.sum
            ));
        }

        if frames > 0 && elapsed_ms > 0.0 {
            let fps = frames as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Throughput: {fps:.1} fps"));
        }

        Some(lines.join("\n"))
    }

    pub fn timing_stats(&self, stage: &str) -> Option<SeriesStats> {
        self.timings.get(stage).copied()
    }

    pub fn metric_stats(&self, name: &str) -> Option<SeriesStats> {
        self.metrics.get(name).copied()
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(10)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.frames_done = current;
        self.total_frames = total;
        if current % self.throttle_frames != 0 && current != total {
            return;
        }
        if total > 0 {
            let pct = current as f64 / total as f64 * 100.0;
            log::info!("Annotating: {current}/{total} frames ({pct:.1}%)");
        } else {
            // Unknown length (live source or container without a frame count).
            log::info!("Annotating: {current} frames");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.entry(name.to_string()).or_default().push(value);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_null_logger_all_methods_are_noop() {
        let mut logger = NullPipelineLogger;
        logger.progress(1, 10);
        logger.timing("edges", 5.0);
        logger.metric("line_count", 3.0);
        logger.info("hello");
        logger.summary();
    }

    #[test]
    fn test_timing_aggregates_per_stage() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.timing("edges", 20.0);
        logger.timing("edges", 30.0);
        logger.timing("blur", 5.0);

        let edges = logger.timing_stats("edges").unwrap();
        assert_eq!(edges.count, 2);
        assert_relative_eq!(edges.mean(), 25.0);
        assert_relative_eq!(edges.max, 30.0);

        let blur = logger.timing_stats("blur").unwrap();
        assert_eq!(blur.count, 1);
        assert_relative_eq!(blur.sum, 5.0);
        assert!(logger.timing_stats("enhance").is_none());
    }

    #[test]
    fn test_metric_tracks_max_and_total() {
        let mut logger = StdoutPipelineLogger::new(10);
        for count in [0.0, 4.0, 2.0] {
            logger.metric("line_count", count);
        }
        let stats = logger.metric_stats("line_count").unwrap();
        assert_eq!(stats.count, 3);
        assert_relative_eq!(stats.max, 4.0);
        assert_relative_eq!(stats.sum, 6.0);
        assert_relative_eq!(stats.mean(), 2.0);
    }

    #[test]
    fn test_summary_lists_stages_and_metrics() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.progress(10, 10);
        logger.timing("edges", 20.0);
        logger.timing("lines", 30.0);
        logger.metric("line_count", 3.0);
        logger.metric("line_count", 4.0);

        let summary = logger.summary_string().unwrap();
        assert!(summary.starts_with("Annotation summary (10 frames"));
        assert!(summary.contains("edges"));
        assert!(summary.contains("lines"));
        assert!(summary.contains("line_count: avg 3.5  max 4  total 7"));
    }

    #[test]
    fn test_summary_includes_fps_once_frames_done() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.timing("blur", 10.0);
        assert!(!logger.summary_string().unwrap().contains("fps"));

        logger.progress(5, 0);
        std::thread::sleep(std::time::Duration::from_millis(2));
        assert!(logger.summary_string().unwrap().contains("fps"));
    }

    #[test]
    fn test_empty_summary_returns_none() {
        assert!(StdoutPipelineLogger::new(10).summary_string().is_none());
    }

    #[test]
    fn test_progress_tracks_counts() {
        let mut logger = StdoutPipelineLogger::new(10);
        for i in 1..=20 {
            logger.progress(i, 20);
        }
        assert_eq!(logger.frames_done, 20);
        assert_eq!(logger.total_frames, 20);
    }

    #[test]
    fn test_default_throttle() {
        assert_eq!(StdoutPipelineLogger::default().throttle_frames, 10);
    }

    #[test]
    fn test_zero_throttle_is_raised_to_one() {
        assert_eq!(StdoutPipelineLogger::new(0).throttle_frames, 1);
    }
}
