use std::collections::BTreeMap;
use std::time::Instant;

use crate::shared::constants::DEFAULT_LOG_THROTTLE_FRAMES;

/// Observer for analysis-worker timings and metrics.
///
/// The worker owns its logger while running and hands it back on join, so
/// implementations need `Send` but not `Sync`.
pub trait AnalysisLogger: Send {
    /// Called once per analysed frame with the running count.
    fn progress(&mut self, frames_analyzed: usize);

    fn timing(&mut self, stage: &str, duration_ms: f64);

    fn metric(&mut self, name: &str, value: f64);

    /// Worker lifecycle messages.
    fn info(&mut self, message: &str);

    /// End-of-run report. Default: no-op.
    fn summary(&self) {}
}

pub struct NullAnalysisLogger;

impl AnalysisLogger for NullAnalysisLogger {
    fn progress(&mut self, _frames_analyzed: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Collects per-stage timings and metrics and logs a summary on stop.
///
/// Progress is logged every `throttle_frames` frames.
pub struct StdoutAnalysisLogger {
    throttle_frames: usize,
    timings: BTreeMap<String, Vec<f64>>,
    metrics: BTreeMap<String, Vec<f64>>,
    started: Instant,
    frames_analyzed: usize,
    progress_lines: usize,
}

impl StdoutAnalysisLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            timings: BTreeMap::new(),
            metrics: BTreeMap::new(),
            started: Instant::now(),
            frames_analyzed: 0,
            progress_lines: 0,
        }
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    pub fn metrics_for(&self, name: &str) -> Option<&[f64]> {
        self.metrics.get(name).map(|v| v.as_slice())
    }

    /// `None` until something has been recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_s = self.started.elapsed().as_secs_f64();
        let mut lines = vec![format!(
            "Analysis summary ({} frames, {elapsed_s:.1}s):",
            self.frames_analyzed
        )];

        for (stage, durations) in &self.timings {
            let total_ms: f64 = durations.iter().sum();
            let max_ms = durations.iter().copied().fold(0.0, f64::max);
            lines.push(format!(
                "  {stage:12}: avg {:6.1}ms  max {max_ms:6.1}ms  total {total_ms:7.0}ms",
                mean(durations)
            ));
        }
        for (name, values) in &self.metrics {
            lines.push(format!("  {name}: avg {:.1}", mean(values)));
        }
        if self.frames_analyzed > 0 && elapsed_s > 0.0 {
            lines.push(format!(
                "  Throughput: {:.1} fps",
                self.frames_analyzed as f64 / elapsed_s
            ));
        }

        Some(lines.join("\n"))
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

impl Default for StdoutAnalysisLogger {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_THROTTLE_FRAMES)
    }
}

impl AnalysisLogger for StdoutAnalysisLogger {
    fn progress(&mut self, frames_analyzed: usize) {
        self.frames_analyzed = frames_analyzed;
        if frames_analyzed % self.throttle_frames == 0 {
            self.progress_lines += 1;
            log::info!("Analysed {frames_analyzed} frames");
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
    fn test_null_logger_accepts_everything() {
        let mut logger = NullAnalysisLogger;
        logger.progress(1);
        logger.timing("analyze", 5.0);
        logger.metric("events", 2.0);
        logger.info("started");
        logger.summary();
    }

    #[test]
    fn test_timings_are_recorded_per_stage() {
        let mut logger = StdoutAnalysisLogger::new(10);
        logger.timing("analyze", 20.0);
        logger.timing("analyze", 30.0);
        logger.timing("dispatch", 1.0);

        assert_eq!(logger.timings_for("analyze").unwrap(), &[20.0, 30.0]);
        assert_eq!(logger.timings_for("dispatch").unwrap().len(), 1);
        assert!(logger.timings_for("missing").is_none());
    }

    #[test]
    fn test_summary_lists_stages_and_metric_averages() {
        let mut logger = StdoutAnalysisLogger::new(10);
        logger.progress(2);
        logger.timing("analyze", 10.0);
        logger.metric("frame_age_ms", 3.0);
        logger.metric("frame_age_ms", 4.0);

        assert_eq!(logger.metrics_for("frame_age_ms").unwrap(), &[3.0, 4.0]);
        assert!(logger.metrics_for("events").is_none());
        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("Analysis summary (2 frames"));
        assert!(summary.contains("analyze"));
        assert!(summary.contains("frame_age_ms: avg 3.5"));
    }

    #[test]
    fn test_empty_summary_is_none() {
        assert!(StdoutAnalysisLogger::new(5).summary_string().is_none());
    }

    #[test]
    fn test_progress_is_throttled() {
        let mut logger = StdoutAnalysisLogger::new(10);
        for n in 1..=25 {
            logger.progress(n);
        }
        assert_eq!(logger.progress_lines, 2);
        assert_eq!(logger.frames_analyzed, 25);
    }

    #[test]
    fn test_zero_throttle_is_clamped() {
        let mut logger = StdoutAnalysisLogger::new(0);
        logger.progress(1);
        assert_eq!(logger.progress_lines, 1);
    }

    #[test]
    fn test_mean_of_empty_is_zero() {
        assert_relative_eq!(mean(&[]), 0.0);
        assert_relative_eq!(mean(&[1.0, 2.0, 6.0]), 3.0);
    }

    #[test]
    fn test_default_throttle() {
        let logger = StdoutAnalysisLogger::default();
        assert_eq!(logger.throttle_frames, DEFAULT_LOG_THROTTLE_FRAMES);
    }
}
