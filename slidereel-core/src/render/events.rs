//! Handling of ffmpeg events during a render.
//!
//! Progress samples are turned into percentage updates for the caller and
//! milestone log lines; every stderr line is relayed to the `ffmpeg_log`
//! target and kept in a bounded tail for error reports.

use crate::file_logging::{FFMPEG_LOG_TARGET, ProgressLogger};
use crate::parse_ffmpeg_time;

use ffmpeg_sidecar::event::{FfmpegEvent, FfmpegProgress, LogLevel as FfmpegLogLevel};
use std::collections::VecDeque;
use std::sync::Arc;

/// Number of stderr lines kept for error reports.
pub const STDERR_TAIL_LINES: usize = 40;

/// Receives render progress in percent (0.0 to 100.0).
pub type ProgressCallback = Arc<dyn Fn(f32) + Send + Sync>;

pub struct RenderEventHandler {
    total_secs: f64,
    logger: ProgressLogger,
    callback: Option<ProgressCallback>,
    last_percent: f32,
    tail: VecDeque<String>,
}

impl RenderEventHandler {
    pub fn new(total_secs: f64, label: &str, callback: Option<ProgressCallback>) -> Self {
        Self {
            total_secs,
            logger: ProgressLogger::new(label),
            callback,
            last_percent: -1.0,
            tail: VecDeque::with_capacity(STDERR_TAIL_LINES),
        }
    }

    pub fn handle_event(&mut self, event: FfmpegEvent) {
        match event {
            FfmpegEvent::Progress(progress) => self.handle_progress(&progress),
            FfmpegEvent::Log(level, line) => self.handle_log(level, line),
            FfmpegEvent::Error(line) => {
                log::debug!(target: FFMPEG_LOG_TARGET, "{line}");
                self.push_tail(line);
            }
            _ => {}
        }
    }

    /// Consumes the handler, returning the kept stderr lines joined by newlines.
    pub fn into_stderr_tail(self) -> String {
        Vec::from(self.tail).join("\n")
    }

    fn handle_progress(&mut self, progress: &FfmpegProgress) {
        let Some(current) = parse_ffmpeg_time(&progress.time) else {
            return;
        };
        self.logger.observe(current, self.total_secs);

        if self.total_secs <= 0.0 {
            return;
        }
        let percent = ((current / self.total_secs) * 100.0).clamp(0.0, 100.0) as f32;
        if percent > self.last_percent {
            self.last_percent = percent;
            if let Some(callback) = &self.callback {
                callback(percent);
            }
        }
    }

    fn handle_log(&mut self, level: FfmpegLogLevel, line: String) {
        match level {
            FfmpegLogLevel::Fatal | FfmpegLogLevel::Error => {
                log::error!(target: FFMPEG_LOG_TARGET, "{line}")
            }
            FfmpegLogLevel::Warning => log::warn!(target: FFMPEG_LOG_TARGET, "{line}"),
            _ => log::debug!(target: FFMPEG_LOG_TARGET, "{line}"),
        }
        self.push_tail(line);
    }

    fn push_tail(&mut self, line: String) {
        if self.tail.len() == STDERR_TAIL_LINES {
            self.tail.pop_front();
        }
        self.tail.push_back(line);
    }
}
