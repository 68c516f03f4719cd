//! File logging setup and render progress logging.
//!
//! `setup_file_logging` installs a log4rs file appender. `ProgressLogger`
//! turns the stream of encoder progress samples into one log line per 10%
//! milestone, with a time-based fallback for very slow renders.

pub mod setup;

pub use setup::setup_file_logging;

use log::info;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::utils::format_duration;

/// Log target for relayed ffmpeg output.
pub const FFMPEG_LOG_TARGET: &str = "ffmpeg_log";

/// Progress milestone step, in percent.
const MILESTONE_STEP: u32 = 10;

/// Maximum silence between progress lines.
const TIME_FALLBACK: Duration = Duration::from_secs(120);

pub struct ProgressLogger {
    label: String,
    last_logged_percent: Mutex<Option<u32>>,
    last_log_time: Mutex<Option<Instant>>,
}

impl ProgressLogger {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            last_logged_percent: Mutex::new(None),
            last_log_time: Mutex::new(None),
        }
    }

    /// Records a progress sample and logs it if a milestone was crossed.
    /// Returns whether a line was written.
    pub fn observe(&self, elapsed_secs: f64, total_secs: f64) -> bool {
        if total_secs <= 0.0 || !elapsed_secs.is_finite() {
            return false;
        }
        let percent = ((elapsed_secs / total_secs) * 100.0).clamp(0.0, 100.0);
        let milestone = (percent as u32 / MILESTONE_STEP) * MILESTONE_STEP;
        let now = Instant::now();

        let (Ok(mut last_logged), Ok(mut last_time)) =
            (self.last_logged_percent.lock(), self.last_log_time.lock())
        else {
            return false;
        };

        let should_log = match (*last_logged, *last_time) {
            (Some(last), Some(at)) => {
                milestone > last || now.duration_since(at) >= TIME_FALLBACK
            }
            _ => milestone > 0,
        };

        if should_log {
            info!(
                "{}: {:.0}% ({} / {})",
                self.label,
                percent,
                format_duration(elapsed_secs),
                format_duration(total_secs)
            );
            *last_logged = Some(milestone.max(last_logged.unwrap_or(0)));
            *last_time = Some(now);
        }
        should_log
    }
}
