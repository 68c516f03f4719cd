use log::LevelFilter;
use log4rs::{
    append::file::FileAppender,
    config::{Appender, Config, Logger, Root},
    encode::pattern::PatternEncoder,
};
use std::path::Path;
use anyhow::Result;

use super::FFMPEG_LOG_TARGET;

/// Routes all log output to `log_file`.
///
/// Relayed encoder output (target `ffmpeg_log`) is capped at `Info` unless
/// the root level is `Trace`, so debug runs are not flooded with frame logs.
pub fn setup_file_logging(log_file: &Path, log_level: LevelFilter) -> Result<()> {
    if let Some(parent) = log_file.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] {m}{n}"
        )))
        .build(log_file)?;

    let ffmpeg_level = if log_level == LevelFilter::Trace {
        LevelFilter::Trace
    } else {
        log_level.min(LevelFilter::Info)
    };

    let config = Config::builder()
        .appender(Appender::builder().build("file", Box::new(file_appender)))
        .logger(
            Logger::builder()
                .appender("file")
                .additive(false)
                .build(FFMPEG_LOG_TARGET, ffmpeg_level),
        )
        .build(Root::builder().appender("file").build(log_level))?;

    log4rs::init_config(config)?;

    Ok(())
}
