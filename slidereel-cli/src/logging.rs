// ============================================================================
// slidereel-cli/src/logging.rs
// ============================================================================
//
// LOGGING UTILITIES: Logger initialization and helpers
//
// Console logging goes through `env_logger` (RUST_LOG is honored, --verbose
// raises the default to debug). With --log-file the core's log4rs file setup
// is used instead so relayed ffmpeg output lands in the file.
//
// KEY COMPONENTS:
// - init_logging: picks and installs the backend
// - get_timestamp: timestamp for default seeds and file names
//
// AI-ASSISTANT-INFO: Logging utilities and helper functions

use anyhow::Result;
use log::LevelFilter;
use std::path::Path;

/// Returns the current local timestamp formatted as "YYYYMMDD_HHMMSS".
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Level used when RUST_LOG does not say otherwise.
pub fn default_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Installs the global logger.
pub fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let level = default_level(verbose);
    match log_file {
        Some(path) => slidereel_core::file_logging::setup_file_logging(path, level),
        None => {
            env_logger::Builder::from_env(
                env_logger::Env::default().default_filter_or(level.as_str()),
            )
            .format_timestamp(None)
            .format_target(false)
            .try_init()?;
            Ok(())
        }
    }
}
