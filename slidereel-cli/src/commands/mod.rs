//! Command implementations for the CLI.
//!
//! Each submodule implements one subcommand; the helpers here resolve the
//! inputs every command shares (effects configuration, cache directory and
//! image pool).

pub mod estimate;
pub mod prepare;
pub mod render;
pub mod transitions;

use crate::cli::InputArgs;
use crate::error::{CliErrorContext, CliResult};
use log::{debug, info};
use serde_json::Value;
use slidereel_core::discovery::is_image_file;
use slidereel_core::{CoreError, EffectsConfig, find_image_files};
use std::path::{Path, PathBuf};

/// Cache location used when neither `--cache-dir` nor `SLIDEREEL_CACHE_DIR` is set.
pub fn default_cache_dir() -> PathBuf {
    std::env::temp_dir().join("slidereel-cache")
}

/// Loads the effects configuration and applies environment overrides.
pub fn load_effects_config(path: Option<&Path>) -> CliResult<EffectsConfig> {
    let config = match path {
        Some(path) => EffectsConfig::load(path)?,
        None => {
            debug!("No effects config given, using built-in defaults");
            EffectsConfig::default()
        }
    };
    config.apply_env_overrides()
}

/// Expands `--input` values into the image pool.
///
/// Directories contribute their images in sorted order; files must be
/// images. The overall order follows the command line.
pub fn collect_images(args: &InputArgs) -> CliResult<Vec<PathBuf>> {
    let mut images = Vec::new();
    for input in &args.inputs {
        if input.is_dir() {
            let found = match find_image_files(input) {
                Err(CoreError::Io(e)) => {
                    return Err(e).cli_with_context(|| format!("scanning {}", input.display()));
                }
                other => other?,
            };
            debug!("{}: {} images", input.display(), found.len());
            images.extend(found);
        } else if is_image_file(input) {
            images.push(input.clone());
        } else if input.exists() {
            return Err(CoreError::InvalidInput(format!(
                "'{}' is not a supported image file",
                input.display()
            )));
        } else {
            return Err(CoreError::InvalidInput(format!(
                "Invalid input path '{}': not found",
                input.display()
            )));
        }
    }
    if images.is_empty() {
        return Err(CoreError::NoFilesFound);
    }
    info!("Image pool: {} images", images.len());
    Ok(images)
}

/// Checks that ffmpeg and ffprobe can be started.
pub fn require_tools() -> CliResult<()> {
    slidereel_core::check_dependency("ffmpeg")?;
    slidereel_core::check_dependency("ffprobe")?;
    Ok(())
}

/// Prints `value` as pretty JSON on stdout.
pub fn print_json(value: &Value) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
