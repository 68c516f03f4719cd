//! Temporary file management utilities.
//!
//! Helpers for creating temporary files next to their final destination.
//! The tempfile crate handles cleanup via Drop, so partial results
//! disappear even on error paths.

use crate::error::CoreResult;
use std::path::{Path, PathBuf};
use tempfile::{Builder as TempFileBuilder, NamedTempFile};

/// Creates a temporary file with prefix and extension. Auto-deleted when dropped.
pub fn create_temp_file(dir: &Path, prefix: &str, extension: &str) -> CoreResult<NamedTempFile> {
    std::fs::create_dir_all(dir)?;
    let temp_file = TempFileBuilder::new()
        .prefix(&format!("{prefix}_"))
        .suffix(&format!(".{extension}"))
        .tempfile_in(dir)?;

    Ok(temp_file)
}

/// Returns a temporary file path with random suffix. Does not create the file.
///
/// Used for ffmpeg outputs, which must be written by the child process
/// before being renamed into place.
pub fn create_temp_file_path(dir: &Path, prefix: &str, extension: &str) -> PathBuf {
    use rand::Rng;
    use rand::distr::Alphanumeric;

    let random_suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect();

    let filename = format!(".{prefix}_{random_suffix}.{extension}");
    dir.join(filename)
}
