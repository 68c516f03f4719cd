//! File discovery module for finding source images.
//!
//! Scans the top level of a directory for still images (jpg, jpeg, png, webp,
//! bmp; case-insensitive). Results are sorted by path so that the pool order,
//! and therefore the schedule, does not depend on directory iteration order.

use crate::error::{CoreError, CoreResult};

use std::path::{Path, PathBuf};

/// Extensions accepted as source images.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "bmp"];

/// Checks if the given path is an image file by extension.
#[must_use]
pub fn is_image_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext_str| {
                IMAGE_EXTENSIONS
                    .iter()
                    .any(|known| ext_str.eq_ignore_ascii_case(known))
            })
            .unwrap_or(false)
}

/// Finds image files in the specified directory.
///
/// Does not search subdirectories.
///
/// # Returns
///
/// * `Ok(Vec<PathBuf>)` - Sorted paths of the discovered images
/// * `Err(CoreError::Io)` - If the directory cannot be read
/// * `Err(CoreError::NoFilesFound)` - If no images are found
///
/// # Examples
///
/// ```rust,no_run
/// use slidereel_core::find_image_files;
/// use std::path::Path;
///
/// let images = find_image_files(Path::new("/path/to/images")).unwrap();
/// println!("Found {} images", images.len());
/// ```
pub fn find_image_files(input_dir: &Path) -> CoreResult<Vec<PathBuf>> {
    let read_dir = std::fs::read_dir(input_dir)?;
    let mut files: Vec<PathBuf> = read_dir
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            is_image_file(&path).then_some(path)
        })
        .collect();

    if files.is_empty() {
        return Err(CoreError::NoFilesFound);
    }
    files.sort();
    Ok(files)
}
