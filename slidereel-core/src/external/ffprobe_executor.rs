//! FFprobe integration for media analysis
//!
//! Width, height and duration probes for source images and rendered videos.
//! A probe either returns what it found or a clear error; callers decide
//! whether a missing field is fatal.

use crate::error::{CoreError, CoreResult, command_failed_error, command_start_error};
use ffprobe::{FfProbeError, ffprobe};
use std::path::Path;

/// Dimensions and duration of a media file.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct MediaInfo {
    /// Width of the first video stream
    pub width: Option<u32>,
    /// Height of the first video stream
    pub height: Option<u32>,
    /// Duration in seconds, from the container or the video stream
    pub duration: Option<f64>,
}

/// Probes media files.
pub trait FfprobeExecutor {
    fn probe_media(&self, path: &Path) -> CoreResult<MediaInfo>;

    /// Width and height of the first video stream.
    fn probe_dimensions(&self, path: &Path) -> CoreResult<(u32, u32)> {
        let info = self.probe_media(path)?;
        match (info.width, info.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Ok((w, h)),
            _ => Err(CoreError::Probe(format!(
                "no usable dimensions in {}",
                path.display()
            ))),
        }
    }
}

/// `FfprobeExecutor` backed by the `ffprobe` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrateFfprobeExecutor;

impl CrateFfprobeExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl FfprobeExecutor for CrateFfprobeExecutor {
    fn probe_media(&self, path: &Path) -> CoreResult<MediaInfo> {
        log::debug!("Running ffprobe (via crate) on: {}", path.display());
        let metadata = ffprobe(path).map_err(|err| {
            log::warn!("ffprobe failed on {}: {:?}", path.display(), err);
            map_ffprobe_error(err, path)
        })?;

        let video_stream = metadata
            .streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"));

        let to_dimension = |value: Option<i64>| value.and_then(|v| u32::try_from(v).ok());

        let container_duration = metadata
            .format
            .duration
            .as_deref()
            .and_then(|d| d.parse::<f64>().ok());
        let stream_duration = video_stream
            .and_then(|s| s.duration.as_deref())
            .and_then(|d| d.parse::<f64>().ok());

        Ok(MediaInfo {
            width: video_stream.and_then(|s| to_dimension(s.width)),
            height: video_stream.and_then(|s| to_dimension(s.height)),
            duration: container_duration
                .or(stream_duration)
                .filter(|d| d.is_finite() && *d >= 0.0),
        })
    }
}

fn map_ffprobe_error(err: FfProbeError, path: &Path) -> CoreError {
    let context = format!("ffprobe ({})", path.display());
    match err {
        FfProbeError::Io(io_err) => command_start_error(context, io_err),
        FfProbeError::Status(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            command_failed_error(context, output.status, stderr)
        }
        FfProbeError::Deserialize(err) => {
            CoreError::Probe(format!("{context}: output deserialization: {err}"))
        }
        _ => CoreError::Probe(format!("{context}: unknown error: {err:?}")),
    }
}
