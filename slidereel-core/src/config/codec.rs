// ============================================================================
// slidereel-core/src/config/codec.rs
// ============================================================================
//
// CODEC SETTINGS: Encoder Profiles and Rate Control
//
// Holds the per-orientation encoder profile (codec, profile, preset) and the
// two supported rate-control modes. The render executor turns these into
// ffmpeg arguments; nothing else interprets them.
//
// AI-ASSISTANT-INFO: Codec profile selection by aspect ratio

use super::RenderConfig;
use crate::error::{CoreError, CoreResult};

use serde::{Deserialize, Serialize};

/// Rate-control mode for the video encoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RateControl {
    /// Constrained bitrate, e.g. `"8M"`, `"10M"`, `"16M"`.
    Bitrate {
        bitrate: String,
        maxrate: String,
        bufsize: String,
    },
    /// Constant quality factor.
    Quality { crf: u8 },
}

/// Encoder profile applied to one output orientation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodecSettings {
    pub codec: String,
    pub profile: String,
    pub preset: String,
    pub rate_control: RateControl,
}

impl CodecSettings {
    pub fn horizontal_default() -> Self {
        Self {
            codec: "libx264".to_string(),
            profile: "high".to_string(),
            preset: "medium".to_string(),
            rate_control: RateControl::Bitrate {
                bitrate: "8M".to_string(),
                maxrate: "10M".to_string(),
                bufsize: "16M".to_string(),
            },
        }
    }

    pub fn vertical_default() -> Self {
        Self {
            codec: "libx264".to_string(),
            profile: "high".to_string(),
            preset: "medium".to_string(),
            rate_control: RateControl::Bitrate {
                bitrate: "6M".to_string(),
                maxrate: "8M".to_string(),
                bufsize: "12M".to_string(),
            },
        }
    }

    /// Picks the vertical profile when the frame is taller than wide,
    /// otherwise the horizontal one.
    pub fn for_resolution(width: u32, height: u32, render: &RenderConfig) -> Self {
        if height > width {
            render.vertical.clone()
        } else {
            render.horizontal.clone()
        }
    }

    /// Returns a copy with the rate control replaced.
    #[must_use]
    pub fn with_rate_control(mut self, rate_control: RateControl) -> Self {
        self.rate_control = rate_control;
        self
    }

    /// Encoder arguments for this profile, in ffmpeg order.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "-c:v".to_string(),
            self.codec.clone(),
            "-profile:v".to_string(),
            self.profile.clone(),
            "-preset".to_string(),
            self.preset.clone(),
        ];
        match &self.rate_control {
            RateControl::Bitrate {
                bitrate,
                maxrate,
                bufsize,
            } => {
                args.extend([
                    "-b:v".to_string(),
                    bitrate.clone(),
                    "-maxrate".to_string(),
                    maxrate.clone(),
                    "-bufsize".to_string(),
                    bufsize.clone(),
                ]);
            }
            RateControl::Quality { crf } => {
                args.extend(["-crf".to_string(), crf.to_string()]);
            }
        }
        args
    }

    pub(crate) fn validate(&self) -> CoreResult<()> {
        if self.codec.trim().is_empty() {
            return Err(CoreError::Configuration("codec must not be empty".to_string()));
        }
        match &self.rate_control {
            RateControl::Bitrate {
                bitrate,
                maxrate,
                bufsize,
            } if bitrate.is_empty() || maxrate.is_empty() || bufsize.is_empty() => Err(
                CoreError::Configuration("bitrate, maxrate and bufsize are required".to_string()),
            ),
            RateControl::Quality { crf } if *crf > 63 => Err(CoreError::Configuration(format!(
                "crf must be within 0-63, got {crf}"
            ))),
            _ => Ok(()),
        }
    }
}
