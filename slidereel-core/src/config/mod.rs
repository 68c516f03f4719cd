// ============================================================================
// slidereel-core/src/config/mod.rs
// ============================================================================
//
// CONFIGURATION: Typed Effects Configuration and Constants
//
// This module defines the effects configuration that drives scheduling,
// filter graph synthesis, composite generation and rendering. The
// configuration is loaded from a JSON file once, validated once, and then
// passed around as typed structs; no component looks up loose keys at its
// use site.
//
// KEY COMPONENTS:
// - EffectsConfig: root configuration, loadable from JSON
// - ContentTypeConfig: transition candidates and still-duration bounds
// - KenBurnsConfig / FinishingConfig / CompositeStyle: visual parameters
// - PreprocessConfig / RenderConfig: cache and encoder settings
//
// AI-ASSISTANT-INFO: Effects configuration structures and constants

mod builder;
mod codec;
pub mod utils;

pub use builder::{SlideshowRequest, SlideshowRequestBuilder};
pub use codec::{CodecSettings, RateControl};

use crate::error::{CoreError, CoreResult};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

// ============================================================================
// DEFAULT CONSTANTS
// ============================================================================

/// Default output width in pixels.
pub const DEFAULT_WIDTH: u32 = 1920;

/// Default output height in pixels.
pub const DEFAULT_HEIGHT: u32 = 1080;

/// Default output frame rate.
pub const DEFAULT_FPS: u32 = 30;

/// Content type used when the caller does not name one.
pub const DEFAULT_CONTENT_TYPE: &str = "long";

/// Hard bound on a single encoder invocation (10 minutes).
pub const DEFAULT_RENDER_TIMEOUT_SECS: u64 = 600;

/// Floor applied to a clamped still duration near the end of the schedule.
pub const MIN_CLAMPED_STILL_SECS: f64 = 0.1;

/// Transition every xfade-capable ffmpeg build provides.
pub const FALLBACK_TRANSITION: &str = "fade";

/// Relative tolerance for output duration validation (5%).
pub const DURATION_RELATIVE_TOLERANCE: f64 = 0.05;

// ============================================================================
// CONTENT TYPES
// ============================================================================

/// Scheduling parameters for one content type ("long", "short", ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentTypeConfig {
    /// Candidate xfade transition identifiers, intersected with what the
    /// installed ffmpeg supports.
    pub transitions: Vec<String>,

    /// Length of every cross-fade, in seconds.
    pub transition_duration: f64,

    /// Lower bound of the uniform still-duration draw, in seconds.
    pub still_min: f64,

    /// Upper bound of the uniform still-duration draw, in seconds.
    pub still_max: f64,
}

impl ContentTypeConfig {
    fn validate(&self, name: &str) -> CoreResult<()> {
        if self.transitions.is_empty() {
            return Err(CoreError::Configuration(format!(
                "content type '{name}' has no transition candidates"
            )));
        }
        if !(self.still_min > 0.0) || !self.still_min.is_finite() {
            return Err(CoreError::Configuration(format!(
                "content type '{name}': still_min must be positive, got {}",
                self.still_min
            )));
        }
        if !(self.still_max >= self.still_min) || !self.still_max.is_finite() {
            return Err(CoreError::Configuration(format!(
                "content type '{name}': still_max ({}) must be >= still_min ({})",
                self.still_max, self.still_min
            )));
        }
        if !(self.transition_duration > 0.0) || !self.transition_duration.is_finite() {
            return Err(CoreError::Configuration(format!(
                "content type '{name}': transition_duration must be positive, got {}",
                self.transition_duration
            )));
        }
        Ok(())
    }
}

// ============================================================================
// VISUAL EFFECTS
// ============================================================================

/// Ken Burns pan/zoom parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KenBurnsConfig {
    pub enabled: bool,
    /// Zoom factor at the tight end of the path (1.0 = no zoom).
    pub max_zoom: f64,
    /// Whether to pick a pan anchor besides the centre.
    pub pan: bool,
}

impl Default for KenBurnsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_zoom: 1.15,
            pan: true,
        }
    }
}

/// Finishing pass over the fully composed output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinishingConfig {
    pub vignette: bool,
    /// Vignette lens angle in radians.
    pub vignette_angle: f64,
    pub grain: bool,
    /// Temporal noise strength passed to ffmpeg's `noise` filter (0-100).
    pub grain_strength: u8,
}

impl Default for FinishingConfig {
    fn default() -> Self {
        Self {
            vignette: true,
            vignette_angle: std::f64::consts::PI / 5.0,
            grain: false,
            grain_strength: 8,
        }
    }
}

/// Look of the composites generated for undersized sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeStyle {
    /// Gaussian blur sigma applied to the cover-scaled background.
    pub blur_sigma: f64,
    /// Brightness offset for the background (-1.0 to 1.0; negative darkens).
    pub brightness: f64,
    /// Corner vignette angle in radians.
    pub vignette_angle: f64,
    /// Static grain strength (0-100).
    pub grain_strength: u8,
}

impl Default for CompositeStyle {
    fn default() -> Self {
        Self {
            blur_sigma: 30.0,
            brightness: -0.25,
            vignette_angle: std::f64::consts::PI / 4.0,
            grain_strength: 6,
        }
    }
}

// ============================================================================
// PREPROCESSING & RENDERING
// ============================================================================

/// Image cache behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Key prefix that separates caches of different tenants.
    pub cache_namespace: String,
    /// Opt-in partial-cache fast path: when at least this many entries are
    /// already valid, reuse them plus the raw pool and finish the pass in
    /// the background. `None` disables the fast path.
    pub partial_cache_min_entries: Option<usize>,
    /// Generate composites on the rayon pool.
    pub parallel: bool,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            cache_namespace: "default".to_string(),
            partial_cache_min_entries: None,
            parallel: true,
        }
    }
}

/// Encoder settings and bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub timeout_secs: u64,
    /// Profile used when width >= height.
    pub horizontal: CodecSettings,
    /// Profile used when height > width.
    pub vertical: CodecSettings,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_RENDER_TIMEOUT_SECS,
            horizontal: CodecSettings::horizontal_default(),
            vertical: CodecSettings::vertical_default(),
        }
    }
}

// ============================================================================
// ROOT CONFIGURATION
// ============================================================================

/// Root effects configuration.
///
/// # Examples
///
/// ```rust
/// use slidereel_core::config::EffectsConfig;
///
/// let config = EffectsConfig::default();
/// let long = config.content_type("long").unwrap();
/// assert!(long.still_max >= long.still_min);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectsConfig {
    pub content_types: BTreeMap<String, ContentTypeConfig>,
    #[serde(default)]
    pub ken_burns: KenBurnsConfig,
    #[serde(default)]
    pub finishing: FinishingConfig,
    #[serde(default)]
    pub composite: CompositeStyle,
    #[serde(default)]
    pub preprocess: PreprocessConfig,
    #[serde(default)]
    pub render: RenderConfig,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        let mut content_types = BTreeMap::new();
        content_types.insert(
            "long".to_string(),
            ContentTypeConfig {
                transitions: vec![
                    "fade".to_string(),
                    "dissolve".to_string(),
                    "smoothleft".to_string(),
                    "smoothright".to_string(),
                    "circleopen".to_string(),
                ],
                transition_duration: 1.0,
                still_min: 3.0,
                still_max: 6.0,
            },
        );
        content_types.insert(
            "short".to_string(),
            ContentTypeConfig {
                transitions: vec![
                    "fade".to_string(),
                    "slideleft".to_string(),
                    "slideright".to_string(),
                    "zoomin".to_string(),
                    "wipeup".to_string(),
                ],
                transition_duration: 0.5,
                still_min: 1.5,
                still_max: 3.0,
            },
        );

        Self {
            content_types,
            ken_burns: KenBurnsConfig::default(),
            finishing: FinishingConfig::default(),
            composite: CompositeStyle::default(),
            preprocess: PreprocessConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

impl EffectsConfig {
    /// Reads, parses and validates an effects configuration file.
    ///
    /// A missing or unreadable file is a configuration error, which the
    /// caller is expected to answer with a simpler render strategy.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            CoreError::Configuration(format!(
                "cannot read effects config {}: {e}",
                path.display()
            ))
        })?;
        let config = Self::from_json_str(&raw).map_err(|e| match e {
            CoreError::Configuration(msg) => {
                CoreError::Configuration(format!("{}: {msg}", path.display()))
            }
            other => other,
        })?;
        log::debug!(
            "Loaded effects config from {} ({} content types)",
            path.display(),
            config.content_types.len()
        );
        Ok(config)
    }

    /// Parses and validates a JSON effects configuration.
    pub fn from_json_str(raw: &str) -> CoreResult<Self> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|e| CoreError::Configuration(format!("invalid effects config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every section once, at load time.
    pub fn validate(&self) -> CoreResult<()> {
        if self.content_types.is_empty() {
            return Err(CoreError::Configuration(
                "no content types configured".to_string(),
            ));
        }
        for (name, content_type) in &self.content_types {
            content_type.validate(name)?;
        }
        if !(self.ken_burns.max_zoom >= 1.0) || !self.ken_burns.max_zoom.is_finite() {
            return Err(CoreError::Configuration(format!(
                "ken_burns.max_zoom must be >= 1.0, got {}",
                self.ken_burns.max_zoom
            )));
        }
        if self.finishing.grain_strength > 100 || self.composite.grain_strength > 100 {
            return Err(CoreError::Configuration(
                "grain_strength must be within 0-100".to_string(),
            ));
        }
        if !(self.composite.blur_sigma >= 0.0) {
            return Err(CoreError::Configuration(format!(
                "composite.blur_sigma must be >= 0, got {}",
                self.composite.blur_sigma
            )));
        }
        if !(-1.0..=1.0).contains(&self.composite.brightness) {
            return Err(CoreError::Configuration(format!(
                "composite.brightness must be within -1.0..=1.0, got {}",
                self.composite.brightness
            )));
        }
        if self.render.timeout_secs == 0 {
            return Err(CoreError::Configuration(
                "render.timeout_secs must be positive".to_string(),
            ));
        }
        self.render.horizontal.validate()?;
        self.render.vertical.validate()?;
        Ok(())
    }

    /// Looks up a content type by name and checks its timing.
    ///
    /// The fields are public, so a config built in code may never have been
    /// through [`EffectsConfig::validate`]; the entry is checked on every
    /// lookup.
    pub fn content_type(&self, name: &str) -> CoreResult<&ContentTypeConfig> {
        let content_type = self.content_types.get(name).ok_or_else(|| {
            CoreError::Configuration(format!(
                "unknown content type '{name}' (configured: {})",
                self.content_types
                    .keys()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        })?;
        content_type.validate(name)?;
        Ok(content_type)
    }

    /// Applies `SLIDEREEL_*` environment overrides on top of the loaded values.
    pub fn apply_env_overrides(mut self) -> CoreResult<Self> {
        self.render.timeout_secs =
            utils::get_env_u64("SLIDEREEL_RENDER_TIMEOUT_SECS", self.render.timeout_secs);
        self.preprocess.cache_namespace = utils::get_env_string(
            "SLIDEREEL_CACHE_NAMESPACE",
            self.preprocess.cache_namespace,
        );
        if let Some(min_entries) = utils::get_env_opt_usize("SLIDEREEL_PARTIAL_CACHE_MIN") {
            self.preprocess.partial_cache_min_entries = Some(min_entries);
        }
        self.ken_burns.enabled =
            utils::get_env_bool("SLIDEREEL_KEN_BURNS", self.ken_burns.enabled);
        self.validate()?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EffectsConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.content_type("long").is_ok());
        assert!(config.content_type("short").is_ok());
    }

    #[test]
    fn test_unknown_content_type_is_configuration_error() {
        let config = EffectsConfig::default();
        match config.content_type("podcast-xl") {
            Err(CoreError::Configuration(msg)) => {
                assert!(msg.contains("podcast-xl"));
                assert!(msg.contains("long"));
            }
            other => panic!("expected configuration error, got {other:?}"),
        }
    }

    #[test]
    fn test_minimal_json_uses_section_defaults() {
        let raw = r#"{
            "content_types": {
                "long": {
                    "transitions": ["fade", "wipeleft"],
                    "transition_duration": 1.0,
                    "still_min": 3.0,
                    "still_max": 6.0
                }
            }
        }"#;
        let config = EffectsConfig::from_json_str(raw).unwrap();
        assert_eq!(config.ken_burns, KenBurnsConfig::default());
        assert_eq!(config.render.timeout_secs, DEFAULT_RENDER_TIMEOUT_SECS);
        assert_eq!(
            config.content_type("long").unwrap().transitions,
            vec!["fade", "wipeleft"]
        );
    }

    #[test]
    fn test_inverted_still_bounds_rejected() {
        let raw = r#"{
            "content_types": {
                "long": {
                    "transitions": ["fade"],
                    "transition_duration": 1.0,
                    "still_min": 6.0,
                    "still_max": 3.0
                }
            }
        }"#;
        assert!(matches!(
            EffectsConfig::from_json_str(raw),
            Err(CoreError::Configuration(_))
        ));
    }

    #[test]
    fn test_content_type_lookup_checks_edited_timing() {
        let mut config = EffectsConfig::default();
        if let Some(long) = config.content_types.get_mut("long") {
            long.still_max = long.still_min / 2.0;
        }
        assert!(matches!(
            config.content_type("long"),
            Err(CoreError::Configuration(_))
        ));
        assert!(config.content_type("short").is_ok());
    }

    #[test]
    fn test_zoom_below_one_rejected() {
        let mut config = EffectsConfig::default();
        config.ken_burns.max_zoom = 0.9;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = EffectsConfig::load(&dir.path().join("effects.json"));
        assert!(matches!(result, Err(CoreError::Configuration(_))));
    }

    #[test]
    fn test_load_round_trips_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("effects.json");
        let config = EffectsConfig::default();
        std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
        assert_eq!(EffectsConfig::load(&path).unwrap(), config);
    }
}
