//! Core library for deterministic slideshow video synthesis with ffmpeg.
//!
//! This crate turns a pool of still images into a slideshow video: it
//! normalizes undersized images into cached composites, builds a seeded
//! schedule of slots and transitions, synthesizes an ffmpeg filter graph,
//! renders it and validates the result. Identical inputs and seed always
//! produce the identical schedule and graph.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use slidereel_core::{EffectsConfig, SlideshowEngine, SlideshowRequestBuilder};
//! use std::path::{Path, PathBuf};
//!
//! let config = EffectsConfig::load(Path::new("effects.json")).unwrap();
//! let engine = SlideshowEngine::new(config, PathBuf::from("/var/cache/slidereel"));
//!
//! let images = slidereel_core::find_image_files(Path::new("/path/to/images")).unwrap();
//! let request = SlideshowRequestBuilder::new()
//!     .images(images)
//!     .output(PathBuf::from("/path/to/show.mp4"))
//!     .duration(60.0)
//!     .content_type("long")
//!     .seed("abc123")
//!     .build()
//!     .unwrap();
//!
//! let report = engine.render_slideshow(&request).unwrap();
//! assert!(report.is_success());
//! ```

pub mod config;
pub mod discovery;
pub mod error;
pub mod external;
pub mod file_logging;
pub mod filtergraph;
pub mod preprocess;
pub mod processing;
pub mod render;
pub mod schedule;
pub mod temp_files;
pub mod utils;
pub mod validation;

// Re-exports for public API
pub use config::{
    CodecSettings, EffectsConfig, RateControl, SlideshowRequest, SlideshowRequestBuilder,
};
pub use discovery::find_image_files;
pub use error::{CoreError, CoreResult};
pub use external::{MediaInfo, check_dependency};
pub use filtergraph::{FilterGraph, synthesize};
pub use preprocess::{PrepMode, PrepareStats, PreparedImage, PreparedPool, Preprocessor};
pub use processing::{RenderReport, SlideshowEngine};
pub use render::{ProgressCallback, RenderOptions};
pub use schedule::{Schedule, Slot, build_schedule, estimate_slot_count};
pub use temp_files::{create_temp_file, create_temp_file_path};
pub use utils::{format_bytes, format_duration, parse_ffmpeg_time};
pub use validation::{ValidationReport, validate_output};
