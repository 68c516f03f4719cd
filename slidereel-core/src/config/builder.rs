// ============================================================================
// slidereel-core/src/config/builder.rs
// ============================================================================
//
// REQUEST BUILDER: Builder Pattern for SlideshowRequest
//
// Fluent construction of a render request with the standard defaults
// (1920x1080, 30 fps, "long" content type). Required fields are checked in
// `build()`, which reports a missing or invalid field as an error.
//
// AI-ASSISTANT-INFO: Builder pattern implementation for SlideshowRequest

// ---- Standard library imports ----
use std::path::PathBuf;

// ---- Internal crate imports ----
use crate::error::{CoreError, CoreResult};

/// A fully specified slideshow render.
#[derive(Debug, Clone, PartialEq)]
pub struct SlideshowRequest {
    pub images: Vec<PathBuf>,
    pub output: PathBuf,
    /// Target duration in seconds.
    pub duration: f64,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub content_type: String,
    pub seed: String,
}

/// Builder for creating SlideshowRequest instances.
///
/// # Examples
///
/// ```rust
/// use slidereel_core::config::SlideshowRequestBuilder;
/// use std::path::PathBuf;
///
/// let request = SlideshowRequestBuilder::new()
///     .images(vec![PathBuf::from("a.jpg"), PathBuf::from("b.jpg")])
///     .output(PathBuf::from("out.mp4"))
///     .duration(10.0)
///     .seed("abc123")
///     .build()
///     .unwrap();
/// assert_eq!(request.width, 1920);
/// assert_eq!(request.content_type, "long");
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct SlideshowRequestBuilder {
    // Required fields
    images: Vec<PathBuf>,
    output: Option<PathBuf>,
    duration: Option<f64>,

    // Optional fields with defaults
    width: u32,
    height: u32,
    fps: u32,
    content_type: String,
    seed: String,
}

impl Default for SlideshowRequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SlideshowRequestBuilder {
    /// Creates a new builder with default resolution, frame rate and content type.
    pub fn new() -> Self {
        Self {
            images: Vec::new(),
            output: None,
            duration: None,
            width: super::DEFAULT_WIDTH,
            height: super::DEFAULT_HEIGHT,
            fps: super::DEFAULT_FPS,
            content_type: super::DEFAULT_CONTENT_TYPE.to_string(),
            seed: String::new(),
        }
    }

    /// Sets the image pool, in presentation order.
    pub fn images(mut self, images: Vec<PathBuf>) -> Self {
        self.images = images;
        self
    }

    /// Sets the output video path.
    pub fn output(mut self, output: PathBuf) -> Self {
        self.output = Some(output);
        self
    }

    /// Sets the target duration in seconds.
    pub fn duration(mut self, seconds: f64) -> Self {
        self.duration = Some(seconds);
        self
    }

    /// Sets the output resolution.
    pub fn resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    /// Sets the content type name looked up in the effects configuration.
    pub fn content_type(mut self, content_type: &str) -> Self {
        self.content_type = content_type.to_string();
        self
    }

    /// Sets the schedule seed. Identical seeds give identical schedules.
    pub fn seed(mut self, seed: &str) -> Self {
        self.seed = seed.to_string();
        self
    }

    /// Builds the request.
    ///
    /// # Errors
    ///
    /// * `CoreError::InvalidInput` if the image pool is empty, the output or
    ///   duration is missing, the duration is not finite, or the resolution
    ///   or frame rate is zero
    pub fn build(self) -> CoreResult<SlideshowRequest> {
        if self.images.is_empty() {
            return Err(CoreError::InvalidInput("image pool is empty".to_string()));
        }
        let output = self
            .output
            .ok_or_else(|| CoreError::InvalidInput("output path is required".to_string()))?;
        let duration = self
            .duration
            .ok_or_else(|| CoreError::InvalidInput("duration is required".to_string()))?;
        if !duration.is_finite() {
            return Err(CoreError::InvalidInput(format!(
                "duration must be finite, got {duration}"
            )));
        }
        if self.width == 0 || self.height == 0 {
            return Err(CoreError::InvalidInput(format!(
                "resolution must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if self.fps == 0 {
            return Err(CoreError::InvalidInput("fps must be non-zero".to_string()));
        }

        Ok(SlideshowRequest {
            images: self.images,
            output,
            duration,
            width: self.width,
            height: self.height,
            fps: self.fps,
            content_type: self.content_type,
            seed: self.seed,
        })
    }
}
