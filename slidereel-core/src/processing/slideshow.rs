// ============================================================================
// slidereel-core/src/processing/slideshow.rs
// ============================================================================
//
// SLIDESHOW ENGINE: Caller-facing API for slideshow synthesis
//
// One render is a synchronous pipeline:
// 1. Resolve the content type (configuration errors surface first)
// 2. Prepare the image pool for the output resolution
// 3. Query the encoder's xfade transitions
// 4. Build the seeded schedule
// 5. Synthesize the filter graph
// 6. Render with the codec profile for the output orientation
// 7. Validate the result
//
// The engine is generic over every external collaborator so the whole
// pipeline runs against fakes in tests.
//
// AI-ASSISTANT-INFO: Slideshow pipeline orchestration and caller-facing API

use crate::config::{CodecSettings, EffectsConfig, SlideshowRequest};
use crate::error::{CoreError, CoreResult};
use crate::external::{
    CrateFfprobeExecutor, FfmpegCapabilities, FfmpegSpawner, FfprobeExecutor, SidecarSpawner,
    TransitionCapabilities,
};
use crate::filtergraph::synthesize;
use crate::preprocess::{FfmpegImageOps, ImageOps, PrepareStats, PreparedPool, Preprocessor, RemoteCache};
use crate::render::{RenderJob, RenderOptions, render};
use crate::schedule::{Schedule, build_schedule, estimate_slot_count};
use crate::utils::{format_bytes, format_decimal};
use crate::validation::{ValidationReport, validate_output};

use log::{debug, info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Summary of one `render_slideshow` call.
#[derive(Debug, Clone, Serialize)]
pub struct RenderReport {
    pub output: PathBuf,
    pub slot_count: usize,
    /// Distinct transitions used, in order of first use.
    pub transitions: Vec<String>,
    pub prepare: PrepareStats,
    pub render_secs: f64,
    pub output_size: u64,
    pub validation: ValidationReport,
}

impl RenderReport {
    /// The boolean result of a render: encoded and validated.
    pub fn is_success(&self) -> bool {
        self.validation.is_valid()
    }
}

/// Deterministic slideshow renderer.
pub struct SlideshowEngine<
    S = SidecarSpawner,
    P = CrateFfprobeExecutor,
    C = FfmpegCapabilities,
    O = FfmpegImageOps,
> where
    O: ImageOps + 'static,
{
    spawner: S,
    probe: P,
    capabilities: C,
    preprocessor: Preprocessor<O>,
    config: EffectsConfig,
    cache_dir: PathBuf,
}

impl SlideshowEngine {
    /// Engine backed by the installed ffmpeg and ffprobe.
    pub fn new(config: EffectsConfig, cache_dir: impl Into<PathBuf>) -> Self {
        Self::with_components(
            SidecarSpawner,
            CrateFfprobeExecutor::new(),
            FfmpegCapabilities,
            FfmpegImageOps::new(),
            config,
            cache_dir,
        )
    }
}

impl<S, P, C, O> SlideshowEngine<S, P, C, O>
where
    S: FfmpegSpawner,
    P: FfprobeExecutor,
    C: TransitionCapabilities,
    O: ImageOps + 'static,
{
    pub fn with_components(
        spawner: S,
        probe: P,
        capabilities: C,
        ops: O,
        config: EffectsConfig,
        cache_dir: impl Into<PathBuf>,
    ) -> Self {
        let preprocessor = Preprocessor::new(ops, config.composite.clone(), config.preprocess.clone());
        Self {
            spawner,
            probe,
            capabilities,
            preprocessor,
            config,
            cache_dir: cache_dir.into(),
        }
    }

    /// Attaches a remote cache to the preprocessor.
    #[must_use]
    pub fn with_remote_cache(mut self, remote: Arc<dyn RemoteCache>) -> Self {
        self.preprocessor = self.preprocessor.with_remote_cache(remote);
        self
    }

    pub fn config(&self) -> &EffectsConfig {
        &self.config
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn preprocessor(&self) -> &Preprocessor<O> {
        &self.preprocessor
    }

    /// Transitions the installed encoder supports.
    pub fn supported_transitions(&self) -> CoreResult<Vec<String>> {
        self.capabilities.supported_transitions()
    }

    /// Prepares `images` for a `width`x`height` output.
    pub fn prepare(&self, images: &[PathBuf], width: u32, height: u32) -> CoreResult<PreparedPool> {
        self.preprocessor
            .prepare(images, width, height, &self.cache_dir)
    }

    /// Number of slots `render_slideshow` would schedule for a pool of two or
    /// more images.
    pub fn estimate_slot_count(&self, duration: f64, content_type: &str, seed: &str) -> CoreResult<usize> {
        let supported = self.capabilities.supported_transitions()?;
        estimate_slot_count(duration, content_type, seed, &self.config, &supported)
    }

    /// Builds the schedule for `images` as they will be rendered.
    pub fn plan(
        &self,
        images: &[PathBuf],
        duration: f64,
        content_type: &str,
        seed: &str,
    ) -> CoreResult<Schedule> {
        let supported = self.capabilities.supported_transitions()?;
        let schedule = build_schedule(images, duration, content_type, seed, &self.config, &supported)?;
        if schedule.len() > 1 && supported.is_empty() {
            return Err(CoreError::Capability(
                "installed ffmpeg has no xfade transitions".to_string(),
            ));
        }
        Ok(schedule)
    }

    /// Render options with the configured timeout.
    pub fn default_render_options(&self) -> RenderOptions {
        RenderOptions::with_timeout(Duration::from_secs(self.config.render.timeout_secs))
    }

    /// Renders `request` with the configured timeout.
    pub fn render_slideshow(&self, request: &SlideshowRequest) -> CoreResult<RenderReport> {
        self.render_slideshow_with(request, &self.default_render_options())
    }

    /// Runs the full pipeline for `request`.
    ///
    /// # Errors
    ///
    /// * `CoreError::Configuration` - invalid config or unknown content type
    /// * `CoreError::Capability` - multi-slot schedule without xfade support
    /// * `CoreError::Encode` / `CoreError::EncodeTimeout` - encoder failure
    ///
    /// A validation mismatch is not an error; it is reported in the returned
    /// `RenderReport` and the output is left in place.
    pub fn render_slideshow_with(
        &self,
        request: &SlideshowRequest,
        options: &RenderOptions,
    ) -> CoreResult<RenderReport> {
        self.config.validate()?;
        self.config.content_type(&request.content_type)?;

        info!(
            "Slideshow: {} images -> {} ({}x{}@{}, {}s, '{}', seed '{}')",
            request.images.len(),
            request.output.display(),
            request.width,
            request.height,
            request.fps,
            format_decimal(request.duration),
            request.content_type,
            request.seed
        );

        let pool = self.prepare(&request.images, request.width, request.height)?;
        let schedule = self.plan(
            &pool.paths(),
            request.duration,
            &request.content_type,
            &request.seed,
        )?;
        debug!(
            "Schedule: {} slots, transitions {:?}",
            schedule.len(),
            schedule.transitions_used()
        );

        let graph = synthesize(
            &schedule,
            request.width,
            request.height,
            request.fps,
            &self.config.ken_burns,
            &self.config.finishing,
        )?;
        let codec = CodecSettings::for_resolution(request.width, request.height, &self.config.render);
        let inputs: Vec<PathBuf> = schedule.slots.iter().map(|slot| slot.image.clone()).collect();
        let job = RenderJob {
            graph: &graph,
            inputs: &inputs,
            output: &request.output,
            duration: request.duration,
            fps: request.fps,
            codec: &codec,
        };
        let outcome = render(&self.spawner, &job, options)?;

        let validation = validate_output(
            &self.probe,
            &request.output,
            request.width,
            request.height,
            request.duration,
        );
        if !validation.is_valid() {
            warn!(
                "Output {} failed validation: {}",
                request.output.display(),
                validation.get_failures().join("; ")
            );
        }

        info!(
            "Slideshow {} finished: {} slots, {}",
            request.output.display(),
            schedule.len(),
            format_bytes(outcome.output_size)
        );

        // Dropping `pool` detaches any remote publish still in flight.
        Ok(RenderReport {
            output: request.output.clone(),
            slot_count: schedule.len(),
            transitions: schedule.transitions_used(),
            prepare: pool.stats.clone(),
            render_secs: outcome.elapsed.as_secs_f64(),
            output_size: outcome.output_size,
            validation,
        })
    }
}
