// ============================================================================
// slidereel-core/src/render/mod.rs
// ============================================================================
//
// RENDER EXECUTOR: Runs the slideshow encode as one ffmpeg subprocess
//
// One looped single-frame input per slot, the synthesized filter graph, the
// codec profile for the output orientation, and an explicit -t clamp. The
// encoder writes to a hidden temporary file next to the output which is
// renamed into place only after a clean exit with a non-empty result.
//
// The child's event stream is drained on a separate thread while this thread
// polls for exit, enforcing the timeout and honouring caller cancellation.
// There is no retry here; callers decide how to fall back.
//
// AI-ASSISTANT-INFO: ffmpeg render invocation with timeout and stderr tail

pub mod events;

pub use events::{ProgressCallback, RenderEventHandler, STDERR_TAIL_LINES};

use crate::config::CodecSettings;
use crate::error::{CoreError, CoreResult};
use crate::external::{FfmpegCommandBuilder, FfmpegProcess, FfmpegSpawner};
use crate::filtergraph::FilterGraph;
use crate::temp_files::create_temp_file_path;
use crate::utils::{display_name, format_bytes, format_decimal};

use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Everything that goes into the ffmpeg argument list.
#[derive(Debug, Clone)]
pub struct RenderJob<'a> {
    pub graph: &'a FilterGraph,
    /// One image per slot, in slot order.
    pub inputs: &'a [PathBuf],
    pub output: &'a Path,
    pub duration: f64,
    pub fps: u32,
    pub codec: &'a CodecSettings,
}

/// Supervision settings for one render.
#[derive(Clone)]
pub struct RenderOptions {
    pub timeout: Duration,
    pub progress: Option<ProgressCallback>,
    /// Set to abort the render; the encoder is killed on the next poll.
    pub cancel: Option<Arc<AtomicBool>>,
}

impl RenderOptions {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            progress: None,
            cancel: None,
        }
    }
}

impl std::fmt::Debug for RenderOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderOptions")
            .field("timeout", &self.timeout)
            .field("progress", &self.progress.is_some())
            .field("cancel", &self.cancel)
            .finish()
    }
}

/// Successful render summary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOutcome {
    pub elapsed: Duration,
    pub output_size: u64,
}

/// Builds the ffmpeg arguments for `job`, writing to `output`.
pub fn build_render_args(job: &RenderJob<'_>, output: &Path) -> CoreResult<Vec<String>> {
    if job.inputs.len() != job.graph.input_count() {
        return Err(CoreError::InvalidInput(format!(
            "filter graph expects {} inputs but {} were given",
            job.graph.input_count(),
            job.inputs.len()
        )));
    }
    if !(job.duration.is_finite() && job.duration > 0.0) {
        return Err(CoreError::InvalidInput(format!(
            "render duration must be positive, got {}",
            job.duration
        )));
    }

    let mut builder = FfmpegCommandBuilder::new();
    for input in job.inputs {
        builder = builder.looped_image_input(input, job.fps);
    }
    Ok(builder
        .filter_graph(job.graph)
        .args(job.codec.to_args())
        .args(["-pix_fmt", "yuv420p"])
        .args(["-r".to_string(), job.fps.to_string()])
        .args(["-t".to_string(), format_decimal(job.duration)])
        .args(["-movflags", "+faststart"])
        .build(output))
}

/// Renders `job` through `spawner` and waits for it under `options`.
pub fn render<S: FfmpegSpawner>(
    spawner: &S,
    job: &RenderJob<'_>,
    options: &RenderOptions,
) -> CoreResult<RenderOutcome> {
    let output_dir = job
        .output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(output_dir)?;
    let extension = job
        .output
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("mp4");
    let temp_output = create_temp_file_path(output_dir, "render", extension);

    let args = build_render_args(job, &temp_output)?;
    info!(
        "Rendering {} ({} inputs, {}s at {} fps)",
        display_name(job.output),
        job.inputs.len(),
        format_decimal(job.duration),
        job.fps
    );
    debug!("ffmpeg {}", args.join(" "));

    let started = Instant::now();
    let result = supervise(spawner, &args, job, options, started);

    match result {
        Ok(()) => {
            let size = std::fs::metadata(&temp_output).map(|m| m.len()).unwrap_or(0);
            if size == 0 {
                let _ = std::fs::remove_file(&temp_output);
                return Err(CoreError::Encode {
                    message: format!("ffmpeg produced no output for {}", job.output.display()),
                    stderr_tail: String::new(),
                });
            }
            std::fs::rename(&temp_output, job.output).inspect_err(|_| {
                let _ = std::fs::remove_file(&temp_output);
            })?;
            let elapsed = started.elapsed();
            info!(
                "Rendered {} ({}) in {:.1}s",
                display_name(job.output),
                format_bytes(size),
                elapsed.as_secs_f64()
            );
            Ok(RenderOutcome {
                elapsed,
                output_size: size,
            })
        }
        Err(e) => {
            if temp_output.exists() {
                if let Err(remove_err) = std::fs::remove_file(&temp_output) {
                    warn!(
                        "Failed to remove partial output {}: {}",
                        temp_output.display(),
                        remove_err
                    );
                }
            }
            Err(e)
        }
    }
}

fn supervise<S: FfmpegSpawner>(
    spawner: &S,
    args: &[String],
    job: &RenderJob<'_>,
    options: &RenderOptions,
    started: Instant,
) -> CoreResult<()> {
    let mut process = spawner.spawn(args)?;
    let events = match process.take_events() {
        Ok(events) => events,
        Err(e) => {
            let _ = process.kill();
            return Err(e);
        }
    };

    let mut handler =
        RenderEventHandler::new(job.duration, &display_name(job.output), options.progress.clone());
    let drain = std::thread::spawn(move || {
        for event in events {
            handler.handle_event(event);
        }
        handler.into_stderr_tail()
    });
    let collect_tail = |drain: std::thread::JoinHandle<String>| {
        drain.join().unwrap_or_else(|_| {
            warn!("ffmpeg event reader panicked");
            String::new()
        })
    };

    let status = loop {
        if let Some(status) = process.try_wait()? {
            break status;
        }
        if options
            .cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
        {
            warn!("Render of {} cancelled", display_name(job.output));
            kill_and_reap(&mut process);
            collect_tail(drain);
            return Err(CoreError::OperationFailed("render cancelled".to_string()));
        }
        if started.elapsed() >= options.timeout {
            warn!(
                "Render of {} exceeded {}s, killing ffmpeg",
                display_name(job.output),
                options.timeout.as_secs()
            );
            kill_and_reap(&mut process);
            return Err(CoreError::EncodeTimeout {
                seconds: options.timeout.as_secs(),
                stderr_tail: collect_tail(drain),
            });
        }
        std::thread::sleep(POLL_INTERVAL);
    };

    let stderr_tail = collect_tail(drain);
    if !status.success() {
        return Err(CoreError::Encode {
            message: format!("ffmpeg exited with {status}"),
            stderr_tail,
        });
    }
    Ok(())
}

fn kill_and_reap<P: FfmpegProcess>(process: &mut P) {
    if let Err(e) = process.kill() {
        warn!("Failed to kill ffmpeg: {e}");
    }
    if let Err(e) = process.wait() {
        debug!("Waiting for killed ffmpeg failed: {e}");
    }
}
