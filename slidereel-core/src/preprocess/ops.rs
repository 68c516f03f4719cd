//! Image operations used by the preprocessor.
//!
//! Probing and composite rendering sit behind `ImageOps` so that cache
//! behaviour can be tested by counting calls on a fake.

use super::composite::{composite_graph, composite_output_args};
use crate::config::CompositeStyle;
use crate::error::{CoreError, CoreResult};
use crate::external::{
    CrateFfprobeExecutor, FfmpegCommandBuilder, FfmpegProcess, FfmpegSpawner, FfprobeExecutor,
    SidecarSpawner,
};

use ffmpeg_sidecar::event::{FfmpegEvent, LogLevel};
use std::path::Path;

/// Image probing and composite generation.
pub trait ImageOps: Send + Sync {
    /// Width and height of `path`.
    fn probe_dimensions(&self, path: &Path) -> CoreResult<(u32, u32)>;

    /// Renders the composite of `source` into `output` (a JPEG).
    fn render_composite(
        &self,
        source: &Path,
        output: &Path,
        width: u32,
        height: u32,
        style: &CompositeStyle,
    ) -> CoreResult<()>;
}

/// `ImageOps` backed by ffprobe and ffmpeg.
#[derive(Debug, Clone, Default)]
pub struct FfmpegImageOps<S = SidecarSpawner, P = CrateFfprobeExecutor> {
    spawner: S,
    probe: P,
}

impl FfmpegImageOps {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S, P> FfmpegImageOps<S, P> {
    pub fn with_tools(spawner: S, probe: P) -> Self {
        Self { spawner, probe }
    }
}

impl<S, P> ImageOps for FfmpegImageOps<S, P>
where
    S: FfmpegSpawner + Send + Sync,
    P: FfprobeExecutor + Send + Sync,
{
    fn probe_dimensions(&self, path: &Path) -> CoreResult<(u32, u32)> {
        self.probe.probe_dimensions(path)
    }

    fn render_composite(
        &self,
        source: &Path,
        output: &Path,
        width: u32,
        height: u32,
        style: &CompositeStyle,
    ) -> CoreResult<()> {
        run_composite(&self.spawner, source, output, width, height, style)
    }
}

/// Runs one composite render through `spawner` and waits for it.
pub fn run_composite<S: FfmpegSpawner>(
    spawner: &S,
    source: &Path,
    output: &Path,
    width: u32,
    height: u32,
    style: &CompositeStyle,
) -> CoreResult<()> {
    let graph = composite_graph(style, width, height);
    let args = FfmpegCommandBuilder::new()
        .input(source)
        .filter_graph(&graph)
        .args(composite_output_args())
        .build(output);

    let mut process = spawner.spawn(&args)?;
    let mut errors = Vec::new();
    for event in process.take_events()? {
        match event {
            FfmpegEvent::Log(LogLevel::Error | LogLevel::Fatal, line)
            | FfmpegEvent::Error(line) => errors.push(line),
            _ => {}
        }
    }
    let status = process.wait()?;
    if !status.success() {
        return Err(CoreError::Encode {
            message: format!("composite for {} exited with {}", source.display(), status),
            stderr_tail: errors.join("\n"),
        });
    }
    Ok(())
}
