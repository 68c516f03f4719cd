// ============================================================================
// slidereel-core/src/external/ffmpeg_executor.rs
// ============================================================================
//
// FFMPEG EXECUTOR: FFmpeg Process Management and Abstraction
//
// Traits for spawning ffmpeg and supervising the running child: its event
// stream is handed off to a reader thread while the caller polls for exit
// and enforces a timeout.
//
// KEY COMPONENTS:
// - FfmpegProcess: Trait representing an active FFmpeg process
// - FfmpegSpawner: Trait for creating new FFmpeg processes
// - SidecarSpawner / SidecarProcess: implementation using ffmpeg-sidecar
//
// AI-ASSISTANT-INFO: FFmpeg process management and execution abstraction

use crate::error::{CoreError, CoreResult, command_start_error, command_wait_error};
use ffmpeg_sidecar::child::FfmpegChild as SidecarChild;
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::FfmpegEvent;
use std::process::ExitStatus;

/// Event stream of a running ffmpeg child. Ends when the child's stderr closes.
pub type FfmpegEventStream = Box<dyn Iterator<Item = FfmpegEvent> + Send>;

/// Trait representing an active ffmpeg process instance.
pub trait FfmpegProcess {
    /// Takes the event stream. Only the first call succeeds.
    fn take_events(&mut self) -> CoreResult<FfmpegEventStream>;

    /// Returns the exit status if the process has finished.
    fn try_wait(&mut self) -> CoreResult<Option<ExitStatus>>;

    /// Kills the process.
    fn kill(&mut self) -> CoreResult<()>;

    /// Waits for the command to complete and returns its exit status.
    fn wait(&mut self) -> CoreResult<ExitStatus>;
}

/// Trait representing something that can spawn an FfmpegProcess.
pub trait FfmpegSpawner {
    type Process: FfmpegProcess;

    /// Spawns ffmpeg with `args` (everything after the binary name).
    fn spawn(&self, args: &[String]) -> CoreResult<Self::Process>;
}

// --- Concrete Implementation using ffmpeg-sidecar ---

/// Wrapper around `ffmpeg_sidecar::child::FfmpegChild` implementing `FfmpegProcess`.
pub struct SidecarProcess(SidecarChild);

impl FfmpegProcess for SidecarProcess {
    fn take_events(&mut self) -> CoreResult<FfmpegEventStream> {
        let iterator = self.0.iter().map_err(|e| {
            log::error!("Failed to get ffmpeg event iterator: {}", e);
            CoreError::OperationFailed(format!("ffmpeg event stream unavailable: {e}"))
        })?;
        Ok(Box::new(iterator))
    }

    fn try_wait(&mut self) -> CoreResult<Option<ExitStatus>> {
        self.0
            .as_inner_mut()
            .try_wait()
            .map_err(|e| command_wait_error("ffmpeg (sidecar)", e))
    }

    fn kill(&mut self) -> CoreResult<()> {
        self.0
            .kill()
            .map_err(|e| command_wait_error("ffmpeg (sidecar kill)", e))
    }

    fn wait(&mut self) -> CoreResult<ExitStatus> {
        self.0
            .wait()
            .map_err(|e| command_wait_error("ffmpeg (sidecar)", e))
    }
}

/// Concrete implementation of `FfmpegSpawner` using `ffmpeg-sidecar`.
#[derive(Debug, Clone, Default)]
pub struct SidecarSpawner;

impl FfmpegSpawner for SidecarSpawner {
    type Process = SidecarProcess;

    fn spawn(&self, args: &[String]) -> CoreResult<Self::Process> {
        let mut cmd = FfmpegCommand::new();
        cmd.args(args);
        log::debug!("Spawning ffmpeg: {:?}", cmd);
        cmd.spawn()
            .map(SidecarProcess)
            .map_err(|e| command_start_error("ffmpeg (sidecar)", e))
    }
}
