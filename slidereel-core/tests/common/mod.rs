// slidereel-core/tests/common/mod.rs
//
// In-process stand-ins for ffmpeg, ffprobe and image operations, shared by
// the integration tests.

#![allow(dead_code)]

use ffmpeg_sidecar::event::{FfmpegEvent, FfmpegProgress};
use slidereel_core::config::CompositeStyle;
use slidereel_core::external::ffmpeg_executor::FfmpegEventStream;
use slidereel_core::external::{FfmpegProcess, FfmpegSpawner, FfprobeExecutor, MediaInfo};
use slidereel_core::preprocess::ImageOps;
use slidereel_core::{CoreError, CoreResult};

use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// Helper to create a dummy file with some content
pub fn create_dummy_file(dir: &Path, filename: &str, content: &[u8]) -> PathBuf {
    let file_path = dir.join(filename);
    let mut file = File::create(&file_path).expect("Failed to create dummy file");
    file.write_all(content).expect("Failed to write dummy content");
    file_path
}

/// Creates `names` as small placeholder images in `dir`.
pub fn create_pool(dir: &Path, names: &[&str]) -> Vec<PathBuf> {
    names
        .iter()
        .map(|name| create_dummy_file(dir, name, format!("image {name}").as_bytes()))
        .collect()
}

/// File names in `dir`, sorted.
pub fn dir_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("readable dir")
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

pub fn exit_status(code: i32) -> ExitStatus {
    ExitStatus::from_raw(code << 8)
}

fn progress_event(seconds: f64) -> FfmpegEvent {
    let total_cs = (seconds * 100.0).round() as u64;
    let (h, rem) = (total_cs / 360_000, total_cs % 360_000);
    let (m, rem) = (rem / 6_000, rem % 6_000);
    let (s, cs) = (rem / 100, rem % 100);
    FfmpegEvent::Progress(FfmpegProgress {
        frame: (seconds * 30.0) as u32,
        fps: 30.0,
        size_kb: 512,
        time: format!("{h:02}:{m:02}:{s:02}.{cs:02}"),
        bitrate_kbps: 4000.0,
        speed: 2.0,
        q: 23.0,
        raw_log_message: String::new(),
    })
}

pub struct FakeProcess {
    events: Option<Vec<FfmpegEvent>>,
    code: i32,
}

impl FfmpegProcess for FakeProcess {
    fn take_events(&mut self) -> CoreResult<FfmpegEventStream> {
        let events = self
            .events
            .take()
            .ok_or_else(|| CoreError::OperationFailed("events already taken".to_string()))?;
        Ok(Box::new(events.into_iter()))
    }

    fn try_wait(&mut self) -> CoreResult<Option<ExitStatus>> {
        Ok(Some(exit_status(self.code)))
    }

    fn kill(&mut self) -> CoreResult<()> {
        Ok(())
    }

    fn wait(&mut self) -> CoreResult<ExitStatus> {
        Ok(exit_status(self.code))
    }
}

/// Encoder stand-in: records every invocation and, on success, writes a
/// non-empty file at the output path (the last argument).
#[derive(Clone, Default)]
pub struct FakeEncoder {
    calls: Arc<Mutex<Vec<Vec<String>>>>,
    exit_code: i32,
}

impl FakeEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exits with `code` and writes nothing.
    pub fn failing(code: i32) -> Self {
        Self {
            exit_code: code,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

/// Value following `flag` in `args`.
pub fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

impl FfmpegSpawner for FakeEncoder {
    type Process = FakeProcess;

    fn spawn(&self, args: &[String]) -> CoreResult<Self::Process> {
        self.calls.lock().unwrap().push(args.to_vec());

        let mut events = vec![FfmpegEvent::Log(
            ffmpeg_sidecar::event::LogLevel::Info,
            "fake encoder starting".to_string(),
        )];
        if let Some(duration) = arg_value(args, "-t").and_then(|t| t.parse::<f64>().ok()) {
            events.push(progress_event(duration / 2.0));
            events.push(progress_event(duration));
        }

        if self.exit_code == 0 {
            if let Some(output) = args.last() {
                std::fs::write(output, b"fake mp4 payload")?;
            }
        } else {
            events.push(FfmpegEvent::Log(
                ffmpeg_sidecar::event::LogLevel::Error,
                "Conversion failed!".to_string(),
            ));
        }

        Ok(FakeProcess {
            events: Some(events),
            code: self.exit_code,
        })
    }
}

/// Returns the same media info for every path that exists.
pub struct FakeProbe {
    pub info: MediaInfo,
}

impl FakeProbe {
    pub fn new(width: u32, height: u32, duration: f64) -> Self {
        Self {
            info: MediaInfo {
                width: Some(width),
                height: Some(height),
                duration: Some(duration),
            },
        }
    }
}

impl FfprobeExecutor for FakeProbe {
    fn probe_media(&self, path: &Path) -> CoreResult<MediaInfo> {
        if path.exists() {
            Ok(self.info)
        } else {
            Err(CoreError::Probe(format!("{} does not exist", path.display())))
        }
    }
}

#[derive(Default)]
struct OpsState {
    sizes: Mutex<HashMap<String, (u32, u32)>>,
    probes: AtomicUsize,
    composites: AtomicUsize,
    requested: Mutex<Vec<(PathBuf, u32, u32)>>,
}

/// Image operations keyed by file name, counting every call.
///
/// Images without a registered size fail to probe.
#[derive(Clone, Default)]
pub struct CountingOps {
    state: Arc<OpsState>,
}

impl CountingOps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_size(self, file_name: &str, width: u32, height: u32) -> Self {
        self.state
            .sizes
            .lock()
            .unwrap()
            .insert(file_name.to_string(), (width, height));
        self
    }

    pub fn probes(&self) -> usize {
        self.state.probes.load(Ordering::SeqCst)
    }

    pub fn composites(&self) -> usize {
        self.state.composites.load(Ordering::SeqCst)
    }

    pub fn operations(&self) -> usize {
        self.probes() + self.composites()
    }

    /// Every composite request as (source, width, height).
    pub fn requested(&self) -> Vec<(PathBuf, u32, u32)> {
        self.state.requested.lock().unwrap().clone()
    }
}

impl ImageOps for CountingOps {
    fn probe_dimensions(&self, path: &Path) -> CoreResult<(u32, u32)> {
        self.state.probes.fetch_add(1, Ordering::SeqCst);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.state
            .sizes
            .lock()
            .unwrap()
            .get(&name)
            .copied()
            .ok_or_else(|| CoreError::Probe(format!("no size registered for {name}")))
    }

    fn render_composite(
        &self,
        source: &Path,
        output: &Path,
        width: u32,
        height: u32,
        _style: &CompositeStyle,
    ) -> CoreResult<()> {
        self.state.composites.fetch_add(1, Ordering::SeqCst);
        self.state
            .requested
            .lock()
            .unwrap()
            .push((source.to_path_buf(), width, height));
        std::fs::write(
            output,
            format!("composite {width}x{height} of {}", source.display()),
        )?;
        Ok(())
    }
}
