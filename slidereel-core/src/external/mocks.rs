// slidereel-core/src/external/mocks.rs

// --- Mocking Infrastructure (for testing) ---

use super::*;
use crate::error::{CoreError, CoreResult};
use crate::external::ffmpeg_executor::FfmpegEventStream;
use ffmpeg_sidecar::event::FfmpegEvent;
use std::cell::RefCell;
use std::collections::HashMap;
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::rc::Rc;
use std::sync::Mutex;

/// Builds an `ExitStatus` carrying `code` as the process exit code.
pub fn exit_status(code: i32) -> ExitStatus {
    ExitStatus::from_raw(code << 8)
}

/// Mock implementation of FfmpegProcess.
pub struct MockFfmpegProcess {
    events_to_emit: Option<Vec<FfmpegEvent>>,
    exit_status: ExitStatus,
    /// Never exits on its own; only `kill` ends it.
    hangs: bool,
    killed: bool,
}

impl FfmpegProcess for MockFfmpegProcess {
    fn take_events(&mut self) -> CoreResult<FfmpegEventStream> {
        let events = self.events_to_emit.take().ok_or_else(|| {
            CoreError::OperationFailed("mock event stream already taken".to_string())
        })?;
        Ok(Box::new(events.into_iter()))
    }

    fn try_wait(&mut self) -> CoreResult<Option<ExitStatus>> {
        if self.killed {
            Ok(Some(exit_status(255)))
        } else if self.hangs {
            Ok(None)
        } else {
            Ok(Some(self.exit_status))
        }
    }

    fn kill(&mut self) -> CoreResult<()> {
        self.killed = true;
        Ok(())
    }

    fn wait(&mut self) -> CoreResult<ExitStatus> {
        match self.try_wait()? {
            Some(status) => Ok(status),
            None => Err(CoreError::OperationFailed(
                "mock process waited on while hanging".to_string(),
            )),
        }
    }
}

enum MockOutcome {
    Exit { events: Vec<FfmpegEvent>, code: i32 },
    Hang,
    SpawnError(CoreError),
}

/// Represents an expected ffmpeg command call and its mock result.
struct MockFfmpegExpectation {
    arg_pattern: String,
    outcome: MockOutcome,
    create_dummy_output: bool,
}

/// Mock implementation of FfmpegSpawner supporting multiple expectations.
#[derive(Clone, Default)]
pub struct MockFfmpegSpawner {
    expectations: Rc<RefCell<Vec<MockFfmpegExpectation>>>,
    received_calls: Rc<RefCell<Vec<Vec<String>>>>,
}

impl MockFfmpegSpawner {
    pub fn new() -> Self {
        Default::default()
    }

    fn add_expectation(&self, arg_pattern: &str, outcome: MockOutcome, create_dummy_output: bool) {
        self.expectations.borrow_mut().push(MockFfmpegExpectation {
            arg_pattern: arg_pattern.to_string(),
            outcome,
            create_dummy_output,
        });
    }

    pub fn add_success_expectation(
        &self,
        arg_pattern: &str,
        events: Vec<FfmpegEvent>,
        create_dummy_output: bool,
    ) {
        self.add_expectation(arg_pattern, MockOutcome::Exit { events, code: 0 }, create_dummy_output);
    }

    pub fn add_exit_error_expectation(
        &self,
        arg_pattern: &str,
        events: Vec<FfmpegEvent>,
        exit_code: i32,
    ) {
        self.add_expectation(
            arg_pattern,
            MockOutcome::Exit {
                events,
                code: exit_code,
            },
            false,
        );
    }

    pub fn add_hang_expectation(&self, arg_pattern: &str) {
        self.add_expectation(arg_pattern, MockOutcome::Hang, true);
    }

    pub fn add_spawn_error_expectation(&self, arg_pattern: &str, error: CoreError) {
        self.add_expectation(arg_pattern, MockOutcome::SpawnError(error), false);
    }

    pub fn get_received_calls(&self) -> Vec<Vec<String>> {
        self.received_calls.borrow().clone()
    }
}

impl FfmpegSpawner for MockFfmpegSpawner {
    type Process = MockFfmpegProcess;

    fn spawn(&self, args: &[String]) -> CoreResult<Self::Process> {
        self.received_calls.borrow_mut().push(args.to_vec());

        let mut expectations = self.expectations.borrow_mut();
        let found_index = expectations
            .iter()
            .position(|exp| args.iter().any(|arg| arg.contains(&exp.arg_pattern)));

        let Some(index) = found_index else {
            panic!("MockFfmpegSpawner: No expectation found for command args: {args:?}");
        };
        let expectation = expectations.remove(index);

        if expectation.create_dummy_output {
            if let Some(output_path) = args.last().map(PathBuf::from) {
                if let Some(parent) = output_path.parent() {
                    let _ = std::fs::create_dir_all(parent);
                }
                let _ = std::fs::write(&output_path, b"mock ffmpeg output");
            }
        }

        match expectation.outcome {
            MockOutcome::Exit { events, code } => Ok(MockFfmpegProcess {
                events_to_emit: Some(events),
                exit_status: exit_status(code),
                hangs: false,
                killed: false,
            }),
            MockOutcome::Hang => Ok(MockFfmpegProcess {
                events_to_emit: Some(Vec::new()),
                exit_status: exit_status(0),
                hangs: true,
                killed: false,
            }),
            MockOutcome::SpawnError(err) => Err(err),
        }
    }
}

/// Mock implementation of FfprobeExecutor.
#[derive(Default)]
pub struct MockFfprobeExecutor {
    results: Mutex<HashMap<PathBuf, MediaInfo>>,
}

impl MockFfprobeExecutor {
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the probe result for a path. Unset paths fail to probe.
    pub fn expect_media(&self, path: &Path, info: MediaInfo) {
        if let Ok(mut results) = self.results.lock() {
            results.insert(path.to_path_buf(), info);
        }
    }
}

impl FfprobeExecutor for MockFfprobeExecutor {
    fn probe_media(&self, path: &Path) -> CoreResult<MediaInfo> {
        let results = self
            .results
            .lock()
            .map_err(|_| CoreError::Probe("mock probe poisoned".to_string()))?;
        results.get(path).copied().ok_or_else(|| {
            CoreError::Probe(format!(
                "MockFfprobeExecutor: No expectation set for path {}",
                path.display()
            ))
        })
    }
}
