//! Error types for slidereel-core.
//!
//! Every failure the core can produce is an explicit `CoreError` value. The
//! caller decides what to do with it; render-strategy fallbacks are signalled
//! through [`CoreError::is_fallback_eligible`].

use std::process::ExitStatus;
use thiserror::Error;

/// Custom error types for slidereel-core
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Effects configuration missing, unreadable or invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The installed encoder lacks a feature the graph requires.
    #[error("Encoder capability missing: {0}")]
    Capability(String),

    #[error("Encode failed: {message}")]
    Encode {
        message: String,
        stderr_tail: String,
    },

    #[error("Encode timed out after {seconds} seconds")]
    EncodeTimeout { seconds: u64, stderr_tail: String },

    #[error("Failed to start command '{0}': {1}")]
    CommandStart(String, std::io::Error),

    #[error("Failed waiting for command '{0}': {1}")]
    CommandWait(String, std::io::Error),

    #[error("Command '{0}' failed with status {1}: {2}")]
    CommandFailed(String, ExitStatus, String),

    #[error("Probe failed: {0}")]
    Probe(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required dependency not found: {0}")]
    DependencyNotFound(String),

    #[error("No image files found")]
    NoFilesFound,

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

/// Result type for slidereel-core operations
pub type CoreResult<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Whether the caller should retry with a simpler render strategy.
    pub fn is_fallback_eligible(&self) -> bool {
        matches!(
            self,
            CoreError::Configuration(_)
                | CoreError::Capability(_)
                | CoreError::Encode { .. }
                | CoreError::EncodeTimeout { .. }
        )
    }

    /// Tail of the encoder's stderr, when the error carries one.
    pub fn stderr_tail(&self) -> Option<&str> {
        match self {
            CoreError::Encode { stderr_tail, .. } | CoreError::EncodeTimeout { stderr_tail, .. } => {
                Some(stderr_tail.as_str())
            }
            _ => None,
        }
    }
}

pub fn command_start_error(cmd: impl Into<String>, err: std::io::Error) -> CoreError {
    CoreError::CommandStart(cmd.into(), err)
}

pub fn command_wait_error(cmd: impl Into<String>, err: std::io::Error) -> CoreError {
    CoreError::CommandWait(cmd.into(), err)
}

pub fn command_failed_error(
    cmd: impl Into<String>,
    status: ExitStatus,
    stderr: impl Into<String>,
) -> CoreError {
    CoreError::CommandFailed(cmd.into(), status, stderr.into())
}
