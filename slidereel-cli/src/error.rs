// ============================================================================
// slidereel-cli/src/error.rs
// ============================================================================
//
// CLI ERROR HANDLING: Error types and utilities for the CLI
//
// Commands return core errors directly; this module adds a context helper
// and an exit-code mapping used by main.rs.
//
// KEY COMPONENTS:
// - CliResult: Type alias for CLI operations
// - CliErrorContext: context wrapping into CoreError
// - exit_code: process exit status per error kind
//
// AI-ASSISTANT-INFO: CLI error handling utilities

// ---- Internal crate imports ----
use slidereel_core::{CoreError, CoreResult};

// ---- Standard library imports ----
use std::fmt;

/// Type alias for CLI results using CoreError.
pub type CliResult<T> = CoreResult<T>;

/// Extension trait for adding context to errors in the CLI.
pub trait CliErrorContext<T> {
    /// Add context using a closure (for lazy evaluation).
    fn cli_with_context<C, F>(self, f: F) -> CliResult<T>
    where
        C: fmt::Display,
        F: FnOnce() -> C;
}

impl<T, E> CliErrorContext<T> for Result<T, E>
where
    E: Into<CoreError>,
{
    fn cli_with_context<C, F>(self, f: F) -> CliResult<T>
    where
        C: fmt::Display,
        F: FnOnce() -> C,
    {
        self.map_err(|e| {
            let core_error: CoreError = e.into();
            CoreError::OperationFailed(format!("{}: {}", f(), core_error))
        })
    }
}

/// Creates a CLI error with a formatted message.
#[macro_export]
macro_rules! cli_error {
    ($($arg:tt)*) => {
        ::slidereel_core::CoreError::OperationFailed(format!($($arg)*))
    };
}

/// Exit status for a failed command.
///
/// Input and configuration problems exit with 2, missing tools with 3,
/// encoder failures with 4 and everything else with 1.
pub fn exit_code(error: &CoreError) -> i32 {
    match error {
        CoreError::InvalidInput(_) | CoreError::NoFilesFound | CoreError::Configuration(_) => 2,
        CoreError::DependencyNotFound(_) | CoreError::Capability(_) => 3,
        CoreError::Encode { .. } | CoreError::EncodeTimeout { .. } => 4,
        _ => 1,
    }
}
