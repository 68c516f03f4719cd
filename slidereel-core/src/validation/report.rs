//! Validation report for a rendered slideshow

use serde::Serialize;
use std::path::PathBuf;

/// Result of validating one rendered output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub output: PathBuf,
    pub expected_dimensions: (u32, u32),
    pub actual_dimensions: Option<(u32, u32)>,
    pub resolution_ok: bool,
    pub resolution_message: Option<String>,
    pub expected_duration: f64,
    pub actual_duration: Option<f64>,
    pub duration_ok: bool,
    /// False when the duration could not be probed and was skipped.
    pub duration_checked: bool,
    pub duration_message: Option<String>,
    pub file_size: Option<u64>,
    /// Set when the output could not be probed at all.
    pub probe_error: Option<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    /// Report for an output that could not be probed.
    pub fn probe_failed(
        output: PathBuf,
        expected_dimensions: (u32, u32),
        expected_duration: f64,
        file_size: Option<u64>,
        error: String,
    ) -> Self {
        Self {
            output,
            expected_dimensions,
            actual_dimensions: None,
            resolution_ok: false,
            resolution_message: None,
            expected_duration,
            actual_duration: None,
            duration_ok: false,
            duration_checked: false,
            duration_message: None,
            file_size,
            probe_error: Some(error),
            warnings: Vec::new(),
        }
    }

    /// Returns true if all validations pass
    pub fn is_valid(&self) -> bool {
        self.probe_error.is_none() && self.resolution_ok && self.duration_ok
    }

    /// Returns a list of validation failures
    pub fn get_failures(&self) -> Vec<String> {
        let mut failures = Vec::new();

        if let Some(error) = &self.probe_error {
            failures.push(format!("Could not probe output: {error}"));
            return failures;
        }

        if !self.resolution_ok {
            match &self.resolution_message {
                Some(msg) => failures.push(format!("Resolution validation failed: {msg}")),
                None => failures.push("Resolution validation failed".to_string()),
            }
        }

        if !self.duration_ok {
            match &self.duration_message {
                Some(msg) => failures.push(format!("Duration validation failed: {msg}")),
                None => failures.push("Duration validation failed".to_string()),
            }
        }

        failures
    }

    /// Returns individual validation step results
    pub fn get_validation_steps(&self) -> Vec<(String, bool, String)> {
        let resolution = self.resolution_message.clone().unwrap_or_else(|| {
            self.probe_error
                .clone()
                .unwrap_or_else(|| "Resolution not checked".to_string())
        });
        let duration = self
            .duration_message
            .clone()
            .unwrap_or_else(|| "Duration not checked".to_string());
        vec![
            ("Resolution".to_string(), self.resolution_ok, resolution),
            ("Duration".to_string(), self.duration_ok, duration),
        ]
    }
}
