//! Output validation
//!
//! Probes a rendered file and checks it against what was requested: exact
//! resolution, and duration within a relative tolerance. Every expected
//! failure mode (missing file, unreadable stream, unknown duration) is
//! reported in the `ValidationReport`; validation never returns an error.

pub mod dimensions;
pub mod duration;
pub mod report;

pub use report::ValidationReport;

use crate::external::FfprobeExecutor;
use std::path::Path;

/// Validates `output` against the requested resolution and duration.
pub fn validate_output<P: FfprobeExecutor + ?Sized>(
    probe: &P,
    output: &Path,
    expected_width: u32,
    expected_height: u32,
    expected_duration: f64,
) -> ValidationReport {
    log::debug!("Validating output: {}", output.display());
    let expected_dimensions = (expected_width, expected_height);
    let file_size = std::fs::metadata(output).ok().map(|m| m.len());

    let info = match probe.probe_media(output) {
        Ok(info) => info,
        Err(e) => {
            log::error!("Cannot probe {}: {}", output.display(), e);
            return ValidationReport::probe_failed(
                output.to_path_buf(),
                expected_dimensions,
                expected_duration,
                file_size,
                e.to_string(),
            );
        }
    };

    let actual_dimensions = match (info.width, info.height) {
        (Some(w), Some(h)) => Some((w, h)),
        _ => None,
    };
    let (resolution_ok, resolution_message) =
        dimensions::validate_dimensions(expected_dimensions, actual_dimensions);
    let duration_check = duration::validate_duration(expected_duration, info.duration);

    let mut warnings = Vec::new();
    if !duration_check.checked {
        log::warn!("{}", duration_check.message);
        warnings.push(duration_check.message.clone());
    }

    let report = ValidationReport {
        output: output.to_path_buf(),
        expected_dimensions,
        actual_dimensions,
        resolution_ok,
        resolution_message,
        expected_duration,
        actual_duration: info.duration,
        duration_ok: duration_check.passed,
        duration_checked: duration_check.checked,
        duration_message: Some(duration_check.message),
        file_size,
        probe_error: None,
        warnings,
    };

    if report.is_valid() {
        log::info!("Validation passed for {}", output.display());
    } else {
        for failure in report.get_failures() {
            log::error!("{failure}");
        }
    }
    report
}
