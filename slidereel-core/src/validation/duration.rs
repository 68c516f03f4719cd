//! Output duration validation

use crate::config::DURATION_RELATIVE_TOLERANCE;

/// Outcome of the duration check.
#[derive(Debug, Clone, PartialEq)]
pub struct DurationCheck {
    pub passed: bool,
    /// False when the duration could not be probed; the check then passes
    /// and the message is a warning.
    pub checked: bool,
    pub message: String,
}

/// Compares the probed duration against the expected one within the
/// relative tolerance. An unreadable duration is not a failure.
pub fn validate_duration(expected: f64, actual: Option<f64>) -> DurationCheck {
    let Some(actual) = actual else {
        return DurationCheck {
            passed: true,
            checked: false,
            message: format!(
                "Could not read output duration; expected {expected:.2}s, validated resolution only"
            ),
        };
    };

    let diff = (expected - actual).abs();
    let allowed = expected.abs() * DURATION_RELATIVE_TOLERANCE + 1e-9;
    if diff <= allowed {
        DurationCheck {
            passed: true,
            checked: true,
            message: format!("Duration matches ({actual:.2}s, expected {expected:.2}s)"),
        }
    } else {
        DurationCheck {
            passed: false,
            checked: true,
            message: format!(
                "Expected {expected:.2}s, found {actual:.2}s (diff: {diff:.2}s, allowed: {allowed:.2}s)"
            ),
        }
    }
}
