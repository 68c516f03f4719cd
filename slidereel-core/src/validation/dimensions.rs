//! Output resolution validation

/// Compares the probed resolution against the expected one. Only an exact
/// match passes.
pub fn validate_dimensions(
    expected: (u32, u32),
    actual: Option<(u32, u32)>,
) -> (bool, Option<String>) {
    let (expected_w, expected_h) = expected;
    match actual {
        Some((actual_w, actual_h)) if actual_w == expected_w && actual_h == expected_h => {
            (true, Some(format!("Resolution matches ({actual_w}x{actual_h})")))
        }
        Some((actual_w, actual_h)) => (
            false,
            Some(format!(
                "Expected {expected_w}x{expected_h}, found {actual_w}x{actual_h}"
            )),
        ),
        None => (
            false,
            Some(format!(
                "Expected {expected_w}x{expected_h}, but could not read actual dimensions"
            )),
        ),
    }
}
