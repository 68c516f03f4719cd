//! Transition set resolution.

use crate::config::FALLBACK_TRANSITION;

/// Intersects `candidates` with the encoder's `supported` set, keeping the
/// candidate order.
///
/// An empty intersection falls back to `fade` when supported, otherwise to
/// the first supported transition. With nothing supported the result is
/// `["fade"]`; whether that is usable is decided where the graph is rendered.
pub fn resolve_transitions(candidates: &[String], supported: &[String]) -> Vec<String> {
    let resolved: Vec<String> = candidates
        .iter()
        .filter(|c| supported.contains(c))
        .cloned()
        .collect();
    if !resolved.is_empty() {
        return resolved;
    }

    let fallback = if supported.iter().any(|s| s == FALLBACK_TRANSITION) || supported.is_empty() {
        FALLBACK_TRANSITION.to_string()
    } else {
        supported[0].clone()
    };
    log::warn!(
        "None of the candidate transitions [{}] are supported; falling back to '{}'",
        candidates.join(", "),
        fallback
    );
    vec![fallback]
}
