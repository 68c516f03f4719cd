// ============================================================================
// slidereel-core/src/schedule/mod.rs
// ============================================================================
//
// SCHEDULE: Deterministic Slot Scheduling
//
// Builds the ordered sequence of image slots that covers a target duration.
// The schedule is a pure function of (seed, duration, content type, config,
// supported transition set): every call seeds its own RNG and nothing is
// read from global state.
//
// KEY COMPONENTS:
// - walk_slots: the single draw sequence shared by the builder and estimator
// - build_schedule: materializes slots
// - estimate_slot_count: counts slots without materializing them
//
// AI-ASSISTANT-INFO: Seeded slot scheduling and slot-count estimation

pub mod seed;
pub mod transitions;

pub use seed::{motion_rng, schedule_rng, seed_value};
pub use transitions::resolve_transitions;

use crate::config::{ContentTypeConfig, EffectsConfig, MIN_CLAMPED_STILL_SECS};
use crate::error::{CoreError, CoreResult};

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Slack for float accumulation when testing whether the timeline is covered.
const COVERAGE_EPSILON: f64 = 1e-9;

// ============================================================================
// TYPES
// ============================================================================

/// One scheduled appearance of an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    /// Index into the image pool.
    pub image_index: usize,
    pub image: PathBuf,
    /// Seconds the image is shown before its transition starts.
    pub still_duration: f64,
    /// xfade transition identifier.
    pub transition: String,
    pub transition_duration: f64,
}

impl Slot {
    /// Still plus transition time.
    pub fn span(&self) -> f64 {
        self.still_duration + self.transition_duration
    }
}

/// Ordered slots covering a target duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub seed: String,
    pub duration: f64,
    pub content_type: String,
    pub slots: Vec<Slot>,
}

impl Schedule {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Sum of every slot's still and transition time.
    pub fn total_duration(&self) -> f64 {
        self.slots.iter().map(Slot::span).sum()
    }

    /// Timeline position at which slot `index` starts blending in: the sum
    /// of the still durations of all earlier slots.
    pub fn transition_offset(&self, index: usize) -> f64 {
        self.slots[..index.min(self.slots.len())]
            .iter()
            .map(|s| s.still_duration)
            .sum()
    }

    /// Distinct transitions in first-use order, excluding the first slot,
    /// which never blends in.
    pub fn transitions_used(&self) -> Vec<String> {
        let mut used: Vec<String> = Vec::new();
        for slot in self.slots.iter().skip(1) {
            if !used.contains(&slot.transition) {
                used.push(slot.transition.clone());
            }
        }
        used
    }
}

// ============================================================================
// SHARED DRAW SEQUENCE
// ============================================================================

/// What one loop iteration drew.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SlotDraw {
    pub still_duration: f64,
    pub transition_index: usize,
}

/// Replays the schedule draw sequence, handing each slot to `sink`.
///
/// Per slot: one still-duration draw, then one transition draw. The still
/// duration is clamped when the slot would overrun the target. The loop stops
/// once the accumulated still and transition time reaches `duration`.
/// Callers guarantee `duration > 0`, `transition_count > 0` and timing
/// that passed `ContentTypeConfig` validation.
pub(crate) fn walk_slots<F>(
    duration: f64,
    seed: &str,
    timing: &ContentTypeConfig,
    transition_count: usize,
    mut sink: F,
) where
    F: FnMut(SlotDraw),
{
    let mut rng = schedule_rng(seed);
    let transition_duration = timing.transition_duration;
    let mut elapsed = 0.0_f64;

    loop {
        let mut still = rng.random_range(timing.still_min..=timing.still_max);
        if elapsed + still + transition_duration > duration {
            still = (duration - elapsed - transition_duration).max(MIN_CLAMPED_STILL_SECS);
        }
        let transition_index = rng.random_range(0..transition_count);

        sink(SlotDraw {
            still_duration: still,
            transition_index,
        });

        elapsed += still + transition_duration;
        if elapsed + COVERAGE_EPSILON >= duration {
            break;
        }
    }
}

// ============================================================================
// BUILDER & ESTIMATOR
// ============================================================================

fn check_duration(duration: f64) -> CoreResult<()> {
    if duration.is_finite() {
        Ok(())
    } else {
        Err(CoreError::InvalidInput(format!(
            "duration must be finite, got {duration}"
        )))
    }
}

/// Builds the slot schedule for `images`.
///
/// `supported` is the encoder's xfade transition set; candidates from the
/// content type are intersected with it (see [`resolve_transitions`]).
///
/// A pool of one image, or a non-positive duration, yields a single slot
/// without consuming any random draws.
///
/// # Errors
///
/// * `CoreError::InvalidInput` - empty pool or non-finite duration
/// * `CoreError::Configuration` - unknown content type
pub fn build_schedule(
    images: &[PathBuf],
    duration: f64,
    content_type: &str,
    seed: &str,
    config: &EffectsConfig,
    supported: &[String],
) -> CoreResult<Schedule> {
    check_duration(duration)?;
    if images.is_empty() {
        return Err(CoreError::InvalidInput(
            "cannot schedule an empty image pool".to_string(),
        ));
    }
    let timing = config.content_type(content_type)?;
    let transitions = resolve_transitions(&timing.transitions, supported);

    let mut schedule = Schedule {
        seed: seed.to_string(),
        duration,
        content_type: content_type.to_string(),
        slots: Vec::new(),
    };

    if duration <= 0.0 || images.len() == 1 {
        schedule.slots.push(Slot {
            image_index: 0,
            image: images[0].clone(),
            still_duration: duration.max(0.0),
            transition: transitions[0].clone(),
            transition_duration: 0.0,
        });
        log::debug!(
            "Single-slot schedule ({} image(s), {:.3}s)",
            images.len(),
            duration
        );
        return Ok(schedule);
    }

    walk_slots(duration, seed, timing, transitions.len(), |draw| {
        let image_index = schedule.slots.len() % images.len();
        schedule.slots.push(Slot {
            image_index,
            image: images[image_index].clone(),
            still_duration: draw.still_duration,
            transition: transitions[draw.transition_index].clone(),
            transition_duration: timing.transition_duration,
        });
    });

    clamp_last_slot(&mut schedule.slots, duration);

    log::debug!(
        "Built schedule: {} slots over {:.3}s (content type '{}', seed '{}')",
        schedule.slots.len(),
        duration,
        content_type,
        seed
    );
    Ok(schedule)
}

/// Adjusts the last slot so the schedule sums to exactly `duration`.
/// The still time absorbs the difference first, then the transition.
fn clamp_last_slot(slots: &mut [Slot], duration: f64) {
    let Some((last, earlier)) = slots.split_last_mut() else {
        return;
    };
    let earlier_total: f64 = earlier.iter().map(Slot::span).sum();
    let remaining = (duration - earlier_total).max(0.0);

    if remaining >= last.transition_duration {
        last.still_duration = remaining - last.transition_duration;
    } else {
        last.still_duration = 0.0;
        last.transition_duration = remaining;
    }
}

/// Predicts `build_schedule(..).len()` without materializing slots.
///
/// Replays the same draws as [`build_schedule`] for pools of two or more
/// images. The single-image collapse depends on the pool, which the
/// estimator does not see.
pub fn estimate_slot_count(
    duration: f64,
    content_type: &str,
    seed: &str,
    config: &EffectsConfig,
    supported: &[String],
) -> CoreResult<usize> {
    check_duration(duration)?;
    let timing = config.content_type(content_type)?;
    if duration <= 0.0 {
        return Ok(1);
    }
    let transitions = resolve_transitions(&timing.transitions, supported);

    let mut count = 0usize;
    walk_slots(duration, seed, timing, transitions.len(), |_| count += 1);
    Ok(count)
}
