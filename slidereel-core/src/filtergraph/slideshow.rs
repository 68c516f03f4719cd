//! Slideshow graph synthesis.
//!
//! Turns a [`Schedule`] into a [`FilterGraph`]: one normalize-and-move chain
//! per slot, an xfade chain joining the slots, and a finishing chain on the
//! composed output.

use super::{Filter, FilterChain, FilterGraph, input_label, plan_motion};
use crate::config::{FinishingConfig, KenBurnsConfig};
use crate::error::{CoreError, CoreResult};
use crate::schedule::Schedule;
use crate::utils::format_decimal;

/// Final label of every slideshow graph.
pub const OUTPUT_LABEL: &str = "vout";

fn slot_label(index: usize) -> String {
    format!("s{index}")
}

fn frames_for(seconds: f64, fps: u32) -> u64 {
    let frames = (seconds.max(0.0) * f64::from(fps)).round() as u64;
    frames.max(1)
}

/// Clip length in seconds for each slot.
///
/// Earlier slots run for still plus transition time so the next xfade has
/// material to blend. The last slot runs to the end of the timeline, which
/// makes the composed length equal the schedule's total duration.
fn clip_lengths(schedule: &Schedule) -> Vec<f64> {
    let count = schedule.slots.len();
    let total = schedule.total_duration();
    schedule
        .slots
        .iter()
        .enumerate()
        .map(|(i, slot)| {
            if i + 1 == count {
                (total - schedule.transition_offset(i)).max(0.0)
            } else {
                slot.span()
            }
        })
        .collect()
}

/// Builds the slideshow filter graph.
///
/// Input `i` of the graph is slot `i`'s image, looped at `fps`.
///
/// # Errors
///
/// * `CoreError::InvalidInput` - empty schedule or zero-sized output
pub fn synthesize(
    schedule: &Schedule,
    width: u32,
    height: u32,
    fps: u32,
    ken_burns: &KenBurnsConfig,
    finishing: &FinishingConfig,
) -> CoreResult<FilterGraph> {
    if schedule.is_empty() {
        return Err(CoreError::InvalidInput(
            "cannot synthesize an empty schedule".to_string(),
        ));
    }
    if width == 0 || height == 0 || fps == 0 {
        return Err(CoreError::InvalidInput(format!(
            "invalid output format {width}x{height}@{fps}"
        )));
    }

    let clips = clip_lengths(schedule);
    let motion = ken_burns
        .enabled
        .then(|| plan_motion(&schedule.seed, schedule.len(), ken_burns));

    let mut chains = Vec::with_capacity(schedule.len() * 2 + 1);

    // ---- Per-slot normalization and motion ----
    for (i, clip) in clips.iter().enumerate() {
        let frames = frames_for(*clip, fps);
        let mut filters = vec![
            Filter::new("scale")
                .arg(width)
                .arg(height)
                .named("force_original_aspect_ratio", "increase"),
            Filter::new("crop").arg(width).arg(height),
            Filter::new("setsar").arg(1),
            Filter::new("fps").arg(fps),
            Filter::new("format").arg("yuv420p"),
        ];
        if let Some(plan) = motion.as_ref().and_then(|plans| plans.get(i)) {
            filters.push(plan.zoompan(ken_burns.max_zoom, frames, width, height, fps));
        }
        filters.push(Filter::new("trim").named("end_frame", frames));
        filters.push(Filter::new("setpts").arg("PTS-STARTPTS"));

        chains.push(FilterChain::new([input_label(i)], filters, [slot_label(i)]));
    }

    // ---- Transition chaining ----
    let mut composed = slot_label(0);
    for k in 1..schedule.len() {
        let slot = &schedule.slots[k];
        let previous = &schedule.slots[k - 1];
        let duration = slot.transition_duration.min(previous.transition_duration);
        let label = format!("x{k}");

        chains.push(FilterChain::new(
            [composed.clone(), slot_label(k)],
            vec![Filter::new("xfade")
                .named("transition", &slot.transition)
                .named("duration", format_decimal(duration))
                .named("offset", format_decimal(schedule.transition_offset(k)))],
            [label.clone()],
        ));
        composed = label;
    }

    // ---- Finishing ----
    let mut finish = Vec::new();
    if finishing.vignette {
        finish.push(Filter::new("vignette").decimal("angle", finishing.vignette_angle));
    }
    if finishing.grain && finishing.grain_strength > 0 {
        finish.push(
            Filter::new("noise")
                .named("alls", finishing.grain_strength)
                .named("allf", "t"),
        );
    }
    finish.push(Filter::new("format").arg("yuv420p"));
    chains.push(FilterChain::new([composed], finish, [OUTPUT_LABEL]));

    let graph = FilterGraph::new(chains, OUTPUT_LABEL, schedule.len());
    graph.validate()?;

    log::debug!(
        "Synthesized graph: {} slots, {} xfades, ken burns {}",
        schedule.len(),
        schedule.len() - 1,
        if ken_burns.enabled { "on" } else { "off" }
    );
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EffectsConfig;
    use crate::schedule::{Slot, build_schedule};
    use std::path::PathBuf;

    fn schedule_of(slots: &[(f64, &str, f64)]) -> Schedule {
        let slots: Vec<Slot> = slots
            .iter()
            .enumerate()
            .map(|(i, (still, transition, td))| Slot {
                image_index: i,
                image: PathBuf::from(format!("{i}.jpg")),
                still_duration: *still,
                transition: transition.to_string(),
                transition_duration: *td,
            })
            .collect();
        Schedule {
            seed: "test".to_string(),
            duration: slots.iter().map(Slot::span).sum(),
            content_type: "long".to_string(),
            slots,
        }
    }

    fn xfades(graph: &FilterGraph) -> Vec<&Filter> {
        graph.filters().filter(|f| f.name() == "xfade").collect()
    }

    #[test]
    fn test_one_input_per_slot_and_valid_wiring() {
        let schedule = schedule_of(&[(4.0, "fade", 1.0), (3.0, "dissolve", 1.0), (1.0, "wipeup", 1.0)]);
        let graph = synthesize(
            &schedule,
            1920,
            1080,
            30,
            &KenBurnsConfig::default(),
            &FinishingConfig::default(),
        )
        .unwrap();
        assert_eq!(graph.input_count(), 3);
        assert!(graph.validate().is_ok());
        assert_eq!(graph.output_label(), OUTPUT_LABEL);
    }

    #[test]
    fn test_xfade_offsets_are_cumulative_stills() {
        let schedule = schedule_of(&[(4.0, "fade", 1.0), (3.5, "dissolve", 1.0), (2.0, "wipeup", 1.0)]);
        let graph = synthesize(
            &schedule,
            1280,
            720,
            30,
            &KenBurnsConfig::default(),
            &FinishingConfig::default(),
        )
        .unwrap();
        let fades = xfades(&graph);
        assert_eq!(fades.len(), 2);
        assert_eq!(fades[0].get("offset"), Some("4"));
        assert_eq!(fades[0].get("transition"), Some("dissolve"));
        assert_eq!(fades[0].get("duration"), Some("1"));
        assert_eq!(fades[1].get("offset"), Some("7.5"));
        assert_eq!(fades[1].get("transition"), Some("wipeup"));
    }

    #[test]
    fn test_clip_lengths_fill_the_timeline() {
        let schedule = schedule_of(&[(4.0, "fade", 1.0), (3.0, "fade", 1.0), (0.5, "fade", 0.5)]);
        let clips = clip_lengths(&schedule);
        assert_eq!(clips[0], 5.0);
        assert_eq!(clips[1], 4.0);
        // total 10.0, last slot starts at 7.0
        assert!((clips[2] - 3.0).abs() < 1e-9);
        // Composed length: last offset plus last clip
        let composed = schedule.transition_offset(2) + clips[2];
        assert!((composed - schedule.total_duration()).abs() < 1e-9);
    }

    #[test]
    fn test_single_slot_has_no_transition() {
        let config = EffectsConfig::default();
        let schedule = build_schedule(
            &[PathBuf::from("only.jpg")],
            5.0,
            "long",
            "solo",
            &config,
            &["fade".to_string()],
        )
        .unwrap();
        let graph = synthesize(
            &schedule,
            1920,
            1080,
            30,
            &config.ken_burns,
            &config.finishing,
        )
        .unwrap();
        assert!(!graph.contains_filter("xfade"));
        assert_eq!(graph.input_count(), 1);
        let trim = graph.filters().find(|f| f.name() == "trim").unwrap();
        assert_eq!(trim.get("end_frame"), Some("150"));
    }

    #[test]
    fn test_ken_burns_toggle() {
        let schedule = schedule_of(&[(4.0, "fade", 1.0), (3.0, "fade", 1.0)]);
        let on = synthesize(
            &schedule,
            1920,
            1080,
            30,
            &KenBurnsConfig::default(),
            &FinishingConfig::default(),
        )
        .unwrap();
        assert_eq!(on.filters().filter(|f| f.name() == "zoompan").count(), 2);

        let off = synthesize(
            &schedule,
            1920,
            1080,
            30,
            &KenBurnsConfig {
                enabled: false,
                ..KenBurnsConfig::default()
            },
            &FinishingConfig::default(),
        )
        .unwrap();
        assert!(!off.contains_filter("zoompan"));
        assert!(off.contains_filter("trim"));
    }

    #[test]
    fn test_finishing_filters_are_independent() {
        let schedule = schedule_of(&[(4.0, "fade", 1.0), (3.0, "fade", 1.0)]);
        let ken_burns = KenBurnsConfig::default();

        let both = FinishingConfig {
            vignette: true,
            grain: true,
            ..FinishingConfig::default()
        };
        let graph = synthesize(&schedule, 1920, 1080, 30, &ken_burns, &both).unwrap();
        assert!(graph.contains_filter("vignette"));
        assert!(graph.contains_filter("noise"));

        let grain_only = FinishingConfig {
            vignette: false,
            grain: true,
            ..FinishingConfig::default()
        };
        let graph = synthesize(&schedule, 1920, 1080, 30, &ken_burns, &grain_only).unwrap();
        assert!(!graph.contains_filter("vignette"));
        assert!(graph.contains_filter("noise"));

        let none = FinishingConfig {
            vignette: false,
            grain: false,
            ..FinishingConfig::default()
        };
        let graph = synthesize(&schedule, 1920, 1080, 30, &ken_burns, &none).unwrap();
        assert!(!graph.contains_filter("vignette"));
        assert!(!graph.contains_filter("noise"));
    }

    #[test]
    fn test_normalization_order() {
        let schedule = schedule_of(&[(2.0, "fade", 0.0)]);
        let graph = synthesize(
            &schedule,
            1080,
            1920,
            24,
            &KenBurnsConfig {
                enabled: false,
                ..KenBurnsConfig::default()
            },
            &FinishingConfig::default(),
        )
        .unwrap();
        assert_eq!(
            graph.chains()[0].to_string(),
            "[0:v]scale=1080:1920:force_original_aspect_ratio=increase,crop=1080:1920,\
             setsar=1,fps=24,format=yuv420p,trim=end_frame=48,setpts=PTS-STARTPTS[s0]"
        );
    }

    #[test]
    fn test_identical_schedules_give_identical_graphs() {
        let config = EffectsConfig::default();
        let images: Vec<PathBuf> = (0..3).map(|i| PathBuf::from(format!("{i}.jpg"))).collect();
        let supported = vec!["fade".to_string(), "dissolve".to_string()];
        let a = build_schedule(&images, 42.0, "long", "same", &config, &supported).unwrap();
        let b = build_schedule(&images, 42.0, "long", "same", &config, &supported).unwrap();
        let ga = synthesize(&a, 1920, 1080, 30, &config.ken_burns, &config.finishing).unwrap();
        let gb = synthesize(&b, 1920, 1080, 30, &config.ken_burns, &config.finishing).unwrap();
        assert_eq!(ga.to_string(), gb.to_string());
    }

    #[test]
    fn test_empty_schedule_rejected() {
        let schedule = schedule_of(&[]);
        assert!(matches!(
            synthesize(
                &schedule,
                1920,
                1080,
                30,
                &KenBurnsConfig::default(),
                &FinishingConfig::default()
            ),
            Err(CoreError::InvalidInput(_))
        ));
    }
}
