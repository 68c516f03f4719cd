// slidereel-core/tests/schedule_tests.rs
//
// Properties of the seeded schedule across many seeds and durations.

use slidereel_core::filtergraph::synthesize;
use slidereel_core::{EffectsConfig, build_schedule, estimate_slot_count};
use std::path::PathBuf;

const SUPPORTED: [&str; 6] = ["fade", "slideleft", "slideright", "dissolve", "zoomin", "wipeup"];

fn supported() -> Vec<String> {
    SUPPORTED.iter().map(|s| s.to_string()).collect()
}

fn pool(n: usize) -> Vec<PathBuf> {
    (0..n).map(|i| PathBuf::from(format!("/pool/img{i:02}.jpg"))).collect()
}

/// Short clips, minutes-long episodes and half-hour runs.
fn durations() -> impl Iterator<Item = f64> {
    let short = (0..20).map(|i| 0.25 + f64::from(i) * 0.23);
    let medium = (0..25).map(|i| 45.0 + f64::from(i) * 1.3);
    let long = (0..15).map(|i| 1780.0 + f64::from(i) * 2.9);
    short.chain(medium).chain(long)
}

#[test]
fn test_estimate_matches_schedule_length() {
    let config = EffectsConfig::default();
    let supported = supported();
    let mut cases = 0;
    for content_type in ["long", "short"] {
        for (i, duration) in durations().enumerate() {
            let seed = format!("episode-{i}");
            let schedule =
                build_schedule(&pool(7), duration, content_type, &seed, &config, &supported).unwrap();
            let estimate =
                estimate_slot_count(duration, content_type, &seed, &config, &supported).unwrap();
            assert_eq!(schedule.len(), estimate, "{content_type} {duration}s seed {seed}");
            cases += 1;
        }
    }
    assert!(cases >= 100);
}

#[test]
fn test_same_inputs_same_schedule_and_graph() {
    let config = EffectsConfig::default();
    let supported = supported();
    for i in 0..20 {
        let seed = format!("repeat-{i}");
        let a = build_schedule(&pool(5), 37.5, "long", &seed, &config, &supported).unwrap();
        let b = build_schedule(&pool(5), 37.5, "long", &seed, &config, &supported).unwrap();
        assert_eq!(a, b);

        let graph_a = synthesize(&a, 1920, 1080, 30, &config.ken_burns, &config.finishing).unwrap();
        let graph_b = synthesize(&b, 1920, 1080, 30, &config.ken_burns, &config.finishing).unwrap();
        assert_eq!(graph_a.to_string(), graph_b.to_string());
    }
}

#[test]
fn test_different_seeds_diverge() {
    let config = EffectsConfig::default();
    let supported = supported();
    let a = build_schedule(&pool(5), 120.0, "long", "alpha", &config, &supported).unwrap();
    let b = build_schedule(&pool(5), 120.0, "long", "beta", &config, &supported).unwrap();
    assert_ne!(a, b);
}

#[test]
fn test_schedule_fills_duration_exactly() {
    let config = EffectsConfig::default();
    let supported = supported();
    for (i, duration) in durations().enumerate() {
        let schedule =
            build_schedule(&pool(4), duration, "short", &format!("fill-{i}"), &config, &supported)
                .unwrap();
        assert!(
            (schedule.total_duration() - duration).abs() < 1e-6,
            "{} vs {duration}",
            schedule.total_duration()
        );
    }
}

#[test]
fn test_slots_cycle_pool_and_use_supported_transitions() {
    let config = EffectsConfig::default();
    let supported = supported();
    let schedule = build_schedule(&pool(3), 200.0, "short", "cycle", &config, &supported).unwrap();
    for (i, slot) in schedule.slots.iter().enumerate() {
        assert_eq!(slot.image_index, i % 3);
        assert!(supported.contains(&slot.transition), "{}", slot.transition);
    }
}

#[test]
fn test_unsupported_transitions_fall_back_to_fade() {
    let config = EffectsConfig::default();
    let schedule =
        build_schedule(&pool(3), 60.0, "long", "fallback", &config, &["pixelize".to_string()])
            .unwrap();
    assert!(schedule.slots.iter().all(|slot| slot.transition == "fade"));
}
