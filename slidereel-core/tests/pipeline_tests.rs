// slidereel-core/tests/pipeline_tests.rs
//
// End-to-end runs of SlideshowEngine with an in-process encoder, prober and
// image operations.

mod common;

use common::{CountingOps, FakeEncoder, FakeProbe, arg_value, create_pool, dir_entries};
use slidereel_core::external::StaticCapabilities;
use slidereel_core::preprocess::{InMemoryRemoteCache, RemoteCache};
use slidereel_core::{
    CoreError, EffectsConfig, PrepMode, SlideshowEngine, SlideshowRequest, SlideshowRequestBuilder,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::tempdir;

type TestEngine = SlideshowEngine<FakeEncoder, FakeProbe, StaticCapabilities, CountingOps>;

fn engine(
    encoder: &FakeEncoder,
    probe: FakeProbe,
    ops: &CountingOps,
    cache_dir: &Path,
) -> TestEngine {
    SlideshowEngine::with_components(
        encoder.clone(),
        probe,
        StaticCapabilities::new(["fade", "slideleft", "dissolve", "circleopen", "wipeup"]),
        ops.clone(),
        EffectsConfig::default(),
        cache_dir,
    )
}

fn request(images: Vec<PathBuf>, output: PathBuf, duration: f64, seed: &str) -> SlideshowRequest {
    SlideshowRequestBuilder::new()
        .images(images)
        .output(output)
        .duration(duration)
        .resolution(1920, 1080)
        .fps(30)
        .content_type("long")
        .seed(seed)
        .build()
        .unwrap()
}

/// Two large images and one undersized one.
fn mixed_ops() -> CountingOps {
    CountingOps::new()
        .with_size("a.jpg", 4000, 3000)
        .with_size("b.jpg", 800, 600)
        .with_size("c.png", 2560, 1440)
}

#[test]
fn test_render_pipeline_success() -> Result<(), Box<dyn std::error::Error>> {
    let images_dir = tempdir()?;
    let cache_dir = tempdir()?;
    let output_dir = tempdir()?;
    let images = create_pool(images_dir.path(), &["a.jpg", "b.jpg", "c.png"]);
    let output = output_dir.path().join("show.mp4");

    let encoder = FakeEncoder::new();
    let ops = mixed_ops();
    let engine = engine(&encoder, FakeProbe::new(1920, 1080, 40.0), &ops, cache_dir.path());

    let report = engine.render_slideshow(&request(images.clone(), output.clone(), 40.0, "ep-1"))?;

    assert!(report.is_success(), "failures: {:?}", report.validation.get_failures());
    assert!(report.slot_count >= 2);
    assert_eq!(report.prepare.composites_generated, 1);
    assert_eq!(report.prepare.passthrough, 2);
    assert!(report.output_size > 0);
    assert_eq!(dir_entries(output_dir.path()), vec!["show.mp4".to_string()]);

    let calls = encoder.calls();
    assert_eq!(calls.len(), 1);
    let args = &calls[0];
    assert_eq!(arg_value(args, "-t"), Some("40"));
    assert_eq!(arg_value(args, "-pix_fmt"), Some("yuv420p"));
    assert!(arg_value(args, "-filter_complex").unwrap().contains("xfade"));
    let inputs = args.iter().filter(|a| *a == "-i").count();
    assert_eq!(inputs, report.slot_count);

    // The undersized image is fed to the encoder as its composite.
    let b = images[1].to_string_lossy().into_owned();
    assert!(!args.contains(&b));
    assert!(args.iter().any(|a| a.starts_with(&cache_dir.path().to_string_lossy().into_owned())));
    Ok(())
}

#[test]
fn test_slot_count_matches_estimate() -> Result<(), Box<dyn std::error::Error>> {
    let images_dir = tempdir()?;
    let cache_dir = tempdir()?;
    let output_dir = tempdir()?;
    let images = create_pool(images_dir.path(), &["a.jpg", "b.jpg", "c.png"]);

    let encoder = FakeEncoder::new();
    let ops = mixed_ops();
    for (i, duration) in [12.0, 33.3, 90.0].into_iter().enumerate() {
        let seed = format!("seed-{i}");
        let engine = engine(&encoder, FakeProbe::new(1920, 1080, duration), &ops, cache_dir.path());
        let output = output_dir.path().join(format!("show{i}.mp4"));
        let report = engine.render_slideshow(&request(images.clone(), output, duration, &seed))?;
        let estimate = engine.estimate_slot_count(duration, "long", &seed)?;
        assert_eq!(report.slot_count, estimate, "duration {duration}");
    }
    Ok(())
}

#[test]
fn test_second_run_is_a_pure_cache_lookup() -> Result<(), Box<dyn std::error::Error>> {
    let images_dir = tempdir()?;
    let cache_dir = tempdir()?;
    let images = create_pool(images_dir.path(), &["a.jpg", "b.jpg", "c.png"]);

    let ops = mixed_ops();
    let engine = engine(&FakeEncoder::new(), FakeProbe::new(1920, 1080, 1.0), &ops, cache_dir.path());

    let first = engine.prepare(&images, 1920, 1080)?;
    assert!(!first.stats.cache_hit);
    let after_first = ops.operations();
    assert_eq!(after_first, 4);

    let second = engine.prepare(&images, 1920, 1080)?;
    assert!(second.stats.cache_hit);
    assert_eq!(second.stats.image_operations(), 0);
    assert_eq!(ops.operations(), after_first);
    assert_eq!(first.paths(), second.paths());
    Ok(())
}

#[test]
fn test_corrupt_image_is_cached_as_passthrough() -> Result<(), Box<dyn std::error::Error>> {
    let images_dir = tempdir()?;
    let cache_dir = tempdir()?;
    let images = create_pool(images_dir.path(), &["ok.jpg", "corrupt.jpg"]);

    // No registered size: every probe of corrupt.jpg fails.
    let ops = CountingOps::new().with_size("ok.jpg", 640, 480);
    let engine = engine(&FakeEncoder::new(), FakeProbe::new(1920, 1080, 1.0), &ops, cache_dir.path());

    let first = engine.prepare(&images, 1920, 1080)?;
    assert_eq!(ops.probes(), 2);
    assert_eq!(first.images[1].mode, PrepMode::Passthrough);
    assert_eq!(first.images[1].path, images[1]);

    let second = engine.prepare(&images, 1920, 1080)?;
    assert!(second.stats.cache_hit);
    assert_eq!(second.stats.image_operations(), 0);
    assert_eq!(ops.probes(), 2);
    assert_eq!(first.paths(), second.paths());
    Ok(())
}

#[test]
fn test_changed_image_only_reprocesses_that_image() -> Result<(), Box<dyn std::error::Error>> {
    let images_dir = tempdir()?;
    let cache_dir = tempdir()?;
    let images = create_pool(images_dir.path(), &["a.jpg", "b.jpg", "c.png"]);

    let ops = mixed_ops();
    let engine = engine(&FakeEncoder::new(), FakeProbe::new(1920, 1080, 1.0), &ops, cache_dir.path());
    engine.prepare(&images, 1920, 1080)?;
    let probes_before = ops.probes();
    let composites_before = ops.composites();

    // A different size changes the identity regardless of mtime resolution.
    std::fs::write(&images[1], b"a rather longer replacement for the second image")?;

    let pool = engine.prepare(&images, 1920, 1080)?;
    assert!(!pool.stats.cache_hit);
    assert_eq!(pool.stats.reused, 2);
    assert_eq!(ops.probes(), probes_before + 1);
    assert_eq!(ops.composites(), composites_before + 1);
    assert_eq!(pool.images[1].mode, PrepMode::Composite);
    Ok(())
}

#[test]
fn test_composites_target_exact_output_size() -> Result<(), Box<dyn std::error::Error>> {
    let images_dir = tempdir()?;
    let cache_dir = tempdir()?;
    let images = create_pool(images_dir.path(), &["wide.jpg", "tall.jpg", "tiny.png"]);

    let ops = CountingOps::new()
        .with_size("wide.jpg", 1600, 400)
        .with_size("tall.jpg", 600, 2400)
        .with_size("tiny.png", 64, 64);
    let engine = engine(&FakeEncoder::new(), FakeProbe::new(1080, 1920, 1.0), &ops, cache_dir.path());

    let pool = engine.prepare(&images, 1080, 1920)?;
    assert_eq!(pool.stats.composites_generated, 3);
    for (_, width, height) in ops.requested() {
        assert_eq!((width, height), (1080, 1920));
    }
    for image in &pool.images {
        assert_eq!(image.mode, PrepMode::Composite);
        assert!(image.path.starts_with(cache_dir.path()));
        assert!(std::fs::metadata(&image.path)?.len() > 0);
    }
    Ok(())
}

#[test]
fn test_validation_mismatch_is_reported_not_raised() -> Result<(), Box<dyn std::error::Error>> {
    let images_dir = tempdir()?;
    let cache_dir = tempdir()?;
    let output_dir = tempdir()?;
    let images = create_pool(images_dir.path(), &["a.jpg", "c.png"]);
    let output = output_dir.path().join("show.mp4");

    let ops = mixed_ops();
    let engine = engine(&FakeEncoder::new(), FakeProbe::new(1280, 720, 20.0), &ops, cache_dir.path());
    let report = engine.render_slideshow(&request(images, output.clone(), 20.0, "s"))?;

    assert!(!report.is_success());
    assert!(!report.validation.resolution_ok);
    assert!(report.validation.duration_ok);
    assert!(output.exists());
    Ok(())
}

#[test]
fn test_encoder_failure_leaves_no_output() -> Result<(), Box<dyn std::error::Error>> {
    let images_dir = tempdir()?;
    let cache_dir = tempdir()?;
    let output_dir = tempdir()?;
    let images = create_pool(images_dir.path(), &["a.jpg", "c.png"]);

    let ops = mixed_ops();
    let engine = engine(&FakeEncoder::failing(1), FakeProbe::new(1920, 1080, 20.0), &ops, cache_dir.path());
    let err = engine
        .render_slideshow(&request(images, output_dir.path().join("show.mp4"), 20.0, "s"))
        .unwrap_err();

    assert!(matches!(err, CoreError::Encode { .. }), "got {err:?}");
    assert!(err.is_fallback_eligible());
    assert!(err.stderr_tail().unwrap_or_default().contains("Conversion failed!"));
    assert!(dir_entries(output_dir.path()).is_empty());
    Ok(())
}

#[test]
fn test_missing_xfade_support_is_a_capability_error() -> Result<(), Box<dyn std::error::Error>> {
    let images_dir = tempdir()?;
    let cache_dir = tempdir()?;
    let output_dir = tempdir()?;
    let images = create_pool(images_dir.path(), &["a.jpg", "c.png"]);

    let encoder = FakeEncoder::new();
    let engine = SlideshowEngine::with_components(
        encoder.clone(),
        FakeProbe::new(1920, 1080, 30.0),
        StaticCapabilities::default(),
        mixed_ops(),
        EffectsConfig::default(),
        cache_dir.path(),
    );
    let err = engine
        .render_slideshow(&request(images, output_dir.path().join("show.mp4"), 30.0, "s"))
        .unwrap_err();
    assert!(matches!(err, CoreError::Capability(_)));
    assert!(encoder.calls().is_empty());
    Ok(())
}

#[test]
fn test_remote_cache_seeds_a_fresh_host() -> Result<(), Box<dyn std::error::Error>> {
    let images_dir = tempdir()?;
    let first_cache = tempdir()?;
    let second_cache = tempdir()?;
    let output_dir = tempdir()?;
    let images = create_pool(images_dir.path(), &["a.jpg", "b.jpg", "c.png"]);
    let remote = Arc::new(InMemoryRemoteCache::new());

    let first_ops = mixed_ops();
    let first = engine(&FakeEncoder::new(), FakeProbe::new(1920, 1080, 15.0), &first_ops, first_cache.path())
        .with_remote_cache(remote.clone() as Arc<dyn RemoteCache>);
    first.render_slideshow(&request(images.clone(), output_dir.path().join("one.mp4"), 15.0, "s"))?;

    // The publish runs detached from the render.
    let deadline = Instant::now() + Duration::from_secs(5);
    while remote.get("default/1920x1080").is_none() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(remote.publish_count(), 1);

    let second_ops = mixed_ops();
    let second = engine(&FakeEncoder::new(), FakeProbe::new(1920, 1080, 15.0), &second_ops, second_cache.path())
        .with_remote_cache(remote.clone() as Arc<dyn RemoteCache>);
    let pool = second.prepare(&images, 1920, 1080)?;

    assert!(pool.stats.remote_restored);
    assert_eq!(second_ops.operations(), 0);
    assert_eq!(pool.images[1].mode, PrepMode::Composite);
    assert!(pool.images[1].path.starts_with(second_cache.path()));
    Ok(())
}

#[test]
fn test_single_image_renders_without_transitions() -> Result<(), Box<dyn std::error::Error>> {
    let images_dir = tempdir()?;
    let cache_dir = tempdir()?;
    let output_dir = tempdir()?;
    let images = create_pool(images_dir.path(), &["a.jpg"]);

    let encoder = FakeEncoder::new();
    let ops = mixed_ops();
    let engine = engine(&encoder, FakeProbe::new(1920, 1080, 5.0), &ops, cache_dir.path());
    let report = engine.render_slideshow(&request(images, output_dir.path().join("one.mp4"), 5.0, "s"))?;

    assert_eq!(report.slot_count, 1);
    let graph = arg_value(&encoder.calls()[0], "-filter_complex").unwrap().to_string();
    assert!(!graph.contains("xfade"));
    assert!(graph.contains("trim=end_frame=150"));
    Ok(())
}
