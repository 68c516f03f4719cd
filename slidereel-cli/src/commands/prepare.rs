//! Implementation of the `prepare` command.
//!
//! Fills the cache ahead of a render. Background completion of a partial
//! cache is waited for so the process does not exit with work in flight.

use crate::cli::{Cli, PrepareArgs};
use crate::commands::{collect_images, default_cache_dir, load_effects_config, print_json, require_tools};
use crate::error::CliResult;

use log::info;
use slidereel_core::{PrepMode, PreparedPool, SlideshowEngine};

/// Runs the `prepare` command.
pub fn run_prepare(cli: &Cli, args: &PrepareArgs) -> CliResult<()> {
    let config = load_effects_config(cli.config.as_deref())?;
    let images = collect_images(&args.input)?;
    require_tools()?;

    let cache_dir = cli.cache_dir.clone().unwrap_or_else(default_cache_dir);
    info!("Preparing into {}", cache_dir.display());
    let engine = SlideshowEngine::new(config, cache_dir);
    let mut pool = engine.prepare(&images, args.resolution.width, args.resolution.height)?;

    if pool.has_pending_completion() {
        info!("Waiting for background cache completion");
    }
    let completed = match pool.wait_for_completion() {
        Some(result) => Some(result?),
        None => None,
    };
    pool.wait_for_publish();

    if args.json {
        print_json(&serde_json::json!({
            "width": args.resolution.width,
            "height": args.resolution.height,
            "images": pool.len(),
            "stats": pool.stats,
            "completion": completed,
        }))?;
    } else {
        print_pool(&pool);
        if let Some(stats) = completed {
            println!(
                "Background completion: {} composites generated, {} failed",
                stats.composites_generated, stats.failed
            );
        }
    }
    Ok(())
}

fn print_pool(pool: &PreparedPool) {
    for image in &pool.images {
        let mode = match image.mode {
            PrepMode::Passthrough => "passthrough",
            PrepMode::Composite => "composite",
        };
        println!("{:<12} {}", mode, image.path.display());
    }
    let stats = &pool.stats;
    println!(
        "{} images: {} reused, {} composites generated, {} passthrough, {} failed{}",
        pool.len(),
        stats.reused,
        stats.composites_generated,
        stats.passthrough,
        stats.failed,
        if stats.cache_hit { " (cache hit)" } else { "" }
    );
}
