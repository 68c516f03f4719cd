//! Implementation of the `estimate` command.

use crate::cli::{Cli, EstimateArgs};
use crate::commands::{load_effects_config, print_json};
use crate::error::CliResult;

use slidereel_core::SlideshowEngine;
use slidereel_core::check_dependency;

/// Prints the slot count `render` would schedule for a pool of two or more images.
pub fn run_estimate(cli: &Cli, args: &EstimateArgs) -> CliResult<()> {
    let config = load_effects_config(cli.config.as_deref())?;
    config.content_type(&args.content_type)?;
    check_dependency("ffmpeg")?;

    let cache_dir = cli.cache_dir.clone().unwrap_or_else(super::default_cache_dir);
    let engine = SlideshowEngine::new(config, cache_dir);
    let slots = engine.estimate_slot_count(args.duration, &args.content_type, &args.seed)?;

    if args.json {
        print_json(&serde_json::json!({
            "duration": args.duration,
            "content_type": args.content_type,
            "seed": args.seed,
            "slots": slots,
        }))?;
    } else {
        println!("{slots}");
    }
    Ok(())
}
