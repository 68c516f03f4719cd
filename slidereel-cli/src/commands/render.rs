//! Implementation of the `render` command.
//!
//! Resolves the pool, builds the request, drives the engine with an
//! `indicatif` progress bar and prints the render report.

use crate::cli::{Cli, RenderArgs};
use crate::commands::{collect_images, default_cache_dir, load_effects_config, print_json, require_tools};
use crate::error::CliResult;
use crate::logging::get_timestamp;

use console::style;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::{error, info, warn};
use slidereel_core::{
    CoreError, ProgressCallback, RenderReport, SlideshowEngine, SlideshowRequest,
    SlideshowRequestBuilder, format_bytes, format_duration,
};
use std::sync::Arc;
use std::time::Duration;

/// Builds the request from the command line; a missing seed becomes a timestamp.
pub fn build_request(args: &RenderArgs, images: Vec<std::path::PathBuf>) -> CliResult<SlideshowRequest> {
    let seed = match &args.seed {
        Some(seed) => seed.clone(),
        None => {
            let seed = get_timestamp();
            info!("No seed given, using '{}' (pass --seed {} to reproduce)", seed, seed);
            seed
        }
    };
    SlideshowRequestBuilder::new()
        .images(images)
        .output(args.output.clone())
        .duration(args.duration)
        .resolution(args.resolution.width, args.resolution.height)
        .fps(args.fps)
        .content_type(&args.content_type)
        .seed(&seed)
        .build()
}

fn progress_bar(hidden: bool) -> ProgressBar {
    let bar = ProgressBar::new(100);
    if hidden || !console::Term::stderr().is_term() {
        bar.set_draw_target(ProgressDrawTarget::hidden());
    }
    let style = ProgressStyle::with_template("{spinner} Rendering [{bar:40}] {pos:>3}% ({elapsed})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    bar.set_style(style);
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

/// Runs the `render` command.
pub fn run_render(cli: &Cli, args: &RenderArgs) -> CliResult<()> {
    let config = load_effects_config(cli.config.as_deref())?;
    let images = collect_images(&args.input)?;
    let request = build_request(args, images)?;
    require_tools()?;

    if let Some(parent) = request.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let cache_dir = cli.cache_dir.clone().unwrap_or_else(default_cache_dir);
    let engine = SlideshowEngine::new(config, cache_dir);

    let mut options = engine.default_render_options();
    if let Some(timeout) = args.timeout {
        options.timeout = Duration::from_secs(timeout);
    }
    let bar = progress_bar(args.json || args.no_progress);
    let bar_handle = bar.clone();
    let callback: ProgressCallback = Arc::new(move |percent: f32| {
        bar_handle.set_position(percent.clamp(0.0, 100.0) as u64);
    });
    options.progress = Some(callback);

    let result = engine.render_slideshow_with(&request, &options);
    bar.finish_and_clear();

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            if let Some(tail) = e.stderr_tail().filter(|t| !t.is_empty()) {
                error!("ffmpeg output:\n{}", tail);
            }
            if e.is_fallback_eligible() {
                warn!("This failure allows retrying with a simpler render strategy");
            }
            return Err(e);
        }
    };

    if args.json {
        print_json(&serde_json::to_value(&report)?)?;
    } else {
        print_summary(&report);
    }

    if report.is_success() {
        Ok(())
    } else {
        Err(CoreError::OperationFailed(format!(
            "output {} failed validation: {}",
            report.output.display(),
            report.validation.get_failures().join("; ")
        )))
    }
}

fn print_summary(report: &RenderReport) {
    println!("{}", style("Render complete").bold());
    println!("  Output:      {}", report.output.display());
    println!("  Slots:       {}", report.slot_count);
    println!("  Transitions: {}", report.transitions.join(", "));
    println!(
        "  Prepared:    {} reused, {} composites, {} passthrough{}",
        report.prepare.reused,
        report.prepare.composites_generated,
        report.prepare.passthrough,
        if report.prepare.cache_hit { " (cache hit)" } else { "" }
    );
    println!("  Render time: {}", format_duration(report.render_secs));
    println!("  Size:        {}", format_bytes(report.output_size));
    for (name, passed, message) in report.validation.get_validation_steps() {
        let mark = if passed {
            style("ok").green()
        } else {
            style("FAILED").red()
        };
        println!("  {:<12} {} {}", format!("{name}:"), mark, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use crate::cli::Commands;

    fn render_args(extra: &[&str]) -> RenderArgs {
        let mut argv = vec!["slidereel", "render", "-i", "pics", "-o", "out/show.mp4", "-d", "20"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Render(args) => args,
            _ => panic!("expected render"),
        }
    }

    #[test]
    fn test_build_request_uses_given_seed() {
        let args = render_args(&["--seed", "fixed", "-t", "short", "--fps", "25"]);
        let request = build_request(&args, vec!["pics/a.jpg".into()]).unwrap();
        assert_eq!(request.seed, "fixed");
        assert_eq!(request.content_type, "short");
        assert_eq!(request.fps, 25);
        assert_eq!(request.width, 1920);
        assert_eq!(request.duration, 20.0);
    }

    #[test]
    fn test_build_request_generates_seed() {
        let args = render_args(&[]);
        let request = build_request(&args, vec!["pics/a.jpg".into()]).unwrap();
        assert_eq!(request.seed.len(), 15);
    }

    #[test]
    fn test_build_request_rejects_zero_fps() {
        let args = render_args(&["--seed", "s", "--fps", "0"]);
        assert!(build_request(&args, vec!["pics/a.jpg".into()]).is_err());
    }
}
