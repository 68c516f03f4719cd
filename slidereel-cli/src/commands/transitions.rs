//! Implementation of the `transitions` command.

use crate::cli::{Cli, TransitionsArgs};
use crate::commands::{load_effects_config, print_json};
use crate::error::CliResult;

use console::style;
use slidereel_core::SlideshowEngine;
use slidereel_core::check_dependency;

/// Lists the xfade transitions the installed ffmpeg supports, marking the
/// ones each configured content type would draw from.
pub fn run_transitions(cli: &Cli, args: &TransitionsArgs) -> CliResult<()> {
    let config = load_effects_config(cli.config.as_deref())?;
    check_dependency("ffmpeg")?;

    let cache_dir = cli.cache_dir.clone().unwrap_or_else(super::default_cache_dir);
    let engine = SlideshowEngine::new(config, cache_dir);
    let supported = engine.supported_transitions()?;

    if args.json {
        let content_types: serde_json::Map<String, serde_json::Value> = engine
            .config()
            .content_types
            .iter()
            .map(|(name, ct)| {
                let usable: Vec<&String> = ct
                    .transitions
                    .iter()
                    .filter(|t| supported.contains(t))
                    .collect();
                (name.clone(), serde_json::json!(usable))
            })
            .collect();
        print_json(&serde_json::json!({
            "supported": supported,
            "content_types": content_types,
        }))?;
        return Ok(());
    }

    if supported.is_empty() {
        println!("{}", style("ffmpeg reports no xfade transitions").yellow());
        return Ok(());
    }
    println!("{}", style("Supported transitions").bold());
    for transition in &supported {
        println!("  {transition}");
    }
    for (name, ct) in &engine.config().content_types {
        let (usable, missing): (Vec<&String>, Vec<&String>) =
            ct.transitions.iter().partition(|t| supported.contains(t));
        println!(
            "{} {}: {}",
            style("Content type").bold(),
            name,
            if usable.is_empty() {
                "fade (fallback)".to_string()
            } else {
                usable.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ")
            }
        );
        if !missing.is_empty() {
            println!(
                "  unavailable: {}",
                missing.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ")
            );
        }
    }
    Ok(())
}
