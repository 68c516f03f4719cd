// slidereel-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "Slidereel: deterministic slideshow renderer",
    long_about = "Turns a pool of still images into a seeded slideshow video using ffmpeg via slidereel-core."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Write logs to this file instead of the console
    #[arg(long, global = true, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Effects configuration file (JSON); built-in defaults when omitted
    #[arg(short, long, global = true, env = "SLIDEREEL_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory holding prepared images and manifests
    #[arg(long, global = true, env = "SLIDEREEL_CACHE_DIR", value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Renders a slideshow video from a pool of images
    Render(RenderArgs),
    /// Prints the number of slots a render would schedule
    Estimate(EstimateArgs),
    /// Prepares images for a resolution and fills the cache
    Prepare(PrepareArgs),
    /// Lists the transitions the installed ffmpeg supports
    Transitions(TransitionsArgs),
}

/// Image inputs shared by commands that read a pool.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Image files or directories of images (directories are not searched recursively)
    #[arg(short = 'i', long = "input", required = true, num_args = 1.., value_name = "PATH")]
    pub inputs: Vec<PathBuf>,
}

#[derive(Args, Debug, Clone, Copy)]
pub struct ResolutionArgs {
    /// Output width in pixels
    #[arg(long, default_value_t = 1920)]
    pub width: u32,

    /// Output height in pixels
    #[arg(long, default_value_t = 1080)]
    pub height: u32,
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Output video file
    #[arg(short = 'o', long = "output", required = true, value_name = "FILE")]
    pub output: PathBuf,

    /// Target duration in seconds
    #[arg(short = 'd', long, value_name = "SECONDS")]
    pub duration: f64,

    #[command(flatten)]
    pub resolution: ResolutionArgs,

    /// Output frame rate
    #[arg(long, default_value_t = 30)]
    pub fps: u32,

    /// Content type selecting pacing and transitions
    #[arg(short = 't', long, default_value = "long")]
    pub content_type: String,

    /// Schedule seed; a timestamp is used (and logged) when omitted
    #[arg(short, long)]
    pub seed: Option<String>,

    /// Override the configured render timeout
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Print the render report as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Do not draw a progress bar
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,
}

#[derive(Args, Debug)]
pub struct EstimateArgs {
    /// Target duration in seconds
    #[arg(short = 'd', long, value_name = "SECONDS")]
    pub duration: f64,

    /// Content type selecting pacing and transitions
    #[arg(short = 't', long, default_value = "long")]
    pub content_type: String,

    /// Schedule seed
    #[arg(short, long, required = true)]
    pub seed: String,

    /// Print the estimate as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct PrepareArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub resolution: ResolutionArgs,

    /// Print preparation statistics as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct TransitionsArgs {
    /// Print the list as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}
