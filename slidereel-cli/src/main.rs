// slidereel-cli/src/main.rs
//
// Entry point for the slidereel command-line tool: parses arguments, installs
// logging, runs the selected command and maps failures to exit codes.

use anyhow::Context;
use clap::Parser;
use log::error;
use slidereel_cli::{Cli, exit_code, logging, run};
use std::process;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init_logging(cli.verbose, cli.log_file.as_deref())
        .context("failed to initialize logging")?;

    if let Err(e) = run(&cli) {
        if cli.log_file.is_some() {
            error!("{e}");
        }
        eprintln!("Error: {e}");
        process::exit(exit_code(&e));
    }
    Ok(())
}
