// slidereel-cli/src/lib.rs
//
// Library portion of the slidereel CLI application.
// Contains argument definitions and command logic.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;

// Re-export items needed by the binary or integration tests
pub use cli::{Cli, Commands, EstimateArgs, PrepareArgs, RenderArgs, TransitionsArgs};
pub use commands::estimate::run_estimate;
pub use commands::prepare::run_prepare;
pub use commands::render::run_render;
pub use commands::transitions::run_transitions;
pub use error::{CliResult, exit_code};

/// Dispatches the parsed command line to its command.
pub fn run(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Commands::Render(args) => run_render(cli, args),
        Commands::Estimate(args) => run_estimate(cli, args),
        Commands::Prepare(args) => run_prepare(cli, args),
        Commands::Transitions(args) => run_transitions(cli, args),
    }
}
