mod cli;
mod commands;
mod config;
mod error;
mod logging;
mod utils;

use crate::cli::{Cli, Commands};
use crate::error::Result;
use clap::Parser;
use tracing::{debug, error, info};

fn main() {
    if let Err(e) = run_app() {
        eprintln!("\n❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn run_app() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.clone())?;

    info!(
        "🚀 Annealyze CLI v{} starting up.",
        env!("CARGO_PKG_VERSION")
    );
    debug!("Full CLI arguments parsed: {:?}", &cli);

    let command_result = match cli.command {
        Commands::Unfold(args) => {
            info!("Dispatching to 'unfold' command.");
            commands::unfold::run(args)
        }
        Commands::Fold(args) => {
            info!("Dispatching to 'fold' command.");
            commands::fold::run(args)
        }
        Commands::Timing(args) => {
            info!("Dispatching to 'timing' command.");
            commands::timing::run(args)
        }
        Commands::DotBracket(args) => {
            info!("Dispatching to 'dot-bracket' command.");
            commands::dot_bracket::run(args)
        }
        Commands::Experiments(args) => {
            info!("Dispatching to 'experiments' command.");
            commands::experiments::run(args)
        }
    };

    match &command_result {
        Ok(_) => info!("✅ Command completed successfully."),
        Err(e) => error!("❌ Command failed: {}", e),
    }

    command_result
}
