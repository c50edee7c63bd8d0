//! Tether CLI - links the packages of a JavaScript monorepo together

use std::io::IsTerminal;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tether::core::StrategyError;
use tether::util::diagnostic;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        match e.downcast_ref::<StrategyError>() {
            Some(strategy) => {
                diagnostic::emit(&strategy.to_diagnostic(), std::io::stderr().is_terminal())
            }
            None => eprintln!("error: {:#}", e),
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("tether=debug")
    } else if cli.quiet {
        EnvFilter::new("tether=warn")
    } else {
        EnvFilter::new("tether=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    // Progress bars only make sense on a terminal, and not next to debug logs
    let progress = !cli.quiet && !cli.verbose && std::io::stderr().is_terminal();

    match cli.command {
        Commands::Bootstrap(args) => commands::bootstrap::execute(args, cli.root, progress),
        Commands::Plan(args) => commands::plan::execute(args, cli.root),
        Commands::Ls(args) => commands::ls::execute(args, cli.root),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
