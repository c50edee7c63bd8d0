//! `tether bootstrap` command

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;

use crate::cli::BootstrapArgs;
use crate::commands::load_workspace;
use tether::ops::{bootstrap, BootstrapOptions};
use tether::sources::{NpmInstaller, DEFAULT_CLIENT};

pub fn execute(args: BootstrapArgs, root: Option<PathBuf>, progress: bool) -> Result<()> {
    let start = Instant::now();
    let ws = load_workspace(root)?;

    // CLI flags take precedence over tether.toml
    let client = args
        .npm_client
        .or_else(|| ws.config().bootstrap.npm_client.clone())
        .unwrap_or_else(|| DEFAULT_CLIENT.to_string());
    let installer = NpmInstaller::new(client);

    let opts = BootstrapOptions {
        strategy: args.strategy.strategy,
        ignore: args.strategy.ignore,
        concurrency: args.concurrency,
        progress,
    };

    let summary = bootstrap(&ws, &opts, &installer)?;

    tracing::info!(
        "Bootstrapped {} packages ({} dependencies installed, {} links) in {:.2}s",
        summary.packages,
        summary.installed,
        summary.links,
        start.elapsed().as_secs_f64()
    );
    Ok(())
}
