//! `tether ls` command

use std::path::PathBuf;

use anyhow::Result;

use crate::cli::LsArgs;
use crate::commands::load_workspace;
use tether::ops::list_packages;

pub fn execute(args: LsArgs, root: Option<PathBuf>) -> Result<()> {
    let ws = load_workspace(root)?;
    let infos = list_packages(&ws)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&infos)?);
        return Ok(());
    }

    if infos.is_empty() {
        tracing::warn!("no packages found under {}", ws.root().display());
        return Ok(());
    }

    let width = infos.iter().map(|i| i.name.len()).max().unwrap_or(0);
    for info in &infos {
        println!(
            "{:<width$}  v{:<10} {:<16} {}",
            info.name,
            info.version,
            info.strategy,
            info.location,
            width = width
        );
    }
    Ok(())
}
