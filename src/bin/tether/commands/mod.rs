//! Command implementations

pub mod bootstrap;
pub mod completions;
pub mod ls;
pub mod plan;

use std::path::PathBuf;

use anyhow::Result;

use tether::core::{find_workspace_root, Workspace};

/// Load the workspace at `root`, or the one containing the current directory.
pub fn load_workspace(root: Option<PathBuf>) -> Result<Workspace> {
    let root = match root {
        Some(root) => root,
        None => find_workspace_root(&std::env::current_dir()?)?,
    };
    Workspace::load(&root)
}
