//! Workspace - the monorepo root and its packages.
//!
//! A Workspace is read once per run: the `tether.toml` at the root and the
//! `package.json` of every directory matched by its package globs.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use glob::Pattern;

use crate::core::manifest::{MANIFEST_NAME, NODE_MODULES};
use crate::core::Package;
use crate::util::config::WorkspaceConfig;

/// Workspace configuration file name.
pub const CONFIG_NAME: &str = "tether.toml";

/// A workspace containing its configuration and member packages.
#[derive(Debug)]
pub struct Workspace {
    /// Workspace root directory
    root: PathBuf,

    /// Parsed `tether.toml`
    config: WorkspaceConfig,

    /// Member packages, in discovery order
    packages: Vec<Package>,
}

impl Workspace {
    /// Create a workspace from already discovered packages.
    pub fn new(root: impl Into<PathBuf>, config: WorkspaceConfig, packages: Vec<Package>) -> Self {
        Workspace {
            root: root.into(),
            config,
            packages,
        }
    }

    /// Load the workspace rooted at `root`.
    pub fn load(root: &Path) -> Result<Self> {
        let config = WorkspaceConfig::load_or_default(&root.join(CONFIG_NAME))?;
        let packages = discover_packages(root, &config.packages)?;
        tracing::debug!(
            "discovered {} packages under {}",
            packages.len(),
            root.display()
        );

        Ok(Workspace {
            root: root.to_path_buf(),
            config,
            packages,
        })
    }

    /// Get the workspace root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the configuration.
    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    /// Get all packages.
    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    /// Find a package by name.
    pub fn package(&self, name: &str) -> Option<&Package> {
        self.packages.iter().find(|p| p.name() == name)
    }

    /// The shared root dependency directory.
    pub fn root_node_modules(&self) -> PathBuf {
        self.root.join(NODE_MODULES)
    }

    /// Packages whose name does not match the `ignore` glob.
    pub fn filter_packages(&self, ignore: Option<&str>) -> Result<Vec<&Package>> {
        let Some(ignore) = ignore.filter(|s| !s.is_empty()) else {
            return Ok(self.packages.iter().collect());
        };

        let pattern = Pattern::new(ignore)
            .with_context(|| format!("invalid ignore pattern: {}", ignore))?;

        let (ignored, kept): (Vec<&Package>, Vec<&Package>) =
            self.packages.iter().partition(|p| pattern.matches(p.name()));

        for pkg in &ignored {
            tracing::debug!("ignoring package `{}`", pkg.name());
        }

        Ok(kept)
    }
}

/// Find the packages matched by `patterns` under `root`.
///
/// Directories without a `package.json` and anything inside `node_modules`
/// are skipped. Two packages with the same name are an error.
pub fn discover_packages(root: &Path, patterns: &[String]) -> Result<Vec<Package>> {
    let mut packages: Vec<Package> = Vec::new();
    let mut seen: HashMap<String, PathBuf> = HashMap::new();

    for pattern in patterns {
        let full_pattern = root.join(pattern);
        let pattern_str = full_pattern.to_string_lossy();

        for entry in glob::glob(&pattern_str)
            .with_context(|| format!("invalid package pattern: {}", pattern))?
        {
            let dir = match entry {
                Ok(dir) => dir,
                Err(e) => {
                    tracing::warn!("glob error: {}", e);
                    continue;
                }
            };

            if !dir.join(MANIFEST_NAME).is_file()
                || dir.components().any(|c| c.as_os_str() == NODE_MODULES)
            {
                continue;
            }

            let pkg = Package::load(&dir)?;
            if let Some(previous) = seen.get(pkg.name()) {
                if previous == &dir {
                    continue;
                }
                bail!(
                    "package `{}` is defined twice: {} and {}",
                    pkg.name(),
                    previous.display(),
                    dir.display()
                );
            }
            seen.insert(pkg.name().to_string(), dir);
            packages.push(pkg);
        }
    }

    Ok(packages)
}

/// Find the nearest directory at or above `start` containing `tether.toml`.
pub fn find_workspace_root(start: &Path) -> Result<PathBuf> {
    for dir in start.ancestors() {
        if dir.join(CONFIG_NAME).is_file() {
            return Ok(dir.to_path_buf());
        }
    }
    bail!(
        "could not find `{}` in `{}` or any parent directory",
        CONFIG_NAME,
        start.display()
    )
}
