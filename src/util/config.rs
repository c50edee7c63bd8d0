//! Workspace configuration (`tether.toml`).
//!
//! The file lives at the workspace root and marks it:
//!
//! ```toml
//! packages = ["packages/*"]
//!
//! [bootstrap]
//! strategy = "default:root"
//! ignore = "legacy-*"
//! concurrency = 4
//! npm-client = "npm"
//!
//! [linked-files]
//! prefix = "/* generated by tether */\n"
//! ```
//!
//! Command-line flags take precedence over the file.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::strategy::StrategySetting;

/// Workspace-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct WorkspaceConfig {
    /// Globs (relative to the root) of package directories
    pub packages: Vec<String>,

    /// Bootstrap settings
    pub bootstrap: BootstrapConfig,

    /// Shim settings; when present, `link`-strategy packages are placed at
    /// the root as a manifest + entry file pair instead of a symlink
    pub linked_files: Option<LinkedFilesConfig>,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        WorkspaceConfig {
            packages: vec!["packages/*".to_string()],
            bootstrap: BootstrapConfig::default(),
            linked_files: None,
        }
    }
}

/// `[bootstrap]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BootstrapConfig {
    /// Default strategy, `"<local>[:<external>]"`
    pub strategy: Option<StrategySetting>,

    /// Glob over package names to leave out of the bootstrap
    pub ignore: Option<String>,

    /// Maximum concurrent actions (None = number of CPUs)
    pub concurrency: Option<usize>,

    /// Installer executable
    pub npm_client: Option<String>,
}

/// `[linked-files]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkedFilesConfig {
    /// Text written before the `module.exports` line of every shim
    pub prefix: String,
}

impl WorkspaceConfig {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;

        Self::parse(&contents).with_context(|| format!("failed to parse config: {}", path.display()))
    }

    /// Parse configuration TOML.
    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Load configuration, falling back to defaults if the file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!("no config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Prefix for shim entry files, if shims are enabled.
    pub fn shim_prefix(&self) -> Option<&str> {
        self.linked_files.as_ref().map(|l| l.prefix.as_str())
    }
}

/// Default concurrency: one action per available CPU.
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
