//! Test utilities and mocks for Tether unit tests.
//!
//! This module provides on-disk workspace fixtures, an installer that
//! records its calls instead of spawning npm, and a way to snapshot the
//! link topology a bootstrap leaves behind.
//!
//! # Example
//!
//! ```rust,ignore
//! use tether::test_support::{basic_workspace, RecordingInstaller};
//!
//! #[test]
//! fn test_example() {
//!     let fixture = basic_workspace();
//!     let installer = RecordingInstaller::populating();
//!     bootstrap(&fixture.load(), &BootstrapOptions::default(), &installer).unwrap();
//!     assert_eq!(installer.calls().len(), 2);
//! }
//! ```

pub mod fixtures;

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{bail, Result};
use serde_json::json;
use walkdir::WalkDir;

use crate::core::manifest::NODE_MODULES;
use crate::resolver::version::parse_version_lenient;
use crate::resolver::Specifier;
use crate::sources::Installer;

// Re-export fixtures for convenience
pub use fixtures::*;

/// One recorded `install_into` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallCall {
    pub dir: PathBuf,
    pub specs: Vec<String>,
}

/// Installer that records calls instead of running npm.
///
/// When populating, each install writes `node_modules/<name>/package.json`
/// with the lowest version the range names, so later runs see it as
/// installed.
#[derive(Debug, Default)]
pub struct RecordingInstaller {
    calls: Mutex<Vec<InstallCall>>,
    populate: bool,
    bins: HashMap<String, String>,
    fail_on: Option<String>,
}

impl RecordingInstaller {
    /// Record calls without touching the filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record calls and write installed manifests.
    pub fn populating() -> Self {
        RecordingInstaller {
            populate: true,
            ..Self::default()
        }
    }

    /// Give the installed copy of `name` a `bin` script.
    pub fn with_bin(mut self, name: &str, script: &str) -> Self {
        self.bins.insert(name.to_string(), script.to_string());
        self
    }

    /// Fail any install that includes a specifier for `name`.
    pub fn failing_on(mut self, name: &str) -> Self {
        self.fail_on = Some(name.to_string());
        self
    }

    /// All calls so far, in completion order.
    pub fn calls(&self) -> Vec<InstallCall> {
        self.calls.lock().unwrap().clone()
    }

    /// The specifiers installed into `dir`, if it was installed into.
    pub fn specs_for(&self, dir: &Path) -> Option<Vec<String>> {
        self.calls()
            .into_iter()
            .find(|c| c.dir == dir)
            .map(|c| c.specs)
    }

    fn write_installed(&self, dir: &Path, spec: &Specifier) -> Result<()> {
        let version = lowest_version(&spec.range);
        let mut manifest = json!({ "name": spec.name, "version": version });
        if let Some(script) = self.bins.get(&spec.name) {
            manifest["bin"] = json!(script);
        }

        let pkg_dir = dir.join(NODE_MODULES).join(&spec.name);
        std::fs::create_dir_all(&pkg_dir)?;
        std::fs::write(pkg_dir.join("package.json"), manifest.to_string())?;
        Ok(())
    }
}

impl Installer for RecordingInstaller {
    fn name(&self) -> &str {
        "recording"
    }

    fn install_into(&self, dir: &Path, specs: &[Specifier]) -> Result<()> {
        self.calls.lock().unwrap().push(InstallCall {
            dir: dir.to_path_buf(),
            specs: specs.iter().map(|s| s.to_string()).collect(),
        });

        if let Some(ref name) = self.fail_on {
            if specs.iter().any(|s| &s.name == name) {
                bail!("install of `{}` failed", name);
            }
        }

        if self.populate {
            for spec in specs {
                self.write_installed(dir, spec)?;
            }
        }
        Ok(())
    }
}

/// The lowest version a simple range names: `^1.2.0` gives `1.2.0`.
fn lowest_version(range: &str) -> String {
    let first = range
        .split_whitespace()
        .next()
        .unwrap_or("")
        .trim_start_matches(['^', '~', '=', '>', '<']);
    parse_version_lenient(first)
        .map(|v| v.to_string())
        .unwrap_or_else(|| "1.0.0".to_string())
}

/// Snapshot of everything inside `node_modules` directories under `root`.
///
/// Keys are paths relative to `root`; values are `-> <target>` for
/// symlinks and `file` for regular files. Symlinks are not followed.
pub fn link_topology(root: &Path) -> BTreeMap<String, String> {
    WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().components().any(|c| c.as_os_str() == NODE_MODULES))
        .filter(|e| !e.file_type().is_dir())
        .map(|e| {
            let rel = e
                .path()
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/");
            let kind = if e.path_is_symlink() {
                let target = std::fs::read_link(e.path()).unwrap();
                format!("-> {}", target.display())
            } else {
                "file".to_string()
            };
            (rel, kind)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lowest_version() {
        assert_eq!(lowest_version("^1.2.0"), "1.2.0");
        assert_eq!(lowest_version("0.1.12"), "0.1.12");
        assert_eq!(lowest_version(">=2 <3"), "2.0.0");
        assert_eq!(lowest_version("latest"), "1.0.0");
    }

    #[test]
    fn test_recording_installer_populates() {
        let tmp = TempDir::new().unwrap();
        let installer = RecordingInstaller::populating().with_bin("tool", "cli.js");
        installer
            .install_into(tmp.path(), &[Specifier::new("tool", "^2.1.0")])
            .unwrap();

        assert_eq!(
            installer.specs_for(tmp.path()),
            Some(vec!["tool@^2.1.0".to_string()])
        );
        let manifest: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(tmp.path().join("node_modules/tool/package.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(manifest["version"], "2.1.0");
        assert_eq!(manifest["bin"], "cli.js");
    }
}
