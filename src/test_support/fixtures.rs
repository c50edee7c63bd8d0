//! Test fixtures for common test scenarios.
//!
//! A [`WorkspaceFixture`] lays out a monorepo on disk inside a temporary
//! directory: `tether.toml`, member `package.json` files and copies of
//! packages that are "already installed".

use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use tempfile::TempDir;

use crate::core::Workspace;

/// An on-disk workspace that is deleted when dropped.
#[derive(Debug)]
pub struct WorkspaceFixture {
    dir: TempDir,
}

impl WorkspaceFixture {
    /// Create an empty workspace with an empty `tether.toml`.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        std::fs::write(dir.path().join("tether.toml"), "").expect("failed to write tether.toml");
        WorkspaceFixture { dir }
    }

    /// The workspace root.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// A path relative to the root.
    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    /// Directory of a member package created by [`Self::package`].
    pub fn package_dir(&self, name: &str) -> PathBuf {
        self.path("packages").join(dir_name(name))
    }

    /// Replace `tether.toml`.
    pub fn config(self, contents: &str) -> Self {
        self.file("tether.toml", contents)
    }

    /// Write an arbitrary file.
    pub fn file(self, rel: &str, contents: &str) -> Self {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create parent dir");
        }
        std::fs::write(&path, contents).expect("failed to write fixture file");
        self
    }

    /// Add a member with `dependencies` under `packages/<name>`.
    pub fn package(self, name: &str, version: &str, deps: &[(&str, &str)]) -> Self {
        let manifest = json!({
            "name": name,
            "version": version,
            "dependencies": deps_object(deps),
        });
        self.manifest(name, manifest)
    }

    /// Add a member from a full manifest.
    pub fn manifest(self, name: &str, manifest: Value) -> Self {
        let rel = format!("packages/{}/package.json", dir_name(name));
        let contents = serde_json::to_string_pretty(&manifest).expect("invalid manifest");
        self.file(&rel, &contents)
    }

    /// Pretend `name@version` is installed in `rel_dir/node_modules`.
    pub fn installed(self, rel_dir: &str, name: &str, version: &str) -> Self {
        let rel = format!("{}/node_modules/{}/package.json", rel_dir, name);
        let contents = json!({ "name": name, "version": version }).to_string();
        self.file(rel.trim_start_matches("./"), &contents)
    }

    /// Load the workspace.
    pub fn load(&self) -> Workspace {
        Workspace::load(self.root()).expect("failed to load fixture workspace")
    }
}

impl Default for WorkspaceFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A `dependencies` object.
pub fn deps_object(deps: &[(&str, &str)]) -> Value {
    let map: serde_json::Map<String, Value> = deps
        .iter()
        .map(|(name, range)| (name.to_string(), Value::String(range.to_string())))
        .collect();
    Value::Object(map)
}

/// The basic four-package workspace used throughout the tests.
///
/// - `package-1` depends on `package-2@^1.0.0` (linked) and `foo@^1.0.0`
/// - `package-2` has no dependencies
/// - `package-3` depends on `foo@0.1.12`
/// - `package-4` depends on `package-1@^0.0.0` (a mismatch)
pub fn basic_workspace() -> WorkspaceFixture {
    WorkspaceFixture::new()
        .package(
            "package-1",
            "1.0.0",
            &[("package-2", "^1.0.0"), ("foo", "^1.0.0")],
        )
        .package("package-2", "1.0.0", &[])
        .package("package-3", "1.0.0", &[("foo", "0.1.12")])
        .package("package-4", "1.0.0", &[("package-1", "^0.0.0")])
}

fn dir_name(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}
