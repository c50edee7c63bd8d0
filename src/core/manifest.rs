//! `package.json` manifest parsing.
//!
//! Only the fields the bootstrap needs are read: identity, the four
//! dependency tables, `bin`, and the optional `tether` override block.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use semver::Version;
use serde::{Deserialize, Serialize};

use crate::core::strategy::StrategySetting;
use crate::resolver::version::parse_version_lenient;

/// Manifest file name of every package.
pub const MANIFEST_NAME: &str = "package.json";

/// Private dependency directory of a package (and of the workspace root).
pub const NODE_MODULES: &str = "node_modules";

/// Binary shim directory inside [`NODE_MODULES`].
pub const BIN_DIR: &str = ".bin";

/// The parsed `package.json`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageManifest {
    pub name: Option<String>,

    pub version: Option<String>,

    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,

    #[serde(default)]
    pub dev_dependencies: BTreeMap<String, String>,

    #[serde(default)]
    pub peer_dependencies: BTreeMap<String, String>,

    #[serde(default)]
    pub optional_dependencies: BTreeMap<String, String>,

    /// Executables exposed by the package
    pub bin: Option<BinSpec>,

    /// Per-package bootstrap overrides
    #[serde(default)]
    pub tether: PackageOverrides,
}

impl PackageManifest {
    /// Load a manifest from a `package.json` file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest: {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("failed to parse manifest: {}", path.display()))
    }

    /// Parse manifest JSON.
    pub fn parse(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    /// All declared dependencies merged into one table.
    ///
    /// When a name appears in several tables, `dependencies` wins over
    /// `devDependencies`, which wins over optional and peer entries.
    pub fn all_dependencies(&self) -> BTreeMap<String, String> {
        let mut all = BTreeMap::new();
        for table in [
            &self.peer_dependencies,
            &self.optional_dependencies,
            &self.dev_dependencies,
            &self.dependencies,
        ] {
            for (name, range) in table {
                all.insert(name.clone(), range.clone());
            }
        }
        all
    }

    /// Parsed version, if the manifest declares a usable one.
    pub fn parsed_version(&self) -> Option<Version> {
        self.version.as_deref().and_then(parse_version_lenient)
    }
}

/// The `bin` field: a single script named after the package, or a map
/// of binary name to script path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BinSpec {
    Single(String),
    Map(BTreeMap<String, String>),
}

impl BinSpec {
    /// Expand into concrete entries. A single script is named after the
    /// package, without its `@scope/` prefix.
    pub fn entries(&self, package_name: &str) -> Vec<BinEntry> {
        match self {
            BinSpec::Single(path) => vec![BinEntry::new(unscoped_name(package_name), path)],
            BinSpec::Map(map) => map
                .iter()
                .map(|(name, path)| BinEntry::new(name.as_str(), path))
                .collect(),
        }
    }

    /// Number of binaries declared.
    pub fn len(&self) -> usize {
        match self {
            BinSpec::Single(_) => 1,
            BinSpec::Map(map) => map.len(),
        }
    }

    /// Whether no binary is declared (an empty map).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One binary: the shim name and the script path relative to the package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BinEntry {
    pub name: String,
    pub path: PathBuf,
}

impl BinEntry {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        BinEntry {
            name: name.into(),
            path: path.into(),
        }
    }
}

fn unscoped_name(name: &str) -> &str {
    match name.strip_prefix('@') {
        Some(rest) => rest.split_once('/').map(|(_, n)| n).unwrap_or(name),
        None => name,
    }
}

/// Bootstrap settings a package declares for itself under `"tether"`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PackageOverrides {
    /// Strategy used when this package is linked into others, and for
    /// installing this package's own external dependencies
    pub strategy: Option<StrategySetting>,

    /// Globs copied into consumers under the `copy` local strategy
    pub files: Vec<String>,
}

/// Read the version of a package installed in `dir/node_modules/<name>`.
///
/// A missing or unreadable manifest means "not installed".
pub fn installed_version(dir: &Path, name: &str) -> Option<Version> {
    let path = dir.join(NODE_MODULES).join(name).join(MANIFEST_NAME);
    if !path.exists() {
        return None;
    }
    match PackageManifest::load(&path) {
        Ok(manifest) => manifest.parsed_version(),
        Err(e) => {
            tracing::debug!("ignoring installed copy of `{}`: {:#}", name, e);
            None
        }
    }
}
