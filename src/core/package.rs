//! Package - one workspace member.
//!
//! A Package combines the parts of its manifest the bootstrap reads with
//! its location on disk. Packages are immutable for the length of a run.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use semver::Version;

use crate::core::manifest::{
    BinEntry, BinSpec, PackageManifest, PackageOverrides, MANIFEST_NAME, NODE_MODULES,
};

/// A workspace package and its location.
#[derive(Debug, Clone)]
pub struct Package {
    /// Package name, possibly scoped (`@scope/name`)
    name: String,

    /// Declared version
    version: Version,

    /// Root directory of the package
    location: PathBuf,

    /// Dependencies of every kind, name -> range
    dependencies: BTreeMap<String, String>,

    /// Declared binaries
    bin: Option<BinSpec>,

    /// Bootstrap overrides from the manifest
    overrides: PackageOverrides,
}

impl Package {
    /// Create a package with no dependencies.
    pub fn new(name: impl Into<String>, version: Version, location: impl Into<PathBuf>) -> Self {
        Package {
            name: name.into(),
            version,
            location: location.into(),
            dependencies: BTreeMap::new(),
            bin: None,
            overrides: PackageOverrides::default(),
        }
    }

    /// Create a package from a parsed manifest located in `location`.
    pub fn from_manifest(manifest: PackageManifest, location: PathBuf) -> Result<Self> {
        let Some(name) = manifest.name.clone().filter(|n| !n.is_empty()) else {
            bail!("package at {} has no `name`", location.display());
        };
        let Some(version) = manifest.parsed_version() else {
            bail!(
                "package `{}` has a missing or invalid `version`: {:?}",
                name,
                manifest.version.as_deref().unwrap_or("")
            );
        };

        Ok(Package {
            name,
            version,
            dependencies: manifest.all_dependencies(),
            bin: manifest.bin,
            overrides: manifest.tether,
            location,
        })
    }

    /// Load a package from its directory.
    pub fn load(dir: &Path) -> Result<Self> {
        let manifest = PackageManifest::load(&dir.join(MANIFEST_NAME))?;
        Self::from_manifest(manifest, dir.to_path_buf())
    }

    /// Add a dependency.
    pub fn with_dependency(mut self, name: impl Into<String>, range: impl Into<String>) -> Self {
        self.dependencies.insert(name.into(), range.into());
        self
    }

    /// Set the binaries.
    pub fn with_bin(mut self, bin: BinSpec) -> Self {
        self.bin = Some(bin);
        self
    }

    /// Get the package name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the package version.
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Get the package root directory.
    pub fn location(&self) -> &Path {
        &self.location
    }

    /// The package's private dependency directory.
    pub fn node_modules(&self) -> PathBuf {
        self.location.join(NODE_MODULES)
    }

    /// All declared dependencies.
    pub fn dependencies(&self) -> &BTreeMap<String, String> {
        &self.dependencies
    }

    /// The declared range for a dependency.
    pub fn dependency_range(&self, name: &str) -> Option<&str> {
        self.dependencies.get(name).map(String::as_str)
    }

    /// Get the declared binaries.
    pub fn bin(&self) -> Option<&BinSpec> {
        self.bin.as_ref()
    }

    /// Binaries as concrete entries, empty when none are declared.
    pub fn bin_entries(&self) -> Vec<BinEntry> {
        self.bin
            .as_ref()
            .map(|bin| bin.entries(&self.name))
            .unwrap_or_default()
    }

    /// Get the bootstrap overrides.
    pub fn overrides(&self) -> &PackageOverrides {
        &self.overrides
    }
}

impl std::fmt::Display for Package {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} v{}", self.name, self.version)
    }
}

impl PartialEq for Package {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.location == other.location
    }
}

impl Eq for Package {}
