//! Implementation of `tether ls`.

use anyhow::Result;
use serde::Serialize;

use crate::core::{StrategyResolver, Workspace};
use crate::resolver::DependencyMatcher;

/// One row of the package listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageInfo {
    pub name: String,
    pub version: String,
    /// Directory relative to the workspace root
    pub location: String,
    /// Effective strategy without run-level overrides
    pub strategy: String,
    /// Siblings this package links to
    pub links: Vec<String>,
}

/// Describe every package of the workspace.
pub fn list_packages(ws: &Workspace) -> Result<Vec<PackageInfo>> {
    let resolver = StrategyResolver::new(None, ws.config().bootstrap.strategy.clone());
    let matcher = DependencyMatcher::new(ws.packages());

    ws.packages()
        .iter()
        .map(|pkg| {
            let location = pkg
                .location()
                .strip_prefix(ws.root())
                .unwrap_or(pkg.location())
                .to_string_lossy()
                .replace('\\', "/");
            Ok(PackageInfo {
                name: pkg.name().to_string(),
                version: pkg.version().to_string(),
                location,
                strategy: resolver.resolve_for(pkg)?.to_string(),
                links: matcher
                    .linked_dependencies(pkg)
                    .iter()
                    .map(|p| p.name().to_string())
                    .collect(),
            })
        })
        .collect()
}
