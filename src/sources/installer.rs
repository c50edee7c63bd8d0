//! Installer trait - the interface to an external package manager.

use std::path::Path;

use anyhow::Result;

use crate::resolver::Specifier;

/// Installs registry packages into a directory.
///
/// Implementations are shared across worker threads.
pub trait Installer: Send + Sync {
    /// Name for logs.
    fn name(&self) -> &str;

    /// Install `specs` into `dir/node_modules`.
    ///
    /// Called at most once per directory per run, never with an empty list.
    fn install_into(&self, dir: &Path, specs: &[Specifier]) -> Result<()>;
}
