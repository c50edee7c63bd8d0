//! Filesystem linker.
//!
//! Every operation replaces whatever sits at its destination, whether that
//! is nothing, a stale symlink, a directory or a plain file. Applying the
//! same action twice leaves the same tree behind.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::json;

use crate::core::manifest::{PackageManifest, BIN_DIR, MANIFEST_NAME};
use crate::core::BinEntry;
use crate::util::fs::{
    ensure_dir, glob_files, is_symlink_to, make_executable, remove_path, symlink_dir, symlink_file,
    write_string,
};

/// Entry file of a shim.
pub const SHIM_ENTRY: &str = "index.js";

/// One filesystem mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkAction {
    /// `dest` becomes a symlink to the package directory `src`
    SymlinkPackage { src: PathBuf, dest: PathBuf },

    /// Each binary of the package in `src_pkg_dir` is linked into
    /// `dest_dir/.bin`
    SymlinkBinaries {
        src_pkg_dir: PathBuf,
        dest_dir: PathBuf,
        bins: Vec<BinEntry>,
    },

    /// `dest` becomes a manifest + entry file pair requiring `src`
    WriteShim {
        src: PathBuf,
        dest: PathBuf,
        name: String,
        prefix: String,
    },

    /// `dest_dir` becomes a real directory holding copies of `files`
    CopyFiles {
        src_dir: PathBuf,
        dest_dir: PathBuf,
        files: Vec<String>,
    },
}

impl LinkAction {
    /// Perform the mutation.
    pub fn apply(&self) -> Result<()> {
        tracing::debug!("{}", self);
        match self {
            LinkAction::SymlinkPackage { src, dest } => link_directory(src, dest),
            LinkAction::SymlinkBinaries {
                src_pkg_dir,
                dest_dir,
                bins,
            } => link_binary(src_pkg_dir, dest_dir, bins),
            LinkAction::WriteShim {
                src,
                dest,
                name,
                prefix,
            } => write_linked_dependency_shim(src, dest, name, prefix),
            LinkAction::CopyFiles {
                src_dir,
                dest_dir,
                files,
            } => copy_files(src_dir, dest_dir, files),
        }
    }
}

impl fmt::Display for LinkAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkAction::SymlinkPackage { src, dest } => {
                write!(f, "symlink {} -> {}", dest.display(), src.display())
            }
            LinkAction::SymlinkBinaries {
                src_pkg_dir,
                dest_dir,
                bins,
            } => write!(
                f,
                "link {} binaries of {} into {}",
                bins.len(),
                src_pkg_dir.display(),
                dest_dir.join(BIN_DIR).display()
            ),
            LinkAction::WriteShim { src, dest, .. } => {
                write!(f, "shim {} -> {}", dest.display(), src.display())
            }
            LinkAction::CopyFiles {
                src_dir,
                dest_dir,
                files,
            } => write!(
                f,
                "copy {} globs from {} to {}",
                files.len(),
                src_dir.display(),
                dest_dir.display()
            ),
        }
    }
}

/// Replace `dest` with a directory symlink to `src`.
///
/// A symlink already pointing at `src` is left alone.
pub fn link_directory(src: &Path, dest: &Path) -> Result<()> {
    if is_symlink_to(dest, src) {
        return Ok(());
    }
    remove_path(dest)?;
    if let Some(parent) = dest.parent() {
        ensure_dir(parent)?;
    }
    symlink_dir(src, dest).with_context(|| {
        format!(
            "failed to symlink {} -> {}",
            dest.display(),
            src.display()
        )
    })
}

/// Link every binary of the package in `src_pkg_dir` into `dest_dir/.bin`.
///
/// The target script does not have to exist yet; it may be produced by a
/// later build of the source package.
pub fn link_binary(src_pkg_dir: &Path, dest_dir: &Path, bins: &[BinEntry]) -> Result<()> {
    if bins.is_empty() {
        return Ok(());
    }

    let bin_dir = dest_dir.join(BIN_DIR);
    ensure_dir(&bin_dir)?;

    for bin in bins {
        let src = src_pkg_dir.join(&bin.path);
        let dest = bin_dir.join(&bin.name);

        remove_path(&dest)?;
        symlink_file(&src, &dest).with_context(|| {
            format!(
                "failed to link binary {} -> {}",
                dest.display(),
                src.display()
            )
        })?;

        if src.is_file() {
            make_executable(&src)?;
        }
    }
    Ok(())
}

/// Write a manifest + entry file pair at `dest` that re-exports `src`.
///
/// The version is taken from `src/package.json`.
pub fn write_linked_dependency_shim(src: &Path, dest: &Path, name: &str, prefix: &str) -> Result<()> {
    let manifest = PackageManifest::load(&src.join(MANIFEST_NAME))?;

    remove_path(dest)?;
    ensure_dir(dest)?;

    let shim_manifest = json!({
        "name": name,
        "version": manifest.version.unwrap_or_default(),
    });
    let shim_manifest = serde_json::to_string_pretty(&shim_manifest)?;
    write_string(&dest.join(MANIFEST_NAME), &format!("{}\n", shim_manifest))?;

    let src_path = serde_json::to_string(&src.to_string_lossy())?;
    write_string(
        &dest.join(SHIM_ENTRY),
        &format!("{}module.exports = require({});\n", prefix, src_path),
    )
}

/// Replace `dest_dir` with copies of the files under `src_dir` matching
/// `files`.
pub fn copy_files(src_dir: &Path, dest_dir: &Path, files: &[String]) -> Result<()> {
    if files.is_empty() {
        return Ok(());
    }

    let matched = glob_files(src_dir, files)?;

    remove_path(dest_dir)?;
    ensure_dir(dest_dir)?;

    for rel in matched {
        let src = src_dir.join(&rel);
        let dest = dest_dir.join(&rel);
        if let Some(parent) = dest.parent() {
            ensure_dir(parent)?;
        }
        std::fs::copy(&src, &dest)
            .with_context(|| format!("failed to copy {} to {}", src.display(), dest.display()))?;
    }
    Ok(())
}
