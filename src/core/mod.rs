//! Core data structures for Tether.
//!
//! This module contains the foundational types used throughout Tether:
//! - Package manifests (`package.json`) and binary entries
//! - Workspace packages and the workspace itself
//! - Bootstrap strategies and their resolution

pub mod manifest;
pub mod package;
pub mod strategy;
pub mod workspace;

pub use manifest::{BinEntry, BinSpec, PackageManifest, PackageOverrides};
pub use package::Package;
pub use strategy::{ExternalStrategy, LocalStrategy, Strategy, StrategyError, StrategyResolver};
pub use workspace::{find_workspace_root, Workspace, CONFIG_NAME};
