//! Package sources.
//!
//! Workspace packages come from disk; everything else is fetched by an
//! external npm-compatible installer.

pub mod installer;
pub mod npm;

pub use installer::Installer;
pub use npm::{InstallError, NpmInstaller, DEFAULT_CLIENT};
