//! Dependency resolution.
//!
//! Decides for every declared dependency whether it is satisfied by a
//! sibling workspace package or must be installed, and where. Resolution
//! is pure apart from the [`InstallState`] lookups of already installed
//! copies.

pub mod hoist;
pub mod matcher;
pub mod version;

pub use hoist::{
    DependencyRequest, DiskInstallState, HoistPlanner, HoistWarning, InstallPlan, InstallState,
    InstallTarget, Specifier,
};
pub use matcher::{DependencyMatcher, SiblingMatch};
pub use version::{satisfies, VersionRange};
