//! High-level operations.
//!
//! This module contains the implementation of Tether commands.

pub mod bootstrap;
pub mod list;

pub use bootstrap::{
    bootstrap, bootstrap_with, plan_bootstrap, BootstrapOptions, BootstrapPlan, BootstrapSummary,
    PackagePlan, VersionMismatch,
};
pub use list::{list_packages, PackageInfo};
