//! Tether - links the packages of a JavaScript monorepo together
//!
//! This crate provides the core library functionality for Tether,
//! including sibling matching, dependency hoisting, linking, and
//! bounded-concurrency execution of the bootstrap.

pub mod core;
pub mod linker;
pub mod ops;
pub mod resolver;
pub mod sources;
pub mod util;

/// Test utilities for Tether unit tests.
///
/// This module is only available when compiling with `--cfg test`. It
/// provides on-disk workspace fixtures and a recording installer.
#[cfg(test)]
pub mod test_support;

pub use core::{
    manifest::BinSpec, package::Package, strategy::Strategy, workspace::Workspace,
};

pub use resolver::{InstallPlan, InstallTarget};
