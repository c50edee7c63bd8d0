//! Shared utilities

pub mod config;
pub mod diagnostic;
pub mod fs;
pub mod process;
pub mod progress;
pub mod tasks;

pub use config::WorkspaceConfig;
pub use diagnostic::Diagnostic;
pub use progress::Progress;
pub use tasks::{run_parallel, run_series, task, Task};
