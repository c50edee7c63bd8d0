//! Progress reporting for long-running phases.

use indicatif::{ProgressBar, ProgressStyle};

/// A progress bar that may be disabled.
///
/// Clones share the same bar, so workers on other threads can tick it.
#[derive(Debug, Clone, Default)]
pub struct Progress {
    bar: Option<ProgressBar>,
}

impl Progress {
    /// A progress bar over `total` steps, shown only when `enabled`.
    pub fn new(enabled: bool, total: usize, prefix: &str) -> Self {
        if !enabled || total == 0 {
            return Self::hidden();
        }

        let bar = ProgressBar::new(total as u64);
        if let Ok(style) =
            ProgressStyle::default_bar().template("{prefix:>12.cyan.bold} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            bar.set_style(style.progress_chars("#>-"));
        }
        bar.set_prefix(prefix.to_string());
        Progress { bar: Some(bar) }
    }

    /// A progress bar that reports nothing.
    pub fn hidden() -> Self {
        Progress { bar: None }
    }

    /// Whether the bar is displayed.
    pub fn is_enabled(&self) -> bool {
        self.bar.is_some()
    }

    /// Advance by one step, showing `msg`.
    pub fn tick(&self, msg: &str) {
        if let Some(ref bar) = self.bar {
            bar.set_message(msg.to_string());
            bar.inc(1);
        }
    }

    /// Complete the bar and remove it from the terminal.
    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}
