//! Progress reporting for terminal output.
//!
//! Live-updating per-test status display for batch remediation runs,
//! with colored markers for queued, in-flight, fixed, and failed items.
//! Designed for interactive terminals; silenced with `--quiet`.

use std::io::{self, Write};
use std::sync::Mutex;

use colored::Colorize;
use indexmap::IndexMap;

/// Status of a single test in a batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemStatus {
    /// Queued, waiting its turn.
    Pending,
    /// Currently being fixed.
    InProgress,
    /// Fixed successfully.
    Done,
    /// Failed; the reason is recorded.
    Failed(String),
}

/// Tracks and renders live progress for a batch run.
///
/// Thread-safe so it can be shared via `Arc`, though batch processing
/// itself is strictly sequential.
pub struct ProgressTracker {
    inner: Mutex<ProgressState>,
    /// If false, all output is suppressed.
    enabled: bool,
}

struct ProgressState {
    /// test name → status, in processing order.
    items: IndexMap<String, ItemStatus>,
    /// Number of lines last printed (for clearing).
    rendered_lines: usize,
    /// Label for the header ("Regenerating" / "Improving coverage for").
    action: String,
}

impl ProgressTracker {
    /// `items` is the ordered list of test names; `action` labels the run.
    pub fn new(items: &[String], action: &str, enabled: bool) -> Self {
        let mut map = IndexMap::new();
        for item in items {
            map.insert(item.clone(), ItemStatus::Pending);
        }
        Self {
            inner: Mutex::new(ProgressState {
                items: map,
                rendered_lines: 0,
                action: action.to_string(),
            }),
            enabled,
        }
    }

    /// Update the status of one test and re-render.
    pub fn update(&self, item: &str, status: ItemStatus) {
        let mut state = self.inner.lock().expect("progress lock poisoned");
        state.items.insert(item.to_string(), status);
        if self.enabled {
            Self::render(&mut state);
        }
    }

    /// Print the initial listing.
    pub fn start(&self) {
        if !self.enabled {
            return;
        }
        let mut state = self.inner.lock().expect("progress lock poisoned");
        Self::render(&mut state);
    }

    /// Clear progress lines and print a final per-item summary.
    pub fn finish(&self) {
        if !self.enabled {
            return;
        }
        let mut state = self.inner.lock().expect("progress lock poisoned");
        Self::clear_lines(state.rendered_lines);
        state.rendered_lines = 0;

        let stderr = io::stderr();
        let mut handle = stderr.lock();
        for (item, status) in &state.items {
            let (icon, status_text) = match status {
                ItemStatus::Failed(reason) => {
                    ("✖".red().bold().to_string(), reason.red().to_string())
                }
                _ => ("✔".green().bold().to_string(), "done".green().to_string()),
            };
            let _ = writeln!(handle, "  {icon} {} {status_text}", item.dimmed());
        }
    }

    fn render(state: &mut ProgressState) {
        let stderr = io::stderr();
        let mut handle = stderr.lock();

        Self::clear_lines(state.rendered_lines);

        let mut lines = 0;
        let _ = writeln!(
            handle,
            "  {} {} {} test(s)",
            "▸".cyan().bold(),
            state.action,
            state.items.len(),
        );
        lines += 1;

        for (item, status) in &state.items {
            let (icon, status_text) = match status {
                ItemStatus::Pending => {
                    ("○".dimmed().to_string(), "waiting".dimmed().to_string())
                }
                ItemStatus::InProgress => {
                    ("◌".cyan().bold().to_string(), "fixing…".cyan().to_string())
                }
                ItemStatus::Done => {
                    ("✔".green().bold().to_string(), "done".green().to_string())
                }
                ItemStatus::Failed(reason) => {
                    ("✖".red().bold().to_string(), reason.red().to_string())
                }
            };
            let _ = writeln!(handle, "    {icon} {} {status_text}", item.dimmed());
            lines += 1;
        }

        let _ = handle.flush();
        state.rendered_lines = lines;
    }

    /// Move cursor up and clear `n` lines.
    fn clear_lines(n: usize) {
        if n == 0 {
            return;
        }
        let stderr = io::stderr();
        let mut handle = stderr.lock();
        for _ in 0..n {
            let _ = write!(handle, "\x1b[1A\x1b[2K");
        }
        let _ = handle.flush();
    }
}
