//! Code-change types: per-file changes and the aggregate change summary.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The changes to one file between two commits.
///
/// Produced per file by diff collection and owned by the maintenance
/// pipeline for the duration of one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeChange {
    pub file_path: String,
    pub old_content: String,
    pub new_content: String,
    pub lines_added: u32,
    pub lines_removed: u32,
    /// Names of functions touched by this change, in source order.
    pub changed_functions: Vec<String>,
}

impl CodeChange {
    /// Total churn for this file.
    pub fn total_changes(&self) -> u32 {
        self.lines_added + self.lines_removed
    }
}

/// Coarse classification of a commit's intent, derived from
/// added/removed line ratios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChangeType {
    Refactor,
    FeatureAddition,
    BugFix,
    BreakingChange,
}

/// Aggregate statistics for one commit range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeSummary {
    pub files_changed: usize,
    /// De-duplicated union of changed function names, first-seen order.
    pub functions_changed: Vec<String>,
    pub lines_added: u32,
    pub lines_removed: u32,
    pub change_type: ChangeType,
}

impl ChangeSummary {
    /// De-duplicate function names across changes, preserving the order in
    /// which they first appear.
    pub fn dedup_functions<'a>(changes: impl IntoIterator<Item = &'a CodeChange>) -> Vec<String> {
        let mut seen: IndexSet<String> = IndexSet::new();
        for change in changes {
            for name in &change.changed_functions {
                seen.insert(name.clone());
            }
        }
        seen.into_iter().collect()
    }
}

impl fmt::Display for ChangeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} file(s), {} function(s), +{} -{} ({})",
            self.files_changed,
            self.functions_changed.len(),
            self.lines_added,
            self.lines_removed,
            self.change_type,
        )
    }
}
