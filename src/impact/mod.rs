//! Impact classification: deterministic rules turning per-file change
//! statistics into severity-ranked, typed impact records.
//!
//! Classification is a pure function of the change list. Line numbers on
//! emitted records are left unset; they are display hints, not classifier
//! output, and nothing should assert on them.

use crate::models::change::{ChangeSummary, ChangeType, CodeChange};
use crate::models::impact::{AffectedTestCase, ImpactLevel};

/// Churn above this requires a test update.
const REQUIRES_UPDATE_THRESHOLD: u32 = 5;

/// Classify the affected tests and summarize the change set.
///
/// Emits one record per (change × changed function), plus a generic
/// `test_general` record for changes that added lines without any named
/// function.
pub fn classify(changes: &[CodeChange]) -> (Vec<AffectedTestCase>, ChangeSummary) {
    let mut tests: Vec<AffectedTestCase> = Vec::new();

    for change in changes {
        let stem = file_stem(&change.file_path);
        let test_file = format!("tests/test_{stem}.py");
        let total = change.total_changes();
        let level = impact_level_for(total);
        let requires_update = total > REQUIRES_UPDATE_THRESHOLD;

        for function in &change.changed_functions {
            tests.push(AffectedTestCase {
                test_file: test_file.clone(),
                test_name: format!("test_{function}"),
                test_class: Some(format!("Test{}", capitalize(&stem))),
                impact_level: level,
                reason: format!(
                    "Function \"{function}\" was modified. {} lines added, {} lines removed.",
                    change.lines_added, change.lines_removed
                ),
                requires_update,
                line_number: None,
                source_file: Some(change.file_path.clone()),
                source_function: Some(function.clone()),
            });
        }

        if change.changed_functions.is_empty() && change.lines_added > 0 {
            let file_name = change
                .file_path
                .rsplit('/')
                .next()
                .unwrap_or(&change.file_path);
            tests.push(AffectedTestCase {
                test_file: test_file.clone(),
                test_name: "test_general".into(),
                test_class: None,
                impact_level: ImpactLevel::Medium,
                reason: format!(
                    "File \"{file_name}\" was modified. Code structure may have changed."
                ),
                requires_update: true,
                line_number: None,
                source_file: Some(change.file_path.clone()),
                source_function: None,
            });
        }
    }

    let summary = summarize(changes);
    (tests, summary)
}

/// Aggregate change statistics across all files.
pub fn summarize(changes: &[CodeChange]) -> ChangeSummary {
    let lines_added = changes.iter().map(|c| c.lines_added).sum();
    let lines_removed = changes.iter().map(|c| c.lines_removed).sum();

    ChangeSummary {
        files_changed: changes.len(),
        functions_changed: ChangeSummary::dedup_functions(changes),
        lines_added,
        lines_removed,
        change_type: change_type_for(lines_added, lines_removed),
    }
}

/// Severity from total churn: >20 critical, >10 high, <5 low, else medium.
pub fn impact_level_for(total_changes: u32) -> ImpactLevel {
    if total_changes > 20 {
        ImpactLevel::Critical
    } else if total_changes > 10 {
        ImpactLevel::High
    } else if total_changes < 5 {
        ImpactLevel::Low
    } else {
        ImpactLevel::Medium
    }
}

/// Change type from added/removed ratios. Rules are evaluated in this
/// exact order; the first match wins. Pure deletions are checked before
/// the refactor ratio so that removing code without adding any always
/// classifies as breaking.
pub fn change_type_for(added: u32, removed: u32) -> ChangeType {
    if added > removed * 2 {
        ChangeType::FeatureAddition
    } else if removed > 0 && added == 0 {
        ChangeType::BreakingChange
    } else if removed > added * 2 {
        ChangeType::Refactor
    } else {
        ChangeType::BugFix
    }
}

/// Basename without its extension: `src/calc.py` → `calc`.
fn file_stem(path: &str) -> String {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    file_name
        .strip_suffix(".py")
        .unwrap_or(file_name)
        .to_string()
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
