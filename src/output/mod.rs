//! Report rendering: analysis results and batch fix summaries as styled
//! flowing text. No tables.

pub mod terminal;

pub use terminal::TerminalPresenter;

use colored::Colorize;

use crate::models::impact::{AffectedTestCase, ImpactLevel};
use crate::models::maintenance::{BatchFixResult, MaintenanceResult};

/// Render a full analysis result for the terminal.
pub fn render_analysis(result: &MaintenanceResult) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        " {} {} {} {}\n",
        "▸".cyan().bold(),
        "Maintenance analysis".bold(),
        short_hash(&result.previous_commit_hash).dimmed(),
        format!("→ {}", short_hash(&result.commit_hash)).dimmed(),
    ));
    output.push_str(&format!("   {}\n\n", result.change_summary));

    if result.affected_tests.is_empty() {
        output.push_str(&format!("{}", "  ✔ No tests affected.\n".green()));
        return output;
    }

    let grouped = tests_by_file(&result.affected_tests);
    for (file, tests) in &grouped {
        output.push_str(&format!(" {}\n", file.bold()));
        for test in tests {
            let (icon, level) = impact_markers(test.impact_level);
            let name = match &test.test_class {
                Some(class) => format!("{}::{}", class, test.test_name),
                None => test.test_name.clone(),
            };
            output.push_str(&format!("   {icon} {level} {}\n", name.bold()));
            output.push_str(&format!("     {}\n", test.reason));
            if test.requires_update {
                output.push_str(&format!("     {} update required\n", "→".cyan()));
            }
        }
        output.push('\n');
    }

    output.push_str(&format!(
        "{}\n",
        "───────────────────────────────────".dimmed()
    ));
    let needing_update = result
        .affected_tests
        .iter()
        .filter(|t| t.requires_update)
        .count();
    output.push_str(&format!(
        " {} affected {} in {} {}, {} requiring updates\n",
        result.affected_tests.len().to_string().bold(),
        plural(result.affected_tests.len(), "test", "tests"),
        grouped.len().to_string().bold(),
        plural(grouped.len(), "file", "files"),
        needing_update.to_string().bold(),
    ));

    output
}

/// Render a batch remediation report, with a detail line per failure.
pub fn render_batch(result: &BatchFixResult) -> String {
    if result.outcomes.is_empty() {
        return format!("{}", "  Nothing to fix.\n".dimmed());
    }

    let mut output = String::new();
    output.push_str(&format!(
        " {} {}, {} {}\n",
        result.success_count.to_string().green().bold(),
        plural(result.success_count, "test fixed", "tests fixed"),
        result.fail_count.to_string().red().bold(),
        "failed".red(),
    ));

    for failure in result.failures() {
        output.push_str(&format!(
            "   {} {} {}\n",
            "✖".red().bold(),
            format!("{}::{}", failure.test_file, failure.test_name).bold(),
            failure
                .error
                .as_deref()
                .unwrap_or("unknown failure")
                .red(),
        ));
    }

    output
}

fn impact_markers(level: ImpactLevel) -> (String, String) {
    match level {
        ImpactLevel::Critical => (
            "✖".red().bold().to_string(),
            "critical".red().bold().to_string(),
        ),
        ImpactLevel::High => ("⚠".red().to_string(), "high".red().to_string()),
        ImpactLevel::Medium => (
            "⚠".yellow().bold().to_string(),
            "medium".yellow().bold().to_string(),
        ),
        ImpactLevel::Low => ("ℹ".blue().bold().to_string(), "low".blue().to_string()),
    }
}

fn short_hash(hash: &str) -> &str {
    &hash[..hash.len().min(8)]
}

fn plural(count: usize, one: &'static str, many: &'static str) -> &'static str {
    if count == 1 { one } else { many }
}

/// Affected tests grouped per test file, in first-seen order. Drives
/// the per-file sections of the analysis report.
pub fn tests_by_file(tests: &[AffectedTestCase]) -> indexmap::IndexMap<&str, Vec<&AffectedTestCase>> {
    let mut grouped: indexmap::IndexMap<&str, Vec<&AffectedTestCase>> =
        indexmap::IndexMap::new();
    for test in tests {
        grouped.entry(test.test_file.as_str()).or_default().push(test);
    }
    grouped
}
