//! Maintenance run results, user decisions, and batch fix outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::change::{ChangeSummary, CodeChange};
use super::impact::AffectedTestCase;

/// The published result of one analysis run.
///
/// Mutated only by replacement: a new analysis run swaps in a whole new
/// value through the session holder, never edits fields of a published one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceResult {
    /// Opaque identifier correlating this run with the backend.
    pub context_id: String,
    pub commit_hash: String,
    pub previous_commit_hash: String,
    pub affected_tests: Vec<AffectedTestCase>,
    pub change_summary: ChangeSummary,
    pub code_changes: Vec<CodeChange>,
    pub timestamp: DateTime<Utc>,
}

/// The three possible answers to "did the functionality change?".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum UserDecisionKind {
    FunctionalityChanged,
    RefactorOnly,
    Cancelled,
}

/// A user's decision after reviewing an analysis result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDecision {
    pub kind: UserDecisionKind,
    /// Free-text description of the change. Required when
    /// `kind == FunctionalityChanged`.
    pub description: Option<String>,
    /// Explicit subset of tests to act on. `None` means all affected tests.
    pub selected_tests: Option<Vec<AffectedTestCase>>,
}

impl UserDecision {
    pub fn cancelled() -> Self {
        Self {
            kind: UserDecisionKind::Cancelled,
            description: None,
            selected_tests: None,
        }
    }
}

/// Outcome for one test in a batch remediation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestFixOutcome {
    pub test_file: String,
    pub test_name: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TestFixOutcome {
    pub fn succeeded(test_file: &str, test_name: &str, new_code: String) -> Self {
        Self {
            test_file: test_file.to_string(),
            test_name: test_name.to_string(),
            success: true,
            new_code: Some(new_code),
            error: None,
        }
    }

    pub fn failed(test_file: &str, test_name: &str, error: impl Into<String>) -> Self {
        Self {
            test_file: test_file.to_string(),
            test_name: test_name.to_string(),
            success: false,
            new_code: None,
            error: Some(error.into()),
        }
    }
}

/// Aggregate report for a batch remediation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchFixResult {
    pub outcomes: Vec<TestFixOutcome>,
    pub success_count: usize,
    pub fail_count: usize,
}

impl BatchFixResult {
    /// Tally success and failure counts in a single pass over the outcomes.
    pub fn from_outcomes(outcomes: Vec<TestFixOutcome>) -> Self {
        let mut success_count = 0;
        let mut fail_count = 0;
        for outcome in &outcomes {
            if outcome.success {
                success_count += 1;
            } else {
                fail_count += 1;
            }
        }
        Self {
            outcomes,
            success_count,
            fail_count,
        }
    }

    /// The failed outcomes, for the expandable detail view.
    pub fn failures(&self) -> impl Iterator<Item = &TestFixOutcome> {
        self.outcomes.iter().filter(|o| !o.success)
    }
}
