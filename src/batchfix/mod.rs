//! Batch remediation orchestrator.
//!
//! Turns a user decision plus the affected tests from an analysis run
//! into edited test files. Two modes:
//!
//! * functionality changed: each test is regenerated from fresh
//!   structural context, one backend call per test, failures isolated
//!   per item;
//! * refactor only: one batched coverage-improvement call, applied
//!   test by test.
//!
//! Processing is strictly sequential so file writes never race and the
//! progress display stays coherent.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::analyzer::ContextAnalyzer;
use crate::backend::{BackendError, BatchFixRequest, BatchFixTest, GenerateRequest, MaintenanceBackend};
use crate::models::impact::AffectedTestCase;
use crate::models::maintenance::{
    BatchFixResult, MaintenanceResult, TestFixOutcome, UserDecision, UserDecisionKind,
};
use crate::pipeline::DecisionPresenter;
use crate::progress::{ItemStatus, ProgressTracker};
use crate::prompt;

/// Failures that abort a whole batch run. Per-test failures do not;
/// they are recorded in the [`BatchFixResult`] instead.
#[derive(Error, Debug)]
pub enum BatchFixError {
    #[error("no workspace root available for writing test files")]
    NoWorkspace,

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Applies test fixes for one analysis result.
pub struct BatchFixOrchestrator {
    backend: Arc<dyn MaintenanceBackend>,
    analyzer: Arc<dyn ContextAnalyzer>,
    workspace_root: PathBuf,
    /// Suppresses the live progress display.
    quiet: bool,
    /// When set, regeneration of functions that fail the auto-confirm
    /// gate asks here first.
    presenter: Option<Arc<dyn DecisionPresenter>>,
    /// Skip all per-test confirmation (`--yes`).
    assume_yes: bool,
}

impl BatchFixOrchestrator {
    pub fn new(
        backend: Arc<dyn MaintenanceBackend>,
        analyzer: Arc<dyn ContextAnalyzer>,
        workspace_root: impl Into<PathBuf>,
        quiet: bool,
    ) -> Self {
        Self {
            backend,
            analyzer,
            workspace_root: workspace_root.into(),
            quiet,
            presenter: None,
            assume_yes: true,
        }
    }

    /// Enable per-test confirmation of complex regenerations.
    pub fn with_confirmation(
        mut self,
        presenter: Arc<dyn DecisionPresenter>,
        assume_yes: bool,
    ) -> Self {
        self.presenter = Some(presenter);
        self.assume_yes = assume_yes;
        self
    }

    /// Run remediation for `tests` according to the user's decision.
    ///
    /// A cancelled decision produces an empty result without touching
    /// any file.
    pub async fn run(
        &self,
        decision: &UserDecision,
        tests: &[AffectedTestCase],
        result: &MaintenanceResult,
    ) -> Result<BatchFixResult, BatchFixError> {
        if self.workspace_root.as_os_str().is_empty() {
            return Err(BatchFixError::NoWorkspace);
        }
        if tests.is_empty() || decision.kind == UserDecisionKind::Cancelled {
            return Ok(BatchFixResult::default());
        }

        let names: Vec<String> = tests.iter().map(|t| t.test_name.clone()).collect();
        let action = match decision.kind {
            UserDecisionKind::FunctionalityChanged => "Regenerating",
            UserDecisionKind::RefactorOnly => "Improving coverage for",
            UserDecisionKind::Cancelled => unreachable!(),
        };
        let progress = ProgressTracker::new(&names, action, !self.quiet);
        progress.start();

        let outcome = match decision.kind {
            UserDecisionKind::FunctionalityChanged => {
                self.regenerate_all(decision, tests, result, &progress).await
            }
            UserDecisionKind::RefactorOnly => {
                self.improve_coverage(tests, result, &progress).await
            }
            UserDecisionKind::Cancelled => unreachable!(),
        };
        progress.finish();
        outcome
    }

    /// One test at a time: analyze, prompt, generate, write. A failure
    /// in any step fails that test only.
    async fn regenerate_all(
        &self,
        decision: &UserDecision,
        tests: &[AffectedTestCase],
        result: &MaintenanceResult,
        progress: &ProgressTracker,
    ) -> Result<BatchFixResult, BatchFixError> {
        let mut outcomes = Vec::with_capacity(tests.len());
        for test in tests {
            progress.update(&test.test_name, ItemStatus::InProgress);
            let outcome = self.regenerate_one(decision, test, result).await;
            progress.update(
                &test.test_name,
                match &outcome {
                    o if o.success => ItemStatus::Done,
                    o => ItemStatus::Failed(
                        o.error.clone().unwrap_or_else(|| "failed".to_string()),
                    ),
                },
            );
            outcomes.push(outcome);
        }
        Ok(BatchFixResult::from_outcomes(outcomes))
    }

    async fn regenerate_one(
        &self,
        decision: &UserDecision,
        test: &AffectedTestCase,
        result: &MaintenanceResult,
    ) -> TestFixOutcome {
        let Some(source_file) = resolve_source_file(test, result) else {
            return TestFixOutcome::failed(
                &test.test_file,
                &test.test_name,
                "could not determine source file for this test",
            );
        };
        let function_name = resolve_function_name(test);

        let source_path = self.workspace_root.join(&source_file);
        let context = match self
            .analyzer
            .build_function_context(&source_path, &function_name)
            .await
        {
            Ok(context) => context,
            Err(err) => {
                return TestFixOutcome::failed(&test.test_file, &test.test_name, err.to_string());
            }
        };

        // Short, branch-free functions regenerate without asking.
        if !self.assume_yes && !prompt::should_auto_confirm(&context) {
            if let Some(presenter) = &self.presenter {
                let summary = prompt::complexity_summary(&context);
                let confirmed = presenter
                    .confirm(&format!(
                        "{function_name} ({summary}). Regenerate its test?"
                    ))
                    .await;
                if !confirmed {
                    return TestFixOutcome::failed(
                        &test.test_file,
                        &test.test_name,
                        "skipped by user",
                    );
                }
            }
        }

        let description = decision
            .description
            .clone()
            .unwrap_or_else(|| format!("Regenerate test for {function_name}"));
        let request = GenerateRequest {
            prompt: prompt::build_prompt(&context, &description),
            context,
            description,
        };
        let response = match self.backend.generate_test(&request).await {
            Ok(response) => response,
            Err(err) => {
                return TestFixOutcome::failed(
                    &test.test_file,
                    &test.test_name,
                    err.user_message(),
                );
            }
        };

        match self.write_test(test, &response.test_code) {
            Ok(()) => {
                TestFixOutcome::succeeded(&test.test_file, &test.test_name, response.test_code)
            }
            Err(err) => TestFixOutcome::failed(&test.test_file, &test.test_name, err),
        }
    }

    /// One batched backend call; a backend failure here aborts the run
    /// since no per-test result exists to record.
    async fn improve_coverage(
        &self,
        tests: &[AffectedTestCase],
        result: &MaintenanceResult,
        progress: &ProgressTracker,
    ) -> Result<BatchFixResult, BatchFixError> {
        let mut batch = Vec::with_capacity(tests.len());
        for test in tests {
            batch.push(BatchFixTest {
                test_file: test.test_file.clone(),
                test_name: test.test_name.clone(),
                test_class: test.test_class.clone(),
                function_name: resolve_function_name(test),
                source_file: resolve_source_file(test, result).unwrap_or_default(),
            });
        }

        for test in tests {
            progress.update(&test.test_name, ItemStatus::InProgress);
        }
        let response = self
            .backend
            .fix(&BatchFixRequest::improve_coverage(batch))
            .await?;

        let mut outcomes = Vec::with_capacity(response.results.len());
        for fix in response.results {
            let outcome = match &fix.new_code {
                Some(code) if fix.success => {
                    match self.write_fix(&fix.test_file, &fix.test_name, code) {
                        Ok(()) => fix,
                        Err(err) => TestFixOutcome::failed(&fix.test_file, &fix.test_name, err),
                    }
                }
                _ => fix,
            };
            progress.update(
                &outcome.test_name,
                if outcome.success {
                    ItemStatus::Done
                } else {
                    ItemStatus::Failed(
                        outcome.error.clone().unwrap_or_else(|| "failed".to_string()),
                    )
                },
            );
            outcomes.push(outcome);
        }
        Ok(BatchFixResult::from_outcomes(outcomes))
    }

    fn write_test(&self, test: &AffectedTestCase, new_code: &str) -> Result<(), String> {
        self.write_fix(&test.test_file, &test.test_name, new_code)
    }

    fn write_fix(&self, test_file: &str, test_name: &str, new_code: &str) -> Result<(), String> {
        let path = self.workspace_root.join(test_file);
        let existing = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(err) => return Err(format!("failed to read {}: {err}", path.display())),
        };
        let updated = replace_test_function(&existing, test_name, new_code);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|err| format!("failed to create {}: {err}", parent.display()))?;
        }
        std::fs::write(&path, updated)
            .map_err(|err| format!("failed to write {}: {err}", path.display()))
    }
}

/// Pick the source file a test covers.
///
/// Preference order: the classifier's explicit hint, then a changed file
/// whose stem matches the test file's stem (with `test_` / `_test`
/// affixes stripped), then the first changed file.
fn resolve_source_file(test: &AffectedTestCase, result: &MaintenanceResult) -> Option<String> {
    if let Some(source) = &test.source_file {
        return Some(source.clone());
    }

    let stem = Path::new(&test.test_file)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(test.test_file.as_str());
    let stem = stem.strip_prefix("test_").unwrap_or(stem);
    let stem = stem.strip_suffix("_test").unwrap_or(stem).to_string();

    let matched = result.code_changes.iter().find(|change| {
        Path::new(&change.file_path)
            .file_stem()
            .and_then(|s| s.to_str())
            .is_some_and(|s| s == stem)
    });
    matched
        .or_else(|| result.code_changes.first())
        .map(|change| change.file_path.clone())
}

/// Pick the function a test covers: the classifier's hint, else the test
/// name with its `test_` prefix stripped.
fn resolve_function_name(test: &AffectedTestCase) -> String {
    if let Some(function) = &test.source_function {
        return function.clone();
    }
    test.test_name
        .strip_prefix("test_")
        .unwrap_or(&test.test_name)
        .to_string()
}

/// Replace the `def <test_name>(...)` block in `source` with `new_code`.
///
/// The block runs from the def line to the next `def` or `class` at the
/// same or shallower indentation, so nested helper defs stay inside it.
/// If the function is not present the new code is appended instead.
pub fn replace_test_function(source: &str, test_name: &str, new_code: &str) -> String {
    match find_def_block(source, test_name) {
        Some((start, end)) => {
            let mut updated = String::with_capacity(source.len() + new_code.len());
            updated.push_str(&source[..start]);
            updated.push_str(new_code.trim_end_matches('\n'));
            updated.push('\n');
            updated.push_str(&source[end..]);
            updated
        }
        None => {
            let mut appended = source.to_string();
            if !appended.is_empty() && !appended.ends_with('\n') {
                appended.push('\n');
            }
            if !appended.is_empty() {
                appended.push('\n');
            }
            appended.push_str(new_code.trim_end_matches('\n'));
            appended.push('\n');
            appended
        }
    }
}

/// Byte range of the named def block: from its header line through the
/// last non-blank line before the next same-level `def`/`class`, or end
/// of input.
fn find_def_block(source: &str, test_name: &str) -> Option<(usize, usize)> {
    let mut start = None;
    let mut header_indent = 0;
    let mut end = 0;
    let mut pos = 0;

    for line in source.split_inclusive('\n') {
        let line_start = pos;
        pos += line.len();
        let content = line.trim_end_matches(['\r', '\n']);
        let trimmed = content.trim_start();
        let indent = content.len() - trimmed.len();

        match start {
            None => {
                if is_def_header(trimmed, test_name) {
                    start = Some(line_start);
                    header_indent = indent;
                    end = pos;
                }
            }
            Some(block_start) => {
                if trimmed.is_empty() {
                    continue;
                }
                let starts_sibling = trimmed.starts_with("def ")
                    || trimmed.starts_with("async def ")
                    || trimmed.starts_with("class ");
                if indent <= header_indent && starts_sibling {
                    return Some((block_start, end));
                }
                end = pos;
            }
        }
    }
    start.map(|block_start| (block_start, end))
}

/// True when `line` (already left-trimmed) opens `def <test_name>(...)`.
fn is_def_header(line: &str, test_name: &str) -> bool {
    let Some(rest) = line
        .strip_prefix("async def")
        .or_else(|| line.strip_prefix("def"))
        .filter(|rest| rest.starts_with([' ', '\t']))
    else {
        return false;
    };
    match rest.trim_start().strip_prefix(test_name) {
        Some(rest) => rest.trim_start().starts_with('('),
        None => false,
    }
}
