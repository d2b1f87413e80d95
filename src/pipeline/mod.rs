//! Maintenance pipeline: the state machine driving one analysis run.
//!
//! States run strictly in order: health check (one automatic retry),
//! commit resolution, diff collection, classification, result
//! publication, decision capture. Publication is all-or-nothing; a run
//! either replaces the whole session result or leaves it untouched.
//! Unexpected failures are classified by the backend taxonomy and offered
//! to the user with a bounded retry loop, never unbounded recursion.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;

use crate::backend::{AnalyzeRequest, BackendError, MaintenanceBackend};
use crate::impact;
use crate::models::maintenance::{MaintenanceResult, UserDecision, UserDecisionKind};
use crate::vcs::{Vcs, VcsError};

/// The pipeline's states, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum PipelineState {
    Idle,
    CheckingHealth,
    ResolvingCommits,
    CollectingDiffs,
    Classifying,
    AwaitingDecision,
    Regenerating,
    ImprovingCoverage,
    Cancelled,
}

/// How one pipeline run ended.
#[derive(Debug)]
pub enum PipelineOutcome {
    /// A result was published and the user made a non-cancel decision.
    Decided {
        result: Arc<MaintenanceResult>,
        decision: UserDecision,
    },
    /// A result was published but no test was affected.
    NoTestsAffected(Arc<MaintenanceResult>),
    /// The user cancelled at the decision step.
    Cancelled,
    /// Normal early exits, informational rather than errors.
    NoChanges,
    FirstCommit,
    NotARepository,
}

/// Errors that terminate a pipeline run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Vcs(#[from] VcsError),

    #[error("backend is not responding")]
    Unhealthy,
}

impl PipelineError {
    /// User-facing message for the recovery prompt.
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::Backend(err) => {
                format!("Maintenance analysis failed: {}", err.user_message())
            }
            PipelineError::Vcs(err) => format!("Maintenance analysis failed: {err}"),
            PipelineError::Unhealthy => {
                "Backend is not responding. Please check your connection and backend URL."
                    .into()
            }
        }
    }
}

/// What the user chose at a failure prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Run the whole pipeline again.
    Retry,
    /// Open the configuration; the run stays failed.
    OpenConfig,
    /// Give up on this run.
    Dismiss,
}

/// Presentation collaborator: renders results and captures decisions.
///
/// Implemented by the terminal front end in production and by scripted
/// fakes in tests. `present` blocks until the user answers.
#[async_trait]
pub trait DecisionPresenter: Send + Sync {
    /// Show a published result and capture the user's decision.
    async fn present(&self, result: &MaintenanceResult) -> UserDecision;

    /// Offer the uniform recovery choice for a terminal failure.
    async fn choose_recovery(&self, message: &str) -> RecoveryAction;

    /// Yes/no confirmation, used before regenerating complex tests.
    async fn confirm(&self, message: &str) -> bool;

    /// Informational message (normal early exits, summaries).
    fn info(&self, message: &str);
}

/// Session-scoped owner of the current analysis result.
///
/// The published value is immutable; a new run replaces it wholesale.
#[derive(Default)]
pub struct ResultHolder {
    inner: Mutex<Option<Arc<MaintenanceResult>>>,
}

impl ResultHolder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the published result with a new one.
    pub fn publish(&self, result: MaintenanceResult) -> Arc<MaintenanceResult> {
        let result = Arc::new(result);
        *self.inner.lock().expect("result lock poisoned") = Some(Arc::clone(&result));
        result
    }

    /// The currently published result, if any.
    pub fn current(&self) -> Option<Arc<MaintenanceResult>> {
        self.inner.lock().expect("result lock poisoned").clone()
    }

    /// Drop the published result (no-op runs clear stale state).
    pub fn clear(&self) {
        *self.inner.lock().expect("result lock poisoned") = None;
    }
}

/// Drives one maintenance analysis run end to end.
pub struct MaintenancePipeline {
    backend: Arc<dyn MaintenanceBackend>,
    vcs: Arc<dyn Vcs>,
    presenter: Arc<dyn DecisionPresenter>,
    holder: Arc<ResultHolder>,
    /// Attempt budget for the user-prompted recovery loop,
    /// including the first attempt.
    max_recovery_attempts: u32,
}

impl MaintenancePipeline {
    pub fn new(
        backend: Arc<dyn MaintenanceBackend>,
        vcs: Arc<dyn Vcs>,
        presenter: Arc<dyn DecisionPresenter>,
        holder: Arc<ResultHolder>,
        max_recovery_attempts: u32,
    ) -> Self {
        Self {
            backend,
            vcs,
            presenter,
            holder,
            max_recovery_attempts: max_recovery_attempts.max(1),
        }
    }

    /// Run the pipeline, offering the user a bounded number of retries
    /// on terminal failures.
    pub async fn run(&self) -> Result<PipelineOutcome, PipelineError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.run_once().await {
                Ok(outcome) => return Ok(outcome),
                Err(err) => {
                    let action = self.presenter.choose_recovery(&err.user_message()).await;
                    match action {
                        RecoveryAction::Retry if attempt < self.max_recovery_attempts => continue,
                        _ => return Err(err),
                    }
                }
            }
        }
    }

    /// One pass through the state machine.
    async fn run_once(&self) -> Result<PipelineOutcome, PipelineError> {
        // CheckingHealth: one automatic retry before escalating.
        if !self.check_health().await? {
            return Err(PipelineError::Unhealthy);
        }

        // ResolvingCommits
        let Some(current) = self.vcs.current_commit().await? else {
            self.presenter
                .info("Not a git repository or no commits found");
            return Ok(PipelineOutcome::NotARepository);
        };
        let Some(previous) = self.vcs.previous_commit().await? else {
            self.presenter
                .info("This appears to be the first commit. No previous commit to compare.");
            return Ok(PipelineOutcome::FirstCommit);
        };

        // CollectingDiffs
        let changes = self.vcs.diff_between(&previous, &current).await?;
        if changes.is_empty() {
            self.holder.clear();
            self.presenter.info("No code changes detected");
            return Ok(PipelineOutcome::NoChanges);
        }
        let changes: Vec<_> = changes.into_values().collect();

        // Classifying: local summary plus backend analysis; the backend's
        // functions-changed list wins unless it is empty.
        let local_summary = impact::summarize(&changes);
        let response = self
            .backend
            .analyze(&AnalyzeRequest {
                commit_hash: current.clone(),
                previous_commit_hash: previous.clone(),
                changes: changes.clone(),
            })
            .await?;

        let mut change_summary = local_summary;
        if !response.change_summary.functions_changed.is_empty() {
            change_summary.functions_changed = response.change_summary.functions_changed;
        }

        // Publication is all-or-nothing: nothing was published until here.
        let result = self.holder.publish(MaintenanceResult {
            context_id: response.context_id,
            commit_hash: current,
            previous_commit_hash: previous,
            affected_tests: response.affected_tests,
            change_summary,
            code_changes: changes,
            timestamp: Utc::now(),
        });

        // AwaitingDecision
        if result.affected_tests.is_empty() {
            self.presenter
                .info("Maintenance analysis complete: 0 test(s) affected");
            return Ok(PipelineOutcome::NoTestsAffected(result));
        }

        let decision = self.presenter.present(&result).await;
        if decision.kind == UserDecisionKind::Cancelled {
            self.presenter.info("Maintenance analysis cancelled");
            return Ok(PipelineOutcome::Cancelled);
        }

        Ok(PipelineOutcome::Decided { result, decision })
    }

    /// Health probe with exactly one automatic retry.
    async fn check_health(&self) -> Result<bool, PipelineError> {
        match self.backend.health().await {
            Ok(true) => Ok(true),
            Ok(false) | Err(_) => match self.backend.health().await {
                Ok(healthy) => Ok(healthy),
                Err(err) => Err(err.into()),
            },
        }
    }
}
