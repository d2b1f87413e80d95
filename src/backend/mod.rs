//! Reasoning backend boundary.
//!
//! The remote backend supplies semantic analysis and generated test code.
//! This module defines the wire types, the closed error taxonomy, and the
//! [`MaintenanceBackend`] trait; `http` implements it over reqwest and
//! `mock` provides an offline stand-in for tests and `--mock` runs.

pub mod http;
pub mod mock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::change::{ChangeSummary, CodeChange};
use crate::models::context::FunctionContext;
use crate::models::impact::AffectedTestCase;
use crate::models::maintenance::TestFixOutcome;

pub use http::HttpBackendClient;
pub use mock::MockBackendClient;

/// Closed taxonomy of backend failures.
///
/// Produced at exactly one conversion boundary (the HTTP client edge);
/// every call site matches this enumeration instead of probing error
/// shapes.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Cannot reach the backend at all.
    #[error("cannot connect to backend: {0}")]
    Network(String),

    /// The backend exceeded its deadline.
    #[error("backend request timed out: {0}")]
    Timeout(String),

    /// Malformed request, e.g. missing repository state.
    #[error("invalid request: {0}")]
    Validation(String),

    /// The backend returned a 5xx-equivalent.
    #[error("backend server error: {0}")]
    Server(String),

    /// Any other non-2xx response.
    #[error("backend returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Unclassified failure.
    #[error("backend error: {0}")]
    Unknown(String),
}

impl BackendError {
    /// Transient failures worth retrying with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BackendError::Network(_) | BackendError::Timeout(_) | BackendError::Server(_)
        )
    }

    /// Short, user-facing description with a suggested next step.
    pub fn user_message(&self) -> String {
        match self {
            BackendError::Network(_) => {
                "Cannot connect to backend. Please check your network connection and backend URL."
                    .into()
            }
            BackendError::Timeout(_) => {
                "Request timed out. The backend may be slow or unavailable.".into()
            }
            BackendError::Validation(_) => {
                "Invalid request. Please check your Git repository and try again.".into()
            }
            BackendError::Server(_) => {
                "Backend server error. Please try again later.".into()
            }
            BackendError::Http { status, .. } => {
                format!("Backend returned an unexpected HTTP {status} response.")
            }
            BackendError::Unknown(message) => message.clone(),
        }
    }
}

/// Analysis request: one commit range and its per-file changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub commit_hash: String,
    pub previous_commit_hash: String,
    pub changes: Vec<CodeChange>,
}

/// Analysis response from the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub context_id: String,
    pub affected_tests: Vec<AffectedTestCase>,
    pub change_summary: ChangeSummary,
}

/// One test in a batched fix request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchFixTest {
    pub test_file: String,
    pub test_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_class: Option<String>,
    pub function_name: String,
    pub source_file: String,
}

/// Batched coverage-improvement request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchFixRequest {
    /// Fixed action discriminator understood by the backend.
    pub action: String,
    pub tests: Vec<BatchFixTest>,
}

impl BatchFixRequest {
    pub fn improve_coverage(tests: Vec<BatchFixTest>) -> Self {
        Self {
            action: "improve_coverage".into(),
            tests,
        }
    }
}

/// Batched fix response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchFixResponse {
    pub success: bool,
    pub processed_count: usize,
    pub results: Vec<TestFixOutcome>,
}

/// Request to regenerate one test from structural context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub context: FunctionContext,
    pub description: String,
    /// Pre-formatted prompt block built from the context.
    pub prompt: String,
}

/// Regeneration response: the new test source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub test_code: String,
}

/// The remote reasoning backend.
#[async_trait]
pub trait MaintenanceBackend: Send + Sync {
    /// Health probe; `Ok(false)` means reachable but not ready.
    async fn health(&self) -> Result<bool, BackendError>;

    /// Classify affected tests for a commit range.
    async fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalyzeResponse, BackendError>;

    /// Generate a replacement test for one function.
    async fn generate_test(
        &self,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse, BackendError>;

    /// Produce coverage-improving patches for a batch of tests.
    async fn fix(&self, request: &BatchFixRequest) -> Result<BatchFixResponse, BackendError>;
}
