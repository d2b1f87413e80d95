//! Batch remediation integration tests with scripted collaborators.
//!
//! Exercises failure isolation: a batch of N tests where K fail must
//! produce exactly N outcomes with K failures, and every successful
//! test's file must still be written.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use pretty_assertions::assert_eq;

use testmend::analyzer::{AnalyzerError, ContextAnalyzer};
use testmend::backend::{
    AnalyzeRequest, AnalyzeResponse, BackendError, BatchFixRequest, BatchFixResponse,
    GenerateRequest, GenerateResponse, MaintenanceBackend,
};
use testmend::batchfix::BatchFixOrchestrator;
use testmend::models::change::{ChangeSummary, ChangeType, CodeChange};
use testmend::models::context::{
    DocumentationInfo, FunctionBodyAnalysis, FunctionContext, FunctionSignature,
};
use testmend::models::impact::{AffectedTestCase, ImpactLevel};
use testmend::models::maintenance::{MaintenanceResult, UserDecision, UserDecisionKind};

/// Backend whose generate call fails for a fixed set of function names.
struct PartialBackend {
    failing_functions: Vec<String>,
}

#[async_trait]
impl MaintenanceBackend for PartialBackend {
    async fn health(&self) -> Result<bool, BackendError> {
        Ok(true)
    }

    async fn analyze(&self, _request: &AnalyzeRequest) -> Result<AnalyzeResponse, BackendError> {
        unimplemented!("not exercised by batch tests")
    }

    async fn generate_test(
        &self,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse, BackendError> {
        let name = &request.context.signature.name;
        if self.failing_functions.iter().any(|f| f == name) {
            return Err(BackendError::Server(format!("generation failed for {name}")));
        }
        Ok(GenerateResponse {
            test_code: format!("def test_{name}():\n    assert {name} is not None\n"),
        })
    }

    async fn fix(&self, _request: &BatchFixRequest) -> Result<BatchFixResponse, BackendError> {
        unimplemented!("not exercised by batch tests")
    }
}

struct PassthroughAnalyzer;

#[async_trait]
impl ContextAnalyzer for PassthroughAnalyzer {
    async fn build_function_context(
        &self,
        file_path: &Path,
        function_name: &str,
    ) -> Result<FunctionContext, AnalyzerError> {
        Ok(FunctionContext {
            signature: FunctionSignature {
                name: function_name.to_string(),
                parameters: vec![],
                return_type: None,
                decorators: vec![],
                is_async: false,
                is_method: false,
            },
            source_code: format!("def {function_name}():\n    pass\n"),
            body_analysis: FunctionBodyAnalysis::trivial(),
            class_context: None,
            imports: vec![],
            documentation: DocumentationInfo {
                docstring: None,
                inline_comments: vec![],
            },
            file_path: file_path.display().to_string(),
            module_path: function_name.to_string(),
            line_range: (1, 2),
        })
    }
}

fn affected_for(function: &str) -> AffectedTestCase {
    AffectedTestCase {
        test_file: format!("tests/test_{function}.py"),
        test_name: format!("test_{function}"),
        test_class: None,
        impact_level: ImpactLevel::Medium,
        reason: format!("Function '{function}' was modified"),
        requires_update: true,
        line_number: None,
        source_file: Some(format!("src/{function}.py")),
        source_function: Some(function.to_string()),
    }
}

fn result_for(functions: &[&str]) -> MaintenanceResult {
    MaintenanceResult {
        context_id: "ctx-batch".into(),
        commit_hash: "new".into(),
        previous_commit_hash: "old".into(),
        affected_tests: vec![],
        change_summary: ChangeSummary {
            files_changed: functions.len(),
            functions_changed: functions.iter().map(|f| f.to_string()).collect(),
            lines_added: 10,
            lines_removed: 2,
            change_type: ChangeType::FeatureAddition,
        },
        code_changes: functions
            .iter()
            .map(|f| CodeChange {
                file_path: format!("src/{f}.py"),
                old_content: String::new(),
                new_content: String::new(),
                lines_added: 10,
                lines_removed: 2,
                changed_functions: vec![f.to_string()],
            })
            .collect(),
        timestamp: chrono::Utc::now(),
    }
}

#[tokio::test]
async fn k_failures_out_of_n_yield_n_outcomes() {
    let dir = tempfile::tempdir().unwrap();
    let functions = ["alpha", "beta", "gamma", "delta", "epsilon"];
    let failing = vec!["beta".to_string(), "delta".to_string()];

    let orchestrator = BatchFixOrchestrator::new(
        Arc::new(PartialBackend {
            failing_functions: failing.clone(),
        }),
        Arc::new(PassthroughAnalyzer),
        dir.path(),
        true,
    );

    let decision = UserDecision {
        kind: UserDecisionKind::FunctionalityChanged,
        description: Some("reworked validation".into()),
        selected_tests: None,
    };
    let tests: Vec<_> = functions.iter().map(|f| affected_for(f)).collect();
    let result = result_for(&functions);

    let batch = orchestrator.run(&decision, &tests, &result).await.unwrap();

    assert_eq!(batch.outcomes.len(), functions.len());
    assert_eq!(batch.fail_count, failing.len());
    assert_eq!(batch.success_count, functions.len() - failing.len());

    // Outcomes keep input order.
    let names: Vec<_> = batch.outcomes.iter().map(|o| o.test_name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "test_alpha",
            "test_beta",
            "test_gamma",
            "test_delta",
            "test_epsilon"
        ]
    );

    // Successful tests were written; failed ones were not.
    assert!(dir.path().join("tests/test_alpha.py").exists());
    assert!(dir.path().join("tests/test_gamma.py").exists());
    assert!(!dir.path().join("tests/test_beta.py").exists());

    for failure in batch.failures() {
        let error = failure.error.as_deref().unwrap_or("");
        assert!(error.contains("try again later"), "got: {error}");
    }
}

#[tokio::test]
async fn all_failures_still_complete_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    let functions = ["alpha", "beta"];

    let orchestrator = BatchFixOrchestrator::new(
        Arc::new(PartialBackend {
            failing_functions: functions.iter().map(|f| f.to_string()).collect(),
        }),
        Arc::new(PassthroughAnalyzer),
        dir.path(),
        true,
    );

    let decision = UserDecision {
        kind: UserDecisionKind::FunctionalityChanged,
        description: None,
        selected_tests: None,
    };
    let tests: Vec<_> = functions.iter().map(|f| affected_for(f)).collect();

    let batch = orchestrator
        .run(&decision, &tests, &result_for(&functions))
        .await
        .unwrap();

    assert_eq!(batch.success_count, 0);
    assert_eq!(batch.fail_count, 2);
}

#[tokio::test]
async fn empty_selection_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = BatchFixOrchestrator::new(
        Arc::new(PartialBackend {
            failing_functions: vec![],
        }),
        Arc::new(PassthroughAnalyzer),
        dir.path(),
        true,
    );

    let decision = UserDecision {
        kind: UserDecisionKind::FunctionalityChanged,
        description: None,
        selected_tests: None,
    };
    let batch = orchestrator
        .run(&decision, &[], &result_for(&[]))
        .await
        .unwrap();
    assert!(batch.outcomes.is_empty());
}
