//! Structural analyzer boundary.
//!
//! The core never parses source code itself. Structural facts come from an
//! external analyzer behind the [`ContextAnalyzer`] trait; the shipped
//! implementation runs a configured analyzer command and reads a
//! [`FunctionContext`] as JSON from its stdout.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

use crate::models::context::FunctionContext;

/// Local analyzer failure. Deliberately a plain message rather than the
/// backend error taxonomy: analyzer failures are not backend-originated
/// and are recovered per item, not surfaced with retry choices.
///
/// The message contains "not found" when the requested function is absent
/// from the file; file read and parse failures carry distinct messages.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct AnalyzerError(pub String);

/// Supplies the structural context for one function.
#[async_trait]
pub trait ContextAnalyzer: Send + Sync {
    async fn build_function_context(
        &self,
        file_path: &Path,
        function_name: &str,
    ) -> Result<FunctionContext, AnalyzerError>;
}

/// Runs an external analyzer command: `<command> <file> <function>`,
/// expecting a JSON [`FunctionContext`] on stdout.
pub struct ScriptAnalyzer {
    command: PathBuf,
}

impl ScriptAnalyzer {
    pub fn new(command: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

#[async_trait]
impl ContextAnalyzer for ScriptAnalyzer {
    async fn build_function_context(
        &self,
        file_path: &Path,
        function_name: &str,
    ) -> Result<FunctionContext, AnalyzerError> {
        let output = tokio::process::Command::new(&self.command)
            .arg(file_path)
            .arg(function_name)
            .output()
            .await
            .map_err(|e| {
                AnalyzerError(format!(
                    "failed to run analyzer '{}': {e}",
                    self.command.display()
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            // The analyzer reports a missing function on stderr; pass its
            // wording through so callers can distinguish "not found".
            return Err(AnalyzerError(format!(
                "analyzer failed for '{function_name}': {}",
                stderr.trim()
            )));
        }

        serde_json::from_slice(&output.stdout).map_err(|e| {
            AnalyzerError(format!(
                "analyzer produced invalid context JSON for '{function_name}': {e}"
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_command_reports_run_failure() {
        let analyzer = ScriptAnalyzer::new("/nonexistent/analyzer");
        let err = analyzer
            .build_function_context(Path::new("src/calc.py"), "add")
            .await
            .unwrap_err();
        assert!(err.0.contains("failed to run analyzer"));
    }
}
