//! Clap argument types and validation.

use clap::Parser;
use std::path::PathBuf;

use testmend::models::maintenance::UserDecisionKind;

/// Test maintenance assistant for Python projects.
#[derive(Parser, Debug)]
#[command(
    name = "testmend",
    version = testmend::constants::VERSION,
    about = "Keeps Python test suites in step with code changes",
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Analyze the latest commit and remediate affected tests.
    Analyze(Box<AnalyzeArgs>),

    /// Render a unified diff of two files and list changed functions.
    Diff(DiffArgs),

    /// Print version information.
    Version,
}

/// Arguments for the `analyze` subcommand.
#[derive(Parser, Debug)]
pub struct AnalyzeArgs {
    /// Path to the repository or working directory (default: current directory).
    #[arg(long, default_value = ".")]
    pub path: PathBuf,

    // --- Backend ---
    /// Backend base URL.
    #[arg(long, env = "TESTMEND_BACKEND_URL")]
    pub backend_url: Option<String>,

    /// Use the offline mock backend (no network).
    #[arg(long, default_value_t = false)]
    pub mock: bool,

    // --- Decision (non-interactive runs) ---
    /// Answer the functionality question up front instead of prompting.
    #[arg(long, value_enum)]
    pub decision: Option<UserDecisionKind>,

    /// Description of the functional change; required with
    /// `--decision functionality-changed`.
    #[arg(long)]
    pub description: Option<String>,

    // --- Analyzer ---
    /// Structural analyzer command, invoked as `<command> <file> <function>`.
    #[arg(long, env = "TESTMEND_ANALYZER")]
    pub analyzer: Option<String>,

    /// Regenerate complex tests without asking for confirmation.
    #[arg(long, short = 'y', default_value_t = false)]
    pub yes: bool,

    /// Suppress all non-essential output (reports, progress, informational
    /// messages). Only errors are shown.
    #[arg(long, short = 'q', default_value_t = false)]
    pub quiet: bool,
}

impl AnalyzeArgs {
    /// Validate flag combinations clap cannot express.
    pub fn validate(&self) -> Result<(), String> {
        if self.decision == Some(UserDecisionKind::FunctionalityChanged)
            && self.description.as_deref().unwrap_or("").is_empty()
        {
            return Err(
                "--description is required with --decision functionality-changed".to_string(),
            );
        }
        Ok(())
    }
}

/// Arguments for the `diff` subcommand.
#[derive(Parser, Debug)]
pub struct DiffArgs {
    /// Old version of the file.
    pub old: PathBuf,

    /// New version of the file.
    pub new: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(extra: &[&str]) -> AnalyzeArgs {
        let mut argv = vec!["testmend", "analyze"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Command::Analyze(args) => *args,
            other => panic!("expected analyze, got {other:?}"),
        }
    }

    #[test]
    fn defaults() {
        let args = analyze(&[]);
        assert_eq!(args.path, PathBuf::from("."));
        assert!(!args.mock);
        assert!(!args.yes);
        assert!(args.decision.is_none());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn functionality_changed_requires_description() {
        let args = analyze(&["--decision", "functionality-changed"]);
        assert!(args.validate().is_err());

        let args = analyze(&[
            "--decision",
            "functionality-changed",
            "--description",
            "renamed parameter",
        ]);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn refactor_only_needs_no_description() {
        let args = analyze(&["--decision", "refactor-only"]);
        assert!(args.validate().is_ok());
    }
}
