//! testmend — test maintenance assistant CLI.
//!
//! Entry point and error handling boundary. Uses `anyhow` for
//! ergonomic error propagation and user-facing messages.

mod cli;

use testmend::analyzer;
use testmend::backend;
use testmend::batchfix;
use testmend::config;
use testmend::constants;
use testmend::diff;
use testmend::env;
use testmend::models;
use testmend::output;
use testmend::pipeline;
use testmend::vcs;

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;

use analyzer::ScriptAnalyzer;
use backend::{HttpBackendClient, MaintenanceBackend, MockBackendClient};
use batchfix::BatchFixOrchestrator;
use cli::args::{AnalyzeArgs, Cli, Command, DiffArgs};
use config::Config;
use env::Env;
use output::TerminalPresenter;
use pipeline::{MaintenancePipeline, PipelineOutcome, ResultHolder};
use vcs::git::GitCli;

// Exit codes: 0 clean, 1 batch failures, 2 pipeline or setup errors.
const EXIT_BATCH_FAILURES: i32 = 1;
const EXIT_PIPELINE_ERROR: i32 = 2;

#[tokio::main]
async fn main() {
    let code = match run().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            EXIT_PIPELINE_ERROR
        }
    };
    process::exit(code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    match cli.command {
        Command::Analyze(args) => run_analyze(*args).await,
        Command::Diff(args) => run_diff(args).await,
        Command::Version => run_version(),
    }
}

/// Print version information.
fn run_version() -> Result<i32> {
    use colored::Colorize;

    println!("{} {}", "testmend".bold(), constants::VERSION.green().bold());
    Ok(0)
}

/// Render a unified diff of two files and list the functions it touches.
async fn run_diff(args: DiffArgs) -> Result<i32> {
    let old = tokio::fs::read_to_string(&args.old)
        .await
        .with_context(|| format!("failed to read {}", args.old.display()))?;
    let new = tokio::fs::read_to_string(&args.new)
        .await
        .with_context(|| format!("failed to read {}", args.new.display()))?;

    print!("{}", diff::render(&old, &new));

    let mut functions = diff::extract_function_names(&old);
    for name in diff::extract_function_names(&new) {
        if !functions.contains(&name) {
            functions.push(name);
        }
    }
    if !functions.is_empty() {
        println!();
        println!("functions: {}", functions.join(", "));
    }
    Ok(0)
}

/// Run the full pipeline: analyze the latest commit, capture a decision,
/// and remediate affected tests.
async fn run_analyze(args: AnalyzeArgs) -> Result<i32> {
    if let Err(message) = args.validate() {
        bail!(message);
    }

    let repo_root = vcs::git::find_repo_root(&args.path)
        .await
        .unwrap_or_default();
    let env = Env::real();
    let mut config = Config::load(repo_root.as_deref(), &env).context("failed to load config")?;

    // CLI flags win over every config layer.
    if let Some(url) = &args.backend_url {
        config.backend.url = url.clone();
    }
    if let Some(command) = &args.analyzer {
        config.analyzer.command = command.clone();
    }
    if args.mock {
        config.backend.mock = true;
    }

    let workspace_root: PathBuf = repo_root.clone().unwrap_or_else(|| args.path.clone());

    let backend: Arc<dyn MaintenanceBackend> = if config.backend.mock {
        Arc::new(MockBackendClient::new())
    } else {
        Arc::new(HttpBackendClient::new(&config.backend).context("failed to set up backend")?)
    };
    let git = Arc::new(GitCli::new(&workspace_root));
    let presenter = Arc::new(TerminalPresenter::new(
        args.decision,
        args.description.clone(),
        args.quiet,
    ));
    let holder = Arc::new(ResultHolder::new());

    let pipeline = MaintenancePipeline::new(
        Arc::clone(&backend),
        git,
        Arc::clone(&presenter) as Arc<dyn pipeline::DecisionPresenter>,
        holder,
        config.pipeline.max_recovery_attempts,
    );

    let outcome = match pipeline.run().await {
        Ok(outcome) => outcome,
        Err(err) => {
            eprintln!("Error: {}", err.user_message());
            return Ok(EXIT_PIPELINE_ERROR);
        }
    };

    let (result, decision) = match outcome {
        PipelineOutcome::Decided { result, decision } => (result, decision),
        // Informational exits and cancels are clean.
        _ => return Ok(0),
    };

    let tests: Vec<models::impact::AffectedTestCase> = decision
        .selected_tests
        .clone()
        .unwrap_or_else(|| result.affected_tests.clone());

    let orchestrator = BatchFixOrchestrator::new(
        backend,
        Arc::new(ScriptAnalyzer::new(&config.analyzer.command)),
        &workspace_root,
        args.quiet,
    )
    .with_confirmation(presenter, args.yes);
    let batch = orchestrator
        .run(&decision, &tests, &result)
        .await
        .context("batch remediation failed")?;

    if !args.quiet {
        print!("{}", output::render_batch(&batch));
    }

    Ok(if batch.fail_count > 0 {
        EXIT_BATCH_FAILURES
    } else {
        0
    })
}
