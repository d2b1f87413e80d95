//! Interactive terminal presenter.
//!
//! Renders analysis reports to stdout and collects decisions from
//! stdin. Non-interactive runs (`--decision` / CI) answer from presets
//! and never block on input.

use async_trait::async_trait;
use colored::Colorize;

use crate::models::maintenance::{MaintenanceResult, UserDecision, UserDecisionKind};
use crate::pipeline::{DecisionPresenter, RecoveryAction};

/// Terminal front end for the pipeline.
pub struct TerminalPresenter {
    /// Pre-selected decision; skips the interactive prompt.
    preset: Option<UserDecisionKind>,
    /// Change description for `functionality_changed` decisions.
    description: Option<String>,
    quiet: bool,
}

impl TerminalPresenter {
    pub fn new(
        preset: Option<UserDecisionKind>,
        description: Option<String>,
        quiet: bool,
    ) -> Self {
        Self {
            preset,
            description,
            quiet,
        }
    }

    fn interactive(&self) -> bool {
        self.preset.is_none()
    }

    async fn prompt_decision(&self) -> UserDecision {
        println!("Did the functionality of the changed code change?");
        println!("  [1] Yes, regenerate the affected tests");
        println!("  [2] No, refactor only: improve coverage");
        println!("  [3] Cancel");
        print_prompt("> ");

        let answer = read_line().await;
        match answer.as_deref() {
            Some("1") => {
                print_prompt("Describe the change: ");
                let description = read_line().await.filter(|s| !s.is_empty());
                UserDecision {
                    kind: UserDecisionKind::FunctionalityChanged,
                    description,
                    selected_tests: None,
                }
            }
            Some("2") => UserDecision {
                kind: UserDecisionKind::RefactorOnly,
                description: None,
                selected_tests: None,
            },
            _ => UserDecision::cancelled(),
        }
    }
}

#[async_trait]
impl DecisionPresenter for TerminalPresenter {
    async fn present(&self, result: &MaintenanceResult) -> UserDecision {
        if !self.quiet {
            print!("{}", crate::output::render_analysis(result));
        }

        match self.preset {
            Some(kind) => UserDecision {
                kind,
                description: self.description.clone(),
                selected_tests: None,
            },
            None => self.prompt_decision().await,
        }
    }

    async fn choose_recovery(&self, message: &str) -> RecoveryAction {
        eprintln!(" {} {message}", "✖".red().bold());
        if !self.interactive() {
            return RecoveryAction::Dismiss;
        }

        print_prompt("[r]etry, open [c]onfig, or [d]ismiss? ");
        match read_line().await.as_deref() {
            Some("r") | Some("R") => RecoveryAction::Retry,
            Some("c") | Some("C") => {
                if let Some(config_dir) = dirs::config_dir() {
                    let path = config_dir
                        .join(crate::constants::CONFIG_DIR)
                        .join("config.toml");
                    eprintln!("Edit your configuration at {}", path.display());
                }
                RecoveryAction::OpenConfig
            }
            _ => RecoveryAction::Dismiss,
        }
    }

    async fn confirm(&self, message: &str) -> bool {
        if !self.interactive() {
            return true;
        }
        print_prompt(&format!("{message} [y/N] "));
        matches!(read_line().await.as_deref(), Some("y") | Some("Y"))
    }

    fn info(&self, message: &str) {
        if !self.quiet {
            println!(" {} {message}", "ℹ".blue().bold());
        }
    }
}

fn print_prompt(text: &str) {
    use std::io::Write;
    print!("{text}");
    let _ = std::io::stdout().flush();
}

/// Read one trimmed line from stdin without blocking the runtime.
async fn read_line() -> Option<String> {
    tokio::task::spawn_blocking(|| {
        let mut buffer = String::new();
        std::io::stdin()
            .read_line(&mut buffer)
            .ok()
            .map(|_| buffer.trim().to_string())
    })
    .await
    .ok()
    .flatten()
}
