//! Version-control collaborator: commit resolution and per-file changes.
//!
//! The pipeline only needs four operations from the VCS, expressed as the
//! [`Vcs`] trait so tests can substitute a scripted implementation. The
//! production implementation shells out to the `git` CLI.

pub mod git;

use async_trait::async_trait;
use indexmap::IndexMap;
use thiserror::Error;

use crate::models::change::CodeChange;

pub use git::GitCli;

/// Errors from the version-control subsystem.
#[derive(Error, Debug)]
pub enum VcsError {
    #[error("git command failed: {0}")]
    Git(String),

    #[error("git output is not valid UTF-8: {0}")]
    Encoding(String),
}

/// The operations the maintenance pipeline needs from version control.
#[async_trait]
pub trait Vcs: Send + Sync {
    /// The commit currently checked out, or `None` when the directory is
    /// not a git repository or has no commits.
    async fn current_commit(&self) -> Result<Option<String>, VcsError>;

    /// The parent of the current commit, or `None` for a first commit.
    async fn previous_commit(&self) -> Result<Option<String>, VcsError>;

    /// Per-file changes between two commits, keyed by file path in
    /// diff order.
    async fn diff_between(
        &self,
        old_commit: &str,
        new_commit: &str,
    ) -> Result<IndexMap<String, CodeChange>, VcsError>;

    /// Rendered diff for one file between two commits, or `None` when the
    /// file is unchanged or absent on both sides.
    async fn file_diff(
        &self,
        path: &str,
        old_commit: &str,
        new_commit: &str,
    ) -> Result<Option<String>, VcsError>;
}
