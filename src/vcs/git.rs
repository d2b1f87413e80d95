//! Git CLI implementation of the [`Vcs`] trait.
//!
//! Shells out to `git` via `tokio::process::Command`. Only Python sources
//! are considered for change analysis; everything else is skipped during
//! diff collection.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use indexmap::IndexMap;

use super::{Vcs, VcsError};
use crate::diff;
use crate::models::change::CodeChange;

/// Git CLI wrapper rooted at one repository.
pub struct GitCli {
    repo_root: PathBuf,
}

impl GitCli {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
        }
    }

    async fn git(&self, args: &[&str]) -> Result<Option<String>, VcsError> {
        let output = tokio::process::Command::new("git")
            .args(args)
            .current_dir(&self.repo_root)
            .output()
            .await
            .map_err(|e| VcsError::Git(format!("failed to run git: {e}")))?;

        if !output.status.success() {
            return Ok(None);
        }

        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| VcsError::Encoding(e.to_string()))?;
        Ok(Some(stdout))
    }

    /// `git rev-parse <rev>`, trimmed; `None` when the rev does not resolve.
    async fn rev_parse(&self, rev: &str) -> Result<Option<String>, VcsError> {
        Ok(self
            .git(&["rev-parse", rev])
            .await?
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()))
    }

    /// File content at a commit; `None` when the path is absent there.
    async fn show(&self, commit: &str, path: &str) -> Result<Option<String>, VcsError> {
        self.git(&["show", &format!("{commit}:{path}")]).await
    }
}

/// Function names whose `def` line appears among the added or removed
/// lines of the line-aligned rendering.
fn changed_function_names(old_content: &str, new_content: &str) -> Vec<String> {
    let rendered = diff::render(old_content, new_content);
    let changed_lines: String = rendered
        .lines()
        .filter(|l| l.starts_with('+') || l.starts_with('-'))
        .map(|l| &l[1..])
        .collect::<Vec<_>>()
        .join("\n");

    let mut names = diff::extract_function_names(&changed_lines);
    names.dedup();
    names
}

#[async_trait]
impl Vcs for GitCli {
    async fn current_commit(&self) -> Result<Option<String>, VcsError> {
        self.rev_parse("HEAD").await
    }

    async fn previous_commit(&self) -> Result<Option<String>, VcsError> {
        self.rev_parse("HEAD~1").await
    }

    async fn diff_between(
        &self,
        old_commit: &str,
        new_commit: &str,
    ) -> Result<IndexMap<String, CodeChange>, VcsError> {
        let listing = self
            .git(&["diff", "--name-only", old_commit, new_commit])
            .await?
            .ok_or_else(|| {
                VcsError::Git(format!("git diff failed for {old_commit}..{new_commit}"))
            })?;

        let mut changes = IndexMap::new();
        for path in listing.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if !path.ends_with(".py") {
                continue;
            }

            let old_content = self.show(old_commit, path).await?.unwrap_or_default();
            let new_content = self.show(new_commit, path).await?.unwrap_or_default();

            // Line-aligned counts; a changed line counts on both sides.
            let rendered = diff::render(&old_content, &new_content);
            let lines_added = rendered.lines().filter(|l| l.starts_with('+') && !l.starts_with("+++")).count() as u32;
            let lines_removed = rendered.lines().filter(|l| l.starts_with('-') && !l.starts_with("---")).count() as u32;

            changes.insert(
                path.to_string(),
                CodeChange {
                    file_path: path.to_string(),
                    changed_functions: changed_function_names(&old_content, &new_content),
                    old_content,
                    new_content,
                    lines_added,
                    lines_removed,
                },
            );
        }
        Ok(changes)
    }

    async fn file_diff(
        &self,
        path: &str,
        old_commit: &str,
        new_commit: &str,
    ) -> Result<Option<String>, VcsError> {
        let old_content = self.show(old_commit, path).await?;
        let new_content = self.show(new_commit, path).await?;

        match (old_content, new_content) {
            (None, None) => Ok(None),
            (old, new) => {
                let old = old.unwrap_or_default();
                let new = new.unwrap_or_default();
                if old == new {
                    Ok(None)
                } else {
                    Ok(Some(diff::render(&old, &new)))
                }
            }
        }
    }
}

/// Find the repository root containing `start_dir`, or `None` when the
/// directory is not inside a git repository.
pub async fn find_repo_root(start_dir: &Path) -> Result<Option<PathBuf>, VcsError> {
    let output = tokio::process::Command::new("git")
        .args(["rev-parse", "--show-toplevel"])
        .current_dir(start_dir)
        .output()
        .await
        .map_err(|e| VcsError::Git(format!("failed to run git: {e}")))?;

    if !output.status.success() {
        return Ok(None);
    }

    let root = String::from_utf8(output.stdout)
        .map_err(|e| VcsError::Encoding(e.to_string()))?
        .trim()
        .to_string();
    Ok(Some(PathBuf::from(root)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn changed_functions_only_from_touched_lines() {
        let old = "def add(a, b):\n    return a + b\n\ndef untouched():\n    pass\n";
        let new = "def add(a, b):\n    return a + b + 1\n\ndef untouched():\n    pass\n";
        assert_eq!(changed_function_names(old, new), Vec::<String>::new());

        let new_sig = "def add(a, b, c):\n    return a + b\n\ndef untouched():\n    pass\n";
        assert_eq!(changed_function_names(old, new_sig), vec!["add"]);
    }

    #[tokio::test]
    async fn current_commit_outside_repo_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let git = GitCli::new(dir.path());
        let commit = git.current_commit().await.unwrap();
        assert!(commit.is_none());
    }

    #[tokio::test]
    async fn find_repo_root_outside_repo_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let root = find_repo_root(dir.path()).await.unwrap();
        assert!(root.is_none());
    }
}
