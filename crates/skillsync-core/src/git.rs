//! Git state of the source tree, for diagnostics.

use std::path::Path;

use anyhow::Context;
use git2::{ErrorCode, Repository, Status, StatusOptions};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SourceGitState {
    NotRepository,
    Dirty { changes: usize },
    Clean { has_remote: bool },
}

/// Inspect the repository rooted at `source`. Local only; no fetch.
pub fn source_git_state(source: &Path) -> anyhow::Result<SourceGitState> {
    let repo = match Repository::open(source) {
        Ok(repo) => repo,
        Err(err) if err.code() == ErrorCode::NotFound => return Ok(SourceGitState::NotRepository),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("Failed to open repository: {}", source.display()));
        }
    };

    let mut opts = StatusOptions::new();
    opts.include_untracked(true).recurse_untracked_dirs(false);
    let statuses = repo
        .statuses(Some(&mut opts))
        .with_context(|| format!("Failed to read git status: {}", source.display()))?;
    let changes = statuses
        .iter()
        .filter(|entry| {
            let status = entry.status();
            status != Status::CURRENT && !status.contains(Status::IGNORED)
        })
        .count();
    if changes > 0 {
        return Ok(SourceGitState::Dirty { changes });
    }

    let has_remote = !repo.remotes().context("Failed to list remotes")?.is_empty();
    Ok(SourceGitState::Clean { has_remote })
}
