//! Results produced by reconciliation and pruning.

use std::path::PathBuf;

use serde::Serialize;

use crate::error::SyncError;
use crate::types::SyncMode;

/// Why a skill was left alone during a merge or copy pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Entry already matches the source
    UpToDate,
    /// A real directory the engine does not own
    LocalPreserved,
    /// A link to something outside the source
    ForeignLink,
    /// An I/O error on this item; see warnings
    Failed,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UpToDate => "up to date",
            Self::LocalPreserved => "local preserved",
            Self::ForeignLink => "foreign link",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedItem {
    pub name: String,
    pub reason: SkipReason,
}

impl SkippedItem {
    pub fn new(name: &str, reason: SkipReason) -> Self {
        Self {
            name: name.to_string(),
            reason,
        }
    }
}

fn names_with(skipped: &[SkippedItem], reason: SkipReason) -> Vec<&str> {
    skipped
        .iter()
        .filter(|item| item.reason == reason)
        .map(|item| item.name.as_str())
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeResult {
    pub linked: Vec<String>,
    pub updated: Vec<String>,
    pub skipped: Vec<SkippedItem>,
    pub warnings: Vec<String>,
}

impl MergeResult {
    pub fn skipped_with(&self, reason: SkipReason) -> Vec<&str> {
        names_with(&self.skipped, reason)
    }

    pub fn changed(&self) -> bool {
        !self.linked.is_empty() || !self.updated.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CopyResult {
    pub copied: Vec<String>,
    pub updated: Vec<String>,
    pub skipped: Vec<SkippedItem>,
    pub warnings: Vec<String>,
}

impl CopyResult {
    pub fn skipped_with(&self, reason: SkipReason) -> Vec<&str> {
        names_with(&self.skipped, reason)
    }

    pub fn changed(&self) -> bool {
        !self.copied.is_empty() || !self.updated.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PruneResult {
    pub removed: Vec<String>,
    pub warnings: Vec<String>,
}

/// What the symlink strategy did (or would do) with the target path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SymlinkAction {
    AlreadyLinked,
    Created,
    FixedBroken,
    Migrated {
        moved: Vec<String>,
        discarded: Vec<String>,
    },
    ReplacedConflict {
        previous: PathBuf,
    },
}

impl SymlinkAction {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::AlreadyLinked => "already linked",
            Self::Created => "symlink created",
            Self::FixedBroken => "broken link fixed",
            Self::Migrated { .. } => "files migrated and linked",
            Self::ReplacedConflict { .. } => "conflicting link replaced",
        }
    }

    pub fn changed(&self) -> bool {
        !matches!(self, Self::AlreadyLinked)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum SyncOutcome {
    Symlink { action: SymlinkAction },
    Merge(MergeResult),
    Copy(CopyResult),
}

impl SyncOutcome {
    pub fn mode(&self) -> SyncMode {
        match self {
            Self::Symlink { .. } => SyncMode::Symlink,
            Self::Merge(_) => SyncMode::Merge,
            Self::Copy(_) => SyncMode::Copy,
        }
    }

    pub fn changed(&self) -> bool {
        match self {
            Self::Symlink { action } => action.changed(),
            Self::Merge(result) => result.changed(),
            Self::Copy(result) => result.changed(),
        }
    }

    pub fn warnings(&self) -> &[String] {
        match self {
            Self::Symlink { .. } => &[],
            Self::Merge(result) => &result.warnings,
            Self::Copy(result) => &result.warnings,
        }
    }

    pub fn as_merge(&self) -> Option<&MergeResult> {
        match self {
            Self::Merge(result) => Some(result),
            _ => None,
        }
    }

    pub fn as_copy(&self) -> Option<&CopyResult> {
        match self {
            Self::Copy(result) => Some(result),
            _ => None,
        }
    }

    pub fn as_symlink(&self) -> Option<&SymlinkAction> {
        match self {
            Self::Symlink { action } => Some(action),
            _ => None,
        }
    }
}

/// Everything that happened to one target in one run.
#[derive(Debug, Clone, Serialize)]
pub struct TargetSyncReport {
    pub name: String,
    pub path: PathBuf,
    pub dry_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<PathBuf>,
    pub outcome: SyncOutcome,
    pub pruned: PruneResult,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl TargetSyncReport {
    pub fn mode(&self) -> SyncMode {
        self.outcome.mode()
    }

    pub fn changed(&self) -> bool {
        self.outcome.changed() || !self.pruned.removed.is_empty()
    }
}

#[derive(Debug)]
pub struct TargetRun {
    pub name: String,
    pub result: Result<TargetSyncReport, SyncError>,
}

/// Per-target results of a multi-target run, in processing order.
#[derive(Debug, Default)]
pub struct SyncRunReport {
    pub targets: Vec<TargetRun>,
}

impl SyncRunReport {
    pub fn failed(&self) -> impl Iterator<Item = (&str, &SyncError)> {
        self.targets.iter().filter_map(|run| match &run.result {
            Err(err) => Some((run.name.as_str(), err)),
            Ok(_) => None,
        })
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &TargetSyncReport> {
        self.targets.iter().filter_map(|run| run.result.as_ref().ok())
    }

    pub fn is_success(&self) -> bool {
        self.failed().next().is_none()
    }
}
