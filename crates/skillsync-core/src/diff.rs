//! Read-only preview of what a sync would change on a target.
//!
//! Built from the same inspection, manifest fingerprints and drift figures
//! that `status` uses; nothing here writes to disk.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::diagnostics::{DriftReport, drift_from};
use crate::error::Result;
use crate::fs::{hash_tree, is_within, same_path};
use crate::skills::Skill;
use crate::sync::prune::entry_names;
use crate::sync::{EntryKind, Manifest, inspect_target, read_entry};
use crate::types::{SyncMode, Target, TargetStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffAction {
    /// Selected skill missing from the target
    Add,
    /// Owned entry that sync refreshes
    Update,
    /// Entry sync only replaces with `--force`
    Replace,
    /// Owned entry that is no longer selected
    Prune,
    /// Entry the engine does not own and will not touch
    LocalOnly,
}

impl DiffAction {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Update => "~",
            Self::Replace => "!",
            Self::Prune => "-",
            Self::LocalOnly => "?",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffItem {
    pub action: DiffAction,
    pub name: String,
    pub reason: String,
}

impl DiffItem {
    fn new(action: DiffAction, name: &str, reason: impl Into<String>) -> Self {
        Self {
            action,
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetDiff {
    pub target: String,
    pub mode: SyncMode,
    pub status: TargetStatus,
    /// Selected skills already in step
    pub in_sync: usize,
    pub items: Vec<DiffItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drift: Option<DriftReport>,
}

impl TargetDiff {
    /// Nothing for sync to do and nothing local to point out.
    pub fn is_clean(&self) -> bool {
        let settled = match self.mode {
            SyncMode::Symlink => self.status == TargetStatus::Linked,
            SyncMode::Merge | SyncMode::Copy => !is_link_status(self.status),
        };
        settled && self.items.is_empty()
    }

    /// Items a plain `sync` would act on.
    pub fn pending(&self) -> usize {
        self.items
            .iter()
            .filter(|i| matches!(i.action, DiffAction::Add | DiffAction::Update | DiffAction::Prune))
            .count()
    }

    pub fn with_action(&self, action: DiffAction) -> Vec<&str> {
        self.items
            .iter()
            .filter(|i| i.action == action)
            .map(|i| i.name.as_str())
            .collect()
    }
}

fn is_link_status(status: TargetStatus) -> bool {
    matches!(
        status,
        TargetStatus::Linked | TargetStatus::Broken | TargetStatus::Conflict
    )
}

/// Compare `target` with the skills it selects.
///
/// Symlink targets and merge/copy targets that are still a whole-directory
/// link report only their status; the item list covers per-entry modes.
pub fn diff_target(target: &Target, source: &Path, skills: &[&Skill]) -> Result<TargetDiff> {
    let inspection = inspect_target(&target.path, source, target.mode)?;
    let mut diff = TargetDiff {
        target: target.name.clone(),
        mode: target.mode,
        status: inspection.status,
        in_sync: 0,
        items: Vec::new(),
        drift: drift_from(target, skills.len(), &inspection),
    };

    if target.mode == SyncMode::Symlink || is_link_status(inspection.status) {
        return Ok(diff);
    }
    if inspection.status == TargetStatus::NotExist {
        diff.items = skills
            .iter()
            .map(|s| DiffItem::new(DiffAction::Add, &s.flat_name, "missing"))
            .collect();
        return Ok(diff);
    }

    let manifest = Manifest::load(&target.path)?;
    let wanted: HashSet<&str> = skills.iter().map(|s| s.flat_name.as_str()).collect();

    for skill in skills {
        let entry = target.path.join(&skill.flat_name);
        let existing = read_entry(&entry)?;
        let item = match target.mode {
            SyncMode::Merge => merge_item(skill, existing, &manifest),
            SyncMode::Copy => copy_item(skill, existing, source, &manifest)?,
            SyncMode::Symlink => None,
        };
        match item {
            Some(item) => diff.items.push(item),
            None => diff.in_sync += 1,
        }
    }

    for name in entry_names(&target.path)? {
        if wanted.contains(name.as_str()) {
            continue;
        }
        let path = target.path.join(&name);
        if let Some(item) = unwanted_item(target.mode, &path, &name, source, &manifest)? {
            diff.items.push(item);
        }
    }

    // Manifest entries whose directory is already gone still get dropped.
    if target.mode == SyncMode::Copy {
        for name in manifest.managed.keys() {
            if !wanted.contains(name.as_str())
                && fs::symlink_metadata(target.path.join(name)).is_err()
            {
                diff.items.push(DiffItem::new(DiffAction::Prune, name, "stale manifest entry"));
            }
        }
    }

    diff.items.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(diff)
}

fn merge_item(skill: &Skill, existing: Option<EntryKind>, leftover: &Manifest) -> Option<DiffItem> {
    let name = skill.flat_name.as_str();
    match existing {
        None => Some(DiffItem::new(DiffAction::Add, name, "missing")),
        Some(EntryKind::Link { dangling: true, .. }) => {
            Some(DiffItem::new(DiffAction::Update, name, "broken link"))
        }
        Some(EntryKind::Link { dest, .. }) => {
            if same_path(&dest, &skill.source_path) {
                None
            } else {
                Some(DiffItem::new(
                    DiffAction::Replace,
                    name,
                    format!("links to {} (sync --force to replace)", dest.display()),
                ))
            }
        }
        Some(EntryKind::Local) if leftover.is_managed(name) => {
            Some(DiffItem::new(DiffAction::Update, name, "copy left by copy mode"))
        }
        Some(EntryKind::Local) => Some(DiffItem::new(
            DiffAction::Replace,
            name,
            "local copy (sync --force to replace)",
        )),
    }
}

fn copy_item(
    skill: &Skill,
    existing: Option<EntryKind>,
    source: &Path,
    manifest: &Manifest,
) -> Result<Option<DiffItem>> {
    let name = skill.flat_name.as_str();
    let item = match existing {
        None => Some(DiffItem::new(DiffAction::Add, name, "missing")),
        Some(EntryKind::Link { dest, dangling }) => {
            if dangling || is_within(&dest, source) {
                Some(DiffItem::new(DiffAction::Update, name, "link, will be copied"))
            } else {
                Some(DiffItem::new(
                    DiffAction::Replace,
                    name,
                    format!("links to {} (sync --force to replace)", dest.display()),
                ))
            }
        }
        Some(EntryKind::Local) => match manifest.fingerprint(name) {
            Some(recorded) => {
                let current = hash_tree(&skill.source_path)?;
                (recorded != current)
                    .then(|| DiffItem::new(DiffAction::Update, name, "source changed"))
            }
            None => Some(DiffItem::new(
                DiffAction::Replace,
                name,
                "local copy (sync --force to replace)",
            )),
        },
    };
    Ok(item)
}

fn unwanted_item(
    mode: SyncMode,
    path: &Path,
    name: &str,
    source: &Path,
    manifest: &Manifest,
) -> Result<Option<DiffItem>> {
    let item = match read_entry(path)? {
        None => None,
        Some(EntryKind::Link { dest, .. }) => {
            if mode == SyncMode::Merge && is_within(&dest, source) {
                Some(DiffItem::new(DiffAction::Prune, name, "orphan link"))
            } else {
                Some(DiffItem::new(
                    DiffAction::LocalOnly,
                    name,
                    format!("link to {}", dest.display()),
                ))
            }
        }
        Some(EntryKind::Local) => {
            if manifest.is_managed(name) {
                Some(DiffItem::new(DiffAction::Prune, name, "orphan copy"))
            } else if path.is_dir() {
                Some(DiffItem::new(DiffAction::LocalOnly, name, "local only"))
            } else {
                None
            }
        }
    };
    Ok(item)
}
