//! Whole-directory symlink strategy.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::manifest::{MANIFEST_FILE, Manifest};
use super::report::{PruneResult, SymlinkAction, SyncOutcome};
use super::{SyncOptions, SyncStrategy};
use crate::error::{IoResultExt, Result, SyncError};
use crate::fs::{create_link, is_hidden_name, is_within, move_path, resolve_link};
use crate::skills::Skill;
use crate::types::{SyncMode, Target, TargetStatus};

#[derive(Debug, Clone, Copy, Default)]
pub struct SymlinkStrategy;

impl SyncStrategy for SymlinkStrategy {
    fn mode(&self) -> SyncMode {
        SyncMode::Symlink
    }

    fn reconcile(
        &self,
        target: &Target,
        source: &Path,
        _skills: &[&Skill],
        options: SyncOptions,
    ) -> Result<SyncOutcome> {
        let path = &target.path;
        let status = super::classify_symlink_target(path, source)?;
        debug!(target = %target.name, status = %status, "classified symlink target");

        let action = match status {
            TargetStatus::Linked => SymlinkAction::AlreadyLinked,
            TargetStatus::NotExist => {
                if !options.dry_run {
                    create_link(source, path)?;
                }
                SymlinkAction::Created
            }
            TargetStatus::Broken => {
                if !options.dry_run {
                    remove_link(path)?;
                    create_link(source, path)?;
                }
                SymlinkAction::FixedBroken
            }
            TargetStatus::Conflict => {
                let previous = resolve_link(path)
                    .io_context(|| format!("Failed to read link: {}", path.display()))?;
                if !options.force {
                    return Err(SyncError::Conflict {
                        path: path.clone(),
                        points_to: previous,
                    });
                }
                if !options.dry_run {
                    remove_link(path)?;
                    create_link(source, path)?;
                }
                SymlinkAction::ReplacedConflict { previous }
            }
            TargetStatus::HasFiles | TargetStatus::Merged | TargetStatus::Copied => {
                let plan = MigrationPlan::build(path, source)?;
                if !plan.collisions.is_empty() {
                    return Err(SyncError::MigrationCollision {
                        path: path.clone(),
                        names: plan.collisions,
                    });
                }
                if !options.dry_run {
                    plan.execute(path, source)?;
                    create_link(source, path)?;
                }
                SymlinkAction::Migrated {
                    moved: plan.moves.into_iter().map(|m| m.name).collect(),
                    discarded: plan.discarded,
                }
            }
        };

        if action.changed() && !options.dry_run {
            info!(target = %target.name, action = action.describe(), "symlink target updated");
        }
        Ok(SyncOutcome::Symlink { action })
    }

    fn prune(
        &self,
        _target: &Target,
        _source: &Path,
        _skills: &[&Skill],
        _options: SyncOptions,
    ) -> Result<PruneResult> {
        Ok(PruneResult::default())
    }
}

fn remove_link(path: &Path) -> Result<()> {
    fs::remove_file(path).io_context(|| format!("Failed to remove link: {}", path.display()))
}

#[derive(Debug)]
struct PlannedMove {
    name: String,
    from: PathBuf,
    to: PathBuf,
}

/// What happens to each entry of a real target directory before it becomes
/// a link.
///
/// Per-skill links into the source and manifest-owned copies are engine
/// artifacts and are dropped, as are hidden files the source already has
/// (`.DS_Store` and the like). Everything else moves into the source; a name
/// already present there is a collision.
#[derive(Debug, Default)]
struct MigrationPlan {
    moves: Vec<PlannedMove>,
    discarded: Vec<String>,
    collisions: Vec<String>,
}

impl MigrationPlan {
    fn build(target: &Path, source: &Path) -> Result<Self> {
        let manifest = Manifest::load(target)?;
        let mut entries = fs::read_dir(target)
            .io_context(|| format!("Failed to read target: {}", target.display()))?
            .collect::<std::io::Result<Vec<_>>>()
            .io_context(|| format!("Failed to read target: {}", target.display()))?;
        entries.sort_by_key(|e| e.file_name());

        let mut plan = Self::default();
        for entry in entries {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name == MANIFEST_FILE {
                continue;
            }
            let from = entry.path();
            let ty = entry
                .file_type()
                .io_context(|| format!("Failed to stat {}", from.display()))?;

            if ty.is_symlink()
                && let Ok(dest) = resolve_link(&from)
                && is_within(&dest, source)
            {
                plan.discarded.push(name);
                continue;
            }
            if ty.is_dir() && manifest.is_managed(&name) {
                plan.discarded.push(name);
                continue;
            }

            let to = source.join(&name);
            if fs::symlink_metadata(&to).is_ok() {
                if ty.is_file() && is_hidden_name(&entry.file_name()) {
                    plan.discarded.push(name);
                } else {
                    plan.collisions.push(name);
                }
            } else {
                plan.moves.push(PlannedMove { name, from, to });
            }
        }
        Ok(plan)
    }

    fn execute(&self, target: &Path, source: &Path) -> Result<()> {
        fs::create_dir_all(source)
            .io_context(|| format!("Failed to create source: {}", source.display()))?;
        for planned in &self.moves {
            move_path(&planned.from, &planned.to)?;
            info!(entry = %planned.name, "migrated entry into source");
        }
        fs::remove_dir_all(target)
            .io_context(|| format!("Failed to remove target: {}", target.display()))
    }
}
