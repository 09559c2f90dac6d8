//! Per-skill link strategy.

use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

use super::manifest::Manifest;
use super::report::{MergeResult, PruneResult, SkipReason, SkippedItem, SyncOutcome};
use super::{EntryKind, SyncOptions, SyncStrategy, prepare_target_dir, prune, read_entry};
use crate::error::{IoResultExt, Result};
use crate::fs::{create_link, remove_path, same_path};
use crate::skills::Skill;
use crate::types::{SyncMode, Target};

#[derive(Debug, Clone, Copy, Default)]
pub struct MergeStrategy;

impl SyncStrategy for MergeStrategy {
    fn mode(&self) -> SyncMode {
        SyncMode::Merge
    }

    fn reconcile(
        &self,
        target: &Target,
        source: &Path,
        skills: &[&Skill],
        options: SyncOptions,
    ) -> Result<SyncOutcome> {
        let converting = prepare_target_dir(target, source, options)?;
        // Copies left behind by copy mode are engine-owned.
        let leftover = if converting {
            Manifest::default()
        } else {
            Manifest::load(&target.path)?
        };

        let mut result = MergeResult::default();
        for skill in skills {
            let entry = target.path.join(&skill.flat_name);
            let existing = if converting {
                Ok(None)
            } else {
                read_entry(&entry)
            };
            let outcome = existing.and_then(|existing| {
                merge_one(skill, &entry, existing, &leftover, options, &mut result)
            });
            if let Err(err) = outcome {
                warn!(skill = %skill.flat_name, error = %err, "merge failed for skill");
                result
                    .warnings
                    .push(format!("{}: {}", skill.flat_name, err));
                result
                    .skipped
                    .push(SkippedItem::new(&skill.flat_name, SkipReason::Failed));
            }
        }

        Ok(SyncOutcome::Merge(result))
    }

    fn prune(
        &self,
        target: &Target,
        source: &Path,
        skills: &[&Skill],
        options: SyncOptions,
    ) -> Result<PruneResult> {
        prune::prune_orphan_links(&target.path, source, skills, options)
    }

    fn finish(&self, target: &Target, options: SyncOptions) -> Result<()> {
        if options.dry_run || !Manifest::exists_in(&target.path) {
            return Ok(());
        }
        Manifest::remove(&target.path)?;
        info!(target = %target.name, "removed leftover copy manifest");
        Ok(())
    }
}

fn merge_one(
    skill: &Skill,
    entry: &Path,
    existing: Option<EntryKind>,
    leftover: &Manifest,
    options: SyncOptions,
    result: &mut MergeResult,
) -> Result<()> {
    let name = skill.flat_name.as_str();
    match existing {
        None => {
            if !options.dry_run {
                create_link(&skill.source_path, entry)?;
            }
            debug!(skill = name, "linked");
            result.linked.push(name.to_string());
        }
        Some(EntryKind::Link { dest, dangling }) => {
            if !dangling && same_path(&dest, &skill.source_path) {
                result
                    .skipped
                    .push(SkippedItem::new(name, SkipReason::UpToDate));
            } else if dangling || options.force {
                if !options.dry_run {
                    fs::remove_file(entry)
                        .io_context(|| format!("Failed to remove link: {}", entry.display()))?;
                    create_link(&skill.source_path, entry)?;
                }
                debug!(skill = name, previous = %dest.display(), "relinked");
                result.updated.push(name.to_string());
            } else {
                warn!(skill = name, points_to = %dest.display(), "keeping foreign link");
                result.warnings.push(format!(
                    "{}: symlink points to {} (use --force to replace)",
                    name,
                    dest.display()
                ));
                result
                    .skipped
                    .push(SkippedItem::new(name, SkipReason::ForeignLink));
            }
        }
        Some(EntryKind::Local) => {
            if options.force || leftover.is_managed(name) {
                if !options.dry_run {
                    remove_path(entry)
                        .io_context(|| format!("Failed to remove {}", entry.display()))?;
                    create_link(&skill.source_path, entry)?;
                }
                debug!(skill = name, "replaced local entry with link");
                result.updated.push(name.to_string());
            } else {
                result
                    .skipped
                    .push(SkippedItem::new(name, SkipReason::LocalPreserved));
            }
        }
    }
    Ok(())
}
