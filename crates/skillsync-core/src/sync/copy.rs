//! Physical copy strategy, tracked by a manifest.

use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use super::manifest::Manifest;
use super::report::{CopyResult, PruneResult, SkipReason, SkippedItem, SyncOutcome};
use super::{EntryKind, SyncOptions, SyncStrategy, prepare_target_dir, prune, read_entry};
use crate::error::{IoResultExt, Result};
use crate::fs::{hash_tree, is_within, replace_with_copy};
use crate::skills::Skill;
use crate::types::{SyncMode, Target};

#[derive(Debug, Clone, Copy, Default)]
pub struct CopyStrategy;

impl SyncStrategy for CopyStrategy {
    fn mode(&self) -> SyncMode {
        SyncMode::Copy
    }

    fn reconcile(
        &self,
        target: &Target,
        source: &Path,
        skills: &[&Skill],
        options: SyncOptions,
    ) -> Result<SyncOutcome> {
        let converting = prepare_target_dir(target, source, options)?;
        let mut manifest = if converting {
            Manifest::default()
        } else {
            Manifest::load(&target.path)?
        };

        let mut result = CopyResult::default();
        for skill in skills {
            let entry = target.path.join(&skill.flat_name);
            let outcome = copy_one(
                skill,
                &entry,
                source,
                converting,
                &mut manifest,
                options,
                &mut result,
            );
            if let Err(err) = outcome {
                warn!(skill = %skill.flat_name, error = %err, "copy failed for skill");
                result
                    .warnings
                    .push(format!("{}: {}", skill.flat_name, err));
                result
                    .skipped
                    .push(SkippedItem::new(&skill.flat_name, SkipReason::Failed));
            }
        }

        if !options.dry_run {
            manifest.save(&target.path)?;
        }
        Ok(SyncOutcome::Copy(result))
    }

    fn prune(
        &self,
        target: &Target,
        _source: &Path,
        skills: &[&Skill],
        options: SyncOptions,
    ) -> Result<PruneResult> {
        prune::prune_orphan_copies(&target.path, skills, options)
    }
}

/// Decide and apply the copy of one skill. The manifest only gains an entry
/// once its copy is in place.
fn copy_one(
    skill: &Skill,
    entry: &Path,
    source: &Path,
    converting: bool,
    manifest: &mut Manifest,
    options: SyncOptions,
    result: &mut CopyResult,
) -> Result<()> {
    let name = skill.flat_name.as_str();
    let fingerprint = hash_tree(&skill.source_path)?;
    let existing = if converting {
        None
    } else {
        read_entry(entry)?
    };

    match existing {
        None => {
            if !options.dry_run {
                replace_with_copy(&skill.source_path, entry)?;
            }
            manifest.record(name, fingerprint);
            result.copied.push(name.to_string());
        }
        Some(EntryKind::Link { dest, dangling }) => {
            if dangling || is_within(&dest, source) || options.force {
                if !options.dry_run {
                    fs::remove_file(entry)
                        .io_context(|| format!("Failed to remove link: {}", entry.display()))?;
                    replace_with_copy(&skill.source_path, entry)?;
                }
                manifest.record(name, fingerprint);
                result.copied.push(name.to_string());
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
        Some(EntryKind::Local) => match manifest.fingerprint(name) {
            Some(recorded) if recorded == fingerprint => {
                result
                    .skipped
                    .push(SkippedItem::new(name, SkipReason::UpToDate));
            }
            Some(_) => {
                if !options.dry_run {
                    replace_with_copy(&skill.source_path, entry)?;
                }
                debug!(skill = name, "source changed, re-copied");
                manifest.record(name, fingerprint);
                result.updated.push(name.to_string());
            }
            None if options.force => {
                if !options.dry_run {
                    replace_with_copy(&skill.source_path, entry)?;
                }
                debug!(skill = name, "adopted local directory");
                manifest.record(name, fingerprint);
                result.updated.push(name.to_string());
            }
            None => {
                result
                    .skipped
                    .push(SkippedItem::new(name, SkipReason::LocalPreserved));
            }
        },
    }
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::skills::discover_skills;
    use std::os::unix::fs::symlink;
    use std::path::PathBuf;
    use tempfile::TempDir;

    struct Fixture {
        _tmp: TempDir,
        source: PathBuf,
        target: Target,
    }

    fn fixture(names: &[&str]) -> Fixture {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("source");
        for name in names {
            let dir = source.join(name);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("SKILL.md"), format!("# {name}")).unwrap();
        }
        let target = Target::new("t", tmp.path().join("target"), SyncMode::Copy);
        Fixture {
            _tmp: tmp,
            source,
            target,
        }
    }

    fn copy(f: &Fixture, options: SyncOptions) -> CopyResult {
        let skills = discover_skills(&f.source).unwrap();
        let refs: Vec<&Skill> = skills.iter().collect();
        CopyStrategy
            .reconcile(&f.target, &f.source, &refs, options)
            .unwrap()
            .as_copy()
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_copies_and_records_manifest() {
        let f = fixture(&["a", "b"]);
        let result = copy(&f, SyncOptions::default());
        assert_eq!(result.copied, vec!["a", "b"]);
        assert!(f.target.path.join("a/SKILL.md").is_file());
        assert!(!f.target.path.join("a").is_symlink());

        let manifest = Manifest::load(&f.target.path).unwrap();
        assert_eq!(
            manifest.fingerprint("a"),
            Some(hash_tree(&f.source.join("a")).unwrap().as_str())
        );
    }

    #[test]
    fn test_unchanged_is_up_to_date_and_changed_is_updated() {
        let f = fixture(&["a"]);
        copy(&f, SyncOptions::default());

        let again = copy(&f, SyncOptions::default());
        assert_eq!(again.skipped_with(SkipReason::UpToDate), vec!["a"]);

        fs::write(f.source.join("a/SKILL.md"), "# a v2").unwrap();
        let changed = copy(&f, SyncOptions::default());
        assert_eq!(changed.updated, vec!["a"]);
        assert_eq!(
            fs::read_to_string(f.target.path.join("a/SKILL.md")).unwrap(),
            "# a v2"
        );
    }

    #[test]
    fn test_unmanaged_directory_adopted_only_with_force() {
        let f = fixture(&["a"]);
        fs::create_dir_all(f.target.path.join("a")).unwrap();
        fs::write(f.target.path.join("a/mine.md"), "local").unwrap();

        let result = copy(&f, SyncOptions::default());
        assert_eq!(result.skipped_with(SkipReason::LocalPreserved), vec!["a"]);
        assert!(!Manifest::load(&f.target.path).unwrap().is_managed("a"));

        let forced = copy(&f, SyncOptions::default().with_force(true));
        assert_eq!(forced.updated, vec!["a"]);
        assert!(!f.target.path.join("a/mine.md").exists());
        assert!(Manifest::load(&f.target.path).unwrap().is_managed("a"));
    }

    #[test]
    fn test_leftover_source_link_becomes_copy() {
        let f = fixture(&["a"]);
        fs::create_dir_all(&f.target.path).unwrap();
        symlink(f.source.join("a"), f.target.path.join("a")).unwrap();

        let result = copy(&f, SyncOptions::default());
        assert_eq!(result.copied, vec!["a"]);
        assert!(!f.target.path.join("a").is_symlink());
        assert!(f.target.path.join("a/SKILL.md").is_file());
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let f = fixture(&["a"]);
        let result = copy(&f, SyncOptions::dry_run());
        assert_eq!(result.copied, vec!["a"]);
        assert!(!f.target.path.exists());
    }
}
