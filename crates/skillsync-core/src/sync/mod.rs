//! Reconciliation of targets against the source tree
//!
//! Each target is kept in step by one of three strategies selected by its
//! [`SyncMode`]:
//! - symlink: the target path is one link to the source root
//! - merge: one link per selected skill, local entries preserved
//! - copy: one physical copy per selected skill, tracked by a manifest
//!
//! `status`, `doctor` and `sync` all go through [`SyncStrategy`], so the
//! classification a user sees is the one the reconciler acts on.

pub mod copy;
pub mod manifest;
pub mod merge;
pub mod prune;
pub mod report;
pub mod status;
pub mod symlink;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::diff::{TargetDiff, diff_target};
use crate::error::{IoResultExt, Result, SyncError};
use crate::fs::resolve_link;
use crate::skills::{Skill, SkillFilter};
use crate::types::{SyncMode, Target, TargetStatus};

pub use copy::CopyStrategy;
pub use manifest::{MANIFEST_FILE, Manifest, is_entry_name};
pub use merge::MergeStrategy;
pub use report::{
    CopyResult, MergeResult, PruneResult, SkipReason, SkippedItem, SymlinkAction, SyncOutcome,
    SyncRunReport, TargetRun, TargetSyncReport,
};
pub use status::{TargetInspection, classify_symlink_target, inspect_target};
pub use symlink::SymlinkStrategy;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Report decisions without touching the filesystem
    pub dry_run: bool,
    /// Replace foreign links and local directories
    pub force: bool,
}

impl SyncOptions {
    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            force: false,
        }
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }
}

/// Snapshot collaborator invoked before a target with local content is
/// mutated. Never invoked in dry-run.
pub trait BackupHook {
    /// Returns the snapshot location, if one was taken.
    fn snapshot(&self, target_name: &str, target_path: &Path) -> anyhow::Result<Option<PathBuf>>;
}

/// Backup hook that takes no snapshots.
#[derive(Debug, Default)]
pub struct NoBackup;

impl BackupHook for NoBackup {
    fn snapshot(&self, _target_name: &str, _target_path: &Path) -> anyhow::Result<Option<PathBuf>> {
        Ok(None)
    }
}

/// One way of keeping a target in step with the source.
pub trait SyncStrategy: Send + Sync {
    fn mode(&self) -> SyncMode;

    /// Read-only classification of the target.
    fn inspect(&self, target: &Target, source: &Path) -> Result<TargetInspection> {
        inspect_target(&target.path, source, self.mode())
    }

    /// Bring the target in line with `skills`, already filtered for it.
    fn reconcile(
        &self,
        target: &Target,
        source: &Path,
        skills: &[&Skill],
        options: SyncOptions,
    ) -> Result<SyncOutcome>;

    /// Remove entries the engine owns that are no longer selected.
    fn prune(
        &self,
        target: &Target,
        source: &Path,
        skills: &[&Skill],
        options: SyncOptions,
    ) -> Result<PruneResult>;

    /// Cleanup after reconcile and prune.
    fn finish(&self, _target: &Target, _options: SyncOptions) -> Result<()> {
        Ok(())
    }
}

pub fn strategy_for(mode: SyncMode) -> &'static dyn SyncStrategy {
    match mode {
        SyncMode::Symlink => &SymlinkStrategy,
        SyncMode::Merge => &MergeStrategy,
        SyncMode::Copy => &CopyStrategy,
    }
}

/// Runs strategies over targets using one discovered skill list.
pub struct SyncEngine<'a> {
    source: &'a Path,
    skills: &'a [Skill],
    backup: &'a dyn BackupHook,
}

impl<'a> SyncEngine<'a> {
    pub fn new(source: &'a Path, skills: &'a [Skill]) -> Self {
        Self {
            source,
            skills,
            backup: &NoBackup,
        }
    }

    pub fn with_backup(mut self, backup: &'a dyn BackupHook) -> Self {
        self.backup = backup;
        self
    }

    pub fn source(&self) -> &Path {
        self.source
    }

    /// The skills `target` receives. Symlink targets mirror the whole
    /// source, so filters do not apply to them.
    pub fn selected_skills(&self, target: &Target) -> Result<Vec<&'a Skill>> {
        let filter = SkillFilter::new(&target.include, &target.exclude)?;
        if target.mode == SyncMode::Symlink {
            return Ok(Vec::new());
        }
        Ok(filter.apply(self.skills, &target.name))
    }

    pub fn inspect(&self, target: &Target) -> Result<TargetInspection> {
        strategy_for(target.mode).inspect(target, self.source)
    }

    /// Preview what `sync_target` would change, without touching disk.
    pub fn diff(&self, target: &Target) -> Result<TargetDiff> {
        let skills = self.selected_skills(target)?;
        diff_target(target, self.source, &skills)
    }

    pub fn sync_target(&self, target: &Target, options: SyncOptions) -> Result<TargetSyncReport> {
        let strategy = strategy_for(target.mode);
        let skills = self.selected_skills(target)?;
        let mut warnings = Vec::new();

        let backup = if !options.dry_run && has_local_content(&target.path)? {
            match self.backup.snapshot(&target.name, &target.path) {
                Ok(location) => location,
                Err(err) => {
                    warn!(target = %target.name, error = %err, "backup failed, continuing");
                    warnings.push(format!("backup failed: {:#}", err));
                    None
                }
            }
        } else {
            None
        };

        let outcome = strategy.reconcile(target, self.source, &skills, options)?;

        let pruned = match strategy.prune(target, self.source, &skills, options) {
            Ok(pruned) => pruned,
            Err(err) => {
                warn!(target = %target.name, error = %err, "prune failed");
                PruneResult {
                    removed: Vec::new(),
                    warnings: vec![format!("prune failed: {}", err)],
                }
            }
        };

        strategy.finish(target, options)?;

        info!(
            target = %target.name,
            mode = %target.mode,
            dry_run = options.dry_run,
            changed = outcome.changed(),
            pruned = pruned.removed.len(),
            "target synced"
        );

        Ok(TargetSyncReport {
            name: target.name.clone(),
            path: target.path.clone(),
            dry_run: options.dry_run,
            backup,
            outcome,
            pruned,
            warnings,
        })
    }

    /// Sync every target in name order. A failing target does not stop the
    /// others.
    pub fn sync_all(&self, targets: &[Target], options: SyncOptions) -> SyncRunReport {
        let mut ordered: Vec<&Target> = targets.iter().collect();
        ordered.sort_by(|a, b| a.name.cmp(&b.name));

        let mut report = SyncRunReport::default();
        for target in ordered {
            let result = self.sync_target(target, options);
            if let Err(err) = &result {
                warn!(target = %target.name, error = %err, "target failed");
            }
            report.targets.push(TargetRun {
                name: target.name.clone(),
                result,
            });
        }
        report
    }
}

/// True when `path` is a real (non-link) directory with at least one entry.
pub fn has_local_content(path: &Path) -> Result<bool> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => {
            let mut entries = fs::read_dir(path)
                .io_context(|| format!("Failed to read target: {}", path.display()))?;
            Ok(entries.next().is_some())
        }
        Ok(_) => Ok(false),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(SyncError::io(
            format!("Failed to stat target: {}", path.display()),
            err,
        )),
    }
}

/// What currently occupies a per-skill entry path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum EntryKind {
    Link { dest: PathBuf, dangling: bool },
    Local,
}

pub(crate) fn read_entry(path: &Path) -> Result<Option<EntryKind>> {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(SyncError::io(
                format!("Failed to stat {}", path.display()),
                err,
            ));
        }
    };
    if meta.file_type().is_symlink() {
        let dest =
            resolve_link(path).io_context(|| format!("Failed to read link: {}", path.display()))?;
        let dangling = fs::metadata(&dest).is_err();
        return Ok(Some(EntryKind::Link { dest, dangling }));
    }
    Ok(Some(EntryKind::Local))
}

/// Make sure a merge or copy target is a real directory.
///
/// A whole-directory link (left by symlink mode) is converted: removed and
/// replaced by an empty directory. A link to something other than the source
/// is a conflict unless forced. Returns `true` when a link was (or, in
/// dry-run, would be) converted; the caller must then treat the target as
/// empty.
pub(crate) fn prepare_target_dir(
    target: &Target,
    source: &Path,
    options: SyncOptions,
) -> Result<bool> {
    let path = &target.path;
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            if !options.dry_run {
                fs::create_dir_all(path)
                    .io_context(|| format!("Failed to create target: {}", path.display()))?;
            }
            return Ok(false);
        }
        Err(err) => {
            return Err(SyncError::io(
                format!("Failed to stat target: {}", path.display()),
                err,
            ));
        }
    };

    if meta.file_type().is_symlink() {
        let status = status::classify_link(path, source)?;
        if status == TargetStatus::Conflict && !options.force {
            let points_to = resolve_link(path)
                .io_context(|| format!("Failed to read link: {}", path.display()))?;
            return Err(SyncError::Conflict {
                path: path.clone(),
                points_to,
            });
        }
        info!(
            target = %target.name,
            previous = %status,
            mode = %target.mode,
            "converting whole-directory link"
        );
        if !options.dry_run {
            fs::remove_file(path)
                .io_context(|| format!("Failed to remove link: {}", path.display()))?;
            fs::create_dir_all(path)
                .io_context(|| format!("Failed to create target: {}", path.display()))?;
        }
        return Ok(true);
    }

    if !meta.is_dir() {
        return Err(SyncError::NotADirectory(path.clone()));
    }
    Ok(false)
}
