//! Read-only classification of a target path against the source tree.
//!
//! Nothing in this module mutates the filesystem.

use std::fs;
use std::io;
use std::path::Path;

use serde::Serialize;

use super::manifest::Manifest;
use crate::error::{IoResultExt, Result, SyncError};
use crate::fs::{is_hidden_name, is_within, resolve_link, same_path};
use crate::types::{SyncMode, TargetStatus};

/// Observed state of one target, with entry counts for merge and copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetInspection {
    pub mode: SyncMode,
    pub status: TargetStatus,
    /// Entries that are links into the source tree
    pub linked: usize,
    /// Entries recorded in the copy manifest that exist on disk
    pub managed: usize,
    /// Real directories the engine does not own
    pub local: usize,
}

impl TargetInspection {
    fn bare(mode: SyncMode, status: TargetStatus) -> Self {
        Self {
            mode,
            status,
            linked: 0,
            managed: 0,
            local: 0,
        }
    }

    /// Entries kept in step by this target's own mode.
    pub fn synced(&self) -> usize {
        match self.mode {
            SyncMode::Symlink => 0,
            SyncMode::Merge => self.linked,
            SyncMode::Copy => self.managed,
        }
    }

    /// The observed status when it belongs to a different mode.
    pub fn mode_drift(&self) -> Option<TargetStatus> {
        let drifted = match self.mode {
            SyncMode::Symlink => matches!(self.status, TargetStatus::Merged | TargetStatus::Copied),
            SyncMode::Merge | SyncMode::Copy => self.status == TargetStatus::Linked,
        };
        drifted.then_some(self.status)
    }
}

/// Counts of the entries directly under a target directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryCounts {
    pub linked: usize,
    pub managed: usize,
    pub local: usize,
}

/// Classify a path that is itself a symlink: `Linked`, `Broken` or
/// `Conflict`.
pub fn classify_link(link: &Path, source: &Path) -> Result<TargetStatus> {
    let dest =
        resolve_link(link).io_context(|| format!("Failed to read link: {}", link.display()))?;
    if fs::metadata(&dest).is_err() {
        return Ok(TargetStatus::Broken);
    }
    if same_path(&dest, source) {
        Ok(TargetStatus::Linked)
    } else {
        Ok(TargetStatus::Conflict)
    }
}

/// Classify a symlink-mode target.
pub fn classify_symlink_target(target: &Path, source: &Path) -> Result<TargetStatus> {
    let meta = match fs::symlink_metadata(target) {
        Ok(meta) => meta,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(TargetStatus::NotExist),
        Err(err) => {
            return Err(SyncError::io(
                format!("Failed to stat target: {}", target.display()),
                err,
            ));
        }
    };

    if meta.file_type().is_symlink() {
        return classify_link(target, source);
    }
    if !meta.is_dir() {
        return Err(SyncError::NotADirectory(target.to_path_buf()));
    }

    let counts = count_entries(target, source, None)?;
    if counts.linked > 0 {
        Ok(TargetStatus::Merged)
    } else {
        Ok(TargetStatus::HasFiles)
    }
}

/// Inspect a target for any mode.
pub fn inspect_target(target: &Path, source: &Path, mode: SyncMode) -> Result<TargetInspection> {
    if mode == SyncMode::Symlink {
        let status = classify_symlink_target(target, source)?;
        return Ok(TargetInspection::bare(mode, status));
    }

    let meta = match fs::symlink_metadata(target) {
        Ok(meta) => meta,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Ok(TargetInspection::bare(mode, TargetStatus::NotExist));
        }
        Err(err) => {
            return Err(SyncError::io(
                format!("Failed to stat target: {}", target.display()),
                err,
            ));
        }
    };
    if meta.file_type().is_symlink() {
        return Ok(TargetInspection::bare(mode, classify_link(target, source)?));
    }
    if !meta.is_dir() {
        return Err(SyncError::NotADirectory(target.to_path_buf()));
    }

    let manifest = if mode == SyncMode::Copy {
        Some(Manifest::load(target)?)
    } else {
        None
    };
    let counts = count_entries(target, source, manifest.as_ref())?;

    let status = match mode {
        SyncMode::Merge if counts.linked > 0 => TargetStatus::Merged,
        SyncMode::Copy if counts.managed > 0 => TargetStatus::Copied,
        _ => TargetStatus::HasFiles,
    };

    Ok(TargetInspection {
        mode,
        status,
        linked: counts.linked,
        managed: counts.managed,
        local: counts.local,
    })
}

/// Count the non-hidden entries of a target directory.
///
/// Links into `source` are linked; directories named in `manifest` are
/// managed; other directories and links count as local. Plain files are
/// ignored.
pub fn count_entries(
    target: &Path,
    source: &Path,
    manifest: Option<&Manifest>,
) -> Result<EntryCounts> {
    let mut counts = EntryCounts::default();
    let entries = fs::read_dir(target)
        .io_context(|| format!("Failed to read target: {}", target.display()))?;

    for entry in entries {
        let entry = entry.io_context(|| format!("Failed to read target: {}", target.display()))?;
        let name = entry.file_name();
        if is_hidden_name(&name) {
            continue;
        }
        let Ok(ty) = entry.file_type() else {
            continue;
        };

        if ty.is_symlink() {
            match resolve_link(&entry.path()) {
                Ok(dest) if is_within(&dest, source) => counts.linked += 1,
                _ => counts.local += 1,
            }
        } else if ty.is_dir() {
            let managed = manifest
                .map(|m| m.is_managed(&name.to_string_lossy()))
                .unwrap_or(false);
            if managed {
                counts.managed += 1;
            } else {
                counts.local += 1;
            }
        }
    }

    Ok(counts)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::symlink;
    use tempfile::TempDir;

    struct Fixture {
        _tmp: TempDir,
        source: std::path::PathBuf,
        target: std::path::PathBuf,
    }

    fn fixture() -> Fixture {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("source");
        fs::create_dir_all(source.join("a")).unwrap();
        let target = tmp.path().join("target");
        Fixture {
            _tmp: tmp,
            source,
            target,
        }
    }

    #[test]
    fn test_not_exist() {
        let f = fixture();
        assert_eq!(
            classify_symlink_target(&f.target, &f.source).unwrap(),
            TargetStatus::NotExist
        );
    }

    #[test]
    fn test_linked_and_relative_linked() {
        let f = fixture();
        symlink(&f.source, &f.target).unwrap();
        assert_eq!(
            classify_symlink_target(&f.target, &f.source).unwrap(),
            TargetStatus::Linked
        );

        fs::remove_file(&f.target).unwrap();
        symlink("source", &f.target).unwrap();
        assert_eq!(
            classify_symlink_target(&f.target, &f.source).unwrap(),
            TargetStatus::Linked
        );
    }

    #[test]
    fn test_broken_and_conflict() {
        let f = fixture();
        symlink(f.source.join("missing"), &f.target).unwrap();
        assert_eq!(
            classify_symlink_target(&f.target, &f.source).unwrap(),
            TargetStatus::Broken
        );

        fs::remove_file(&f.target).unwrap();
        symlink(f.source.join("a"), &f.target).unwrap();
        assert_eq!(
            classify_symlink_target(&f.target, &f.source).unwrap(),
            TargetStatus::Conflict
        );
    }

    #[test]
    fn test_has_files_merged_and_empty() {
        let f = fixture();
        fs::create_dir_all(&f.target).unwrap();
        assert_eq!(
            classify_symlink_target(&f.target, &f.source).unwrap(),
            TargetStatus::HasFiles
        );

        symlink(f.source.join("a"), f.target.join("a")).unwrap();
        assert_eq!(
            classify_symlink_target(&f.target, &f.source).unwrap(),
            TargetStatus::Merged
        );
    }

    #[test]
    fn test_file_is_not_a_directory() {
        let f = fixture();
        fs::write(&f.target, "oops").unwrap();
        let err = classify_symlink_target(&f.target, &f.source).unwrap_err();
        assert!(matches!(err, SyncError::NotADirectory(_)));
        assert!(f.target.is_file());
    }

    #[test]
    fn test_inspect_merge_counts() {
        let f = fixture();
        fs::create_dir_all(f.target.join("local")).unwrap();
        fs::create_dir_all(f.target.join(".hidden")).unwrap();
        symlink(f.source.join("a"), f.target.join("a")).unwrap();

        let inspection = inspect_target(&f.target, &f.source, SyncMode::Merge).unwrap();
        assert_eq!(inspection.status, TargetStatus::Merged);
        assert_eq!(inspection.linked, 1);
        assert_eq!(inspection.local, 1);
        assert_eq!(inspection.synced(), 1);
        assert_eq!(inspection.mode_drift(), None);
    }

    #[test]
    fn test_inspect_copy_counts() {
        let f = fixture();
        fs::create_dir_all(f.target.join("a")).unwrap();
        fs::create_dir_all(f.target.join("mine")).unwrap();
        let mut manifest = Manifest::default();
        manifest.record("a", "hash".into());
        manifest.record("gone", "hash".into());
        manifest.save(&f.target).unwrap();

        let inspection = inspect_target(&f.target, &f.source, SyncMode::Copy).unwrap();
        assert_eq!(inspection.status, TargetStatus::Copied);
        assert_eq!(inspection.managed, 1);
        assert_eq!(inspection.local, 1);
    }

    #[test]
    fn test_mode_drift() {
        let f = fixture();
        symlink(&f.source, &f.target).unwrap();
        let inspection = inspect_target(&f.target, &f.source, SyncMode::Merge).unwrap();
        assert_eq!(inspection.mode_drift(), Some(TargetStatus::Linked));

        fs::remove_file(&f.target).unwrap();
        fs::create_dir_all(&f.target).unwrap();
        symlink(f.source.join("a"), f.target.join("a")).unwrap();
        let inspection = inspect_target(&f.target, &f.source, SyncMode::Symlink).unwrap();
        assert_eq!(inspection.mode_drift(), Some(TargetStatus::Merged));
    }
}
