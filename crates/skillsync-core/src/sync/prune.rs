//! Orphan removal for merge and copy targets.
//!
//! Only entries the engine can prove it owns are removed: links into the
//! source tree and manifest-recorded copies. Local directories are never
//! touched and never reported.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;

use tracing::{info, warn};

use super::manifest::{Manifest, is_entry_name};
use super::report::PruneResult;
use super::{EntryKind, SyncOptions, read_entry};
use crate::error::{IoResultExt, Result, SyncError};
use crate::fs::{is_hidden_name, is_symlink, is_within, remove_path};
use crate::skills::Skill;

fn wanted_names<'a>(skills: &[&'a Skill]) -> HashSet<&'a str> {
    skills.iter().map(|s| s.flat_name.as_str()).collect()
}

/// Sorted, non-hidden entry names of a real target directory.
pub(crate) fn entry_names(target: &Path) -> Result<Vec<String>> {
    if is_symlink(target) {
        return Ok(Vec::new());
    }
    let entries = match fs::read_dir(target) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => {
            return Err(SyncError::io(
                format!("Failed to read target: {}", target.display()),
                err,
            ));
        }
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.io_context(|| format!("Failed to read target: {}", target.display()))?;
        if !is_hidden_name(&entry.file_name()) {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

/// Merge mode: remove links into the source (and leftover manifest copies)
/// whose names are no longer selected.
pub fn prune_orphan_links(
    target: &Path,
    source: &Path,
    skills: &[&Skill],
    options: SyncOptions,
) -> Result<PruneResult> {
    let wanted = wanted_names(skills);
    let leftover = if is_symlink(target) {
        Manifest::default()
    } else {
        Manifest::load(target)?
    };
    let mut result = PruneResult::default();

    for name in entry_names(target)? {
        if wanted.contains(name.as_str()) {
            continue;
        }
        let path = target.join(&name);
        let owned = match read_entry(&path) {
            Ok(Some(EntryKind::Link { dest, .. })) => {
                if is_within(&dest, source) {
                    true
                } else {
                    result.warnings.push(format!(
                        "{}: symlink to external location {}, kept",
                        name,
                        dest.display()
                    ));
                    false
                }
            }
            Ok(Some(EntryKind::Local)) => leftover.is_managed(&name),
            Ok(None) => false,
            Err(err) => {
                result.warnings.push(format!("{}: {}", name, err));
                false
            }
        };
        if !owned {
            continue;
        }

        if !options.dry_run
            && let Err(err) = remove_path(&path)
        {
            warn!(entry = %name, error = %err, "failed to prune");
            result
                .warnings
                .push(format!("{}: failed to remove: {}", name, err));
            continue;
        }
        info!(entry = %name, dry_run = options.dry_run, "pruned orphan");
        result.removed.push(name);
    }

    Ok(result)
}

/// Copy mode: remove every manifest-recorded copy whose name is no longer
/// selected, and drop its manifest entry.
pub fn prune_orphan_copies(
    target: &Path,
    skills: &[&Skill],
    options: SyncOptions,
) -> Result<PruneResult> {
    let mut result = PruneResult::default();
    if is_symlink(target) || !Manifest::exists_in(target) {
        return Ok(result);
    }

    let wanted = wanted_names(skills);
    let mut manifest = Manifest::load(target)?;
    let orphans: Vec<String> = manifest
        .managed
        .keys()
        .filter(|name| !wanted.contains(name.as_str()))
        .filter(|name| {
            let valid = is_entry_name(name);
            if !valid {
                warn!(entry = %name, "skipping manifest key outside target");
            }
            valid
        })
        .cloned()
        .collect();

    for name in orphans {
        let path = target.join(&name);
        if !options.dry_run {
            if fs::symlink_metadata(&path).is_ok()
                && let Err(err) = remove_path(&path)
            {
                warn!(entry = %name, error = %err, "failed to prune");
                result
                    .warnings
                    .push(format!("{}: failed to remove: {}", name, err));
                continue;
            }
            manifest.forget(&name);
        }
        info!(entry = %name, dry_run = options.dry_run, "pruned orphan copy");
        result.removed.push(name);
    }

    if !options.dry_run && !result.removed.is_empty() {
        manifest.save(target)?;
    }
    Ok(result)
}
