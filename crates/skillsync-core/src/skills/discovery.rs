//! Source tree discovery.

use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use super::frontmatter::read_skill_frontmatter;
use super::{SKILL_MARKER, Skill, flat_name, is_tracked_repo_dir};
use crate::error::{IoResultExt, Result, SyncError};
use crate::fs::is_hidden_name;

/// Walk the source tree and return every skill, ordered by relative path.
///
/// Symlinks are not followed. Hidden entries and synthetic artifacts
/// (symlinked entries, staging directories) are skipped. The source root
/// itself is never a skill.
pub fn discover_skills(source: &Path) -> Result<Vec<Skill>> {
    ensure_source_dir(source)?;

    let mut skills = Vec::new();
    let walker = WalkDir::new(source)
        .follow_links(false)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_skipped(entry));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "skipping unreadable entry in source tree");
                continue;
            }
        };
        if !entry.file_type().is_dir() || !entry.path().join(SKILL_MARKER).is_file() {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(source) else {
            continue;
        };
        let segments: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        let rel_path = segments.join("/");
        let in_tracked_repo = segments
            .first()
            .map(|first| is_tracked_repo_dir(first))
            .unwrap_or(false);

        let frontmatter = read_skill_frontmatter(entry.path());
        debug!(rel_path = %rel_path, "discovered skill");

        skills.push(Skill {
            source_path: entry.path().to_path_buf(),
            flat_name: flat_name(&rel_path),
            rel_path,
            in_tracked_repo,
            targets: frontmatter.targets,
            declared_name: frontmatter.name.filter(|n| !n.trim().is_empty()),
        });
    }

    skills.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
    Ok(skills)
}

/// Coarse listing of top-level, non-hidden directories in the source.
///
/// Used by read-only diagnostics when full discovery fails.
pub fn list_top_level_dirs(source: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in
        fs::read_dir(source).io_context(|| format!("Failed to read source: {}", source.display()))?
    {
        let entry = entry.io_context(|| format!("Failed to read source: {}", source.display()))?;
        let name = entry.file_name();
        if is_hidden_name(&name) {
            continue;
        }
        if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            names.push(name.to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

/// Outcome of a best-effort scan for read-only commands.
#[derive(Debug)]
pub enum SourceScan {
    Skills(Vec<Skill>),
    /// Full discovery failed; only top-level directory names are known.
    Coarse { dirs: Vec<String>, error: SyncError },
}

impl SourceScan {
    /// Discovered skills; empty for a coarse listing.
    pub fn skills(&self) -> &[Skill] {
        match self {
            Self::Skills(skills) => skills,
            Self::Coarse { .. } => &[],
        }
    }

    pub fn count(&self) -> usize {
        match self {
            Self::Skills(skills) => skills.len(),
            Self::Coarse { dirs, .. } => dirs.len(),
        }
    }

    pub fn into_skills(self) -> Vec<Skill> {
        match self {
            Self::Skills(skills) => skills,
            Self::Coarse { .. } => Vec::new(),
        }
    }
}

/// Discover skills, falling back to [`list_top_level_dirs`] when the walk
/// fails. Errors only when the source cannot be listed at all.
pub fn scan_source(source: &Path) -> Result<SourceScan> {
    fall_back_to_listing(source, discover_skills(source))
}

fn fall_back_to_listing(source: &Path, discovered: Result<Vec<Skill>>) -> Result<SourceScan> {
    match discovered {
        Ok(skills) => Ok(SourceScan::Skills(skills)),
        Err(error) => match list_top_level_dirs(source) {
            Ok(dirs) => {
                warn!(error = %error, "discovery failed, using top-level listing");
                Ok(SourceScan::Coarse { dirs, error })
            }
            Err(_) => Err(error),
        },
    }
}

fn ensure_source_dir(source: &Path) -> Result<()> {
    match fs::metadata(source) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(SyncError::NotADirectory(source.to_path_buf())),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            Err(SyncError::SourceMissing(source.to_path_buf()))
        }
        Err(err) => Err(SyncError::io(
            format!("Failed to stat source directory: {}", source.display()),
            err,
        )),
    }
}

fn is_skipped(entry: &DirEntry) -> bool {
    is_hidden_name(entry.file_name()) || entry.path_is_symlink()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_skill(root: &Path, rel: &str, frontmatter: &str) {
        let dir = root.join(rel);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(SKILL_MARKER), frontmatter).unwrap();
    }

    #[test]
    fn test_discovers_nested_skills_in_order() {
        let tmp = TempDir::new().unwrap();
        write_skill(tmp.path(), "pdf", "# pdf");
        write_skill(tmp.path(), "frontend/react", "# react");
        write_skill(tmp.path(), "_team/deploy", "# deploy");

        let skills = discover_skills(tmp.path()).unwrap();
        let flat: Vec<_> = skills.iter().map(|s| s.flat_name.as_str()).collect();
        assert_eq!(flat, vec!["_team__deploy", "frontend__react", "pdf"]);
        assert!(skills[0].in_tracked_repo);
        assert!(!skills[1].in_tracked_repo);
        assert_eq!(skills[1].rel_path, "frontend/react");
    }

    #[test]
    fn test_skips_hidden_and_markerless() {
        let tmp = TempDir::new().unwrap();
        write_skill(tmp.path(), ".hidden/skill", "# hidden");
        write_skill(tmp.path(), "ok", "# ok");
        fs::create_dir_all(tmp.path().join("notes")).unwrap();

        let skills = discover_skills(tmp.path()).unwrap();
        assert_eq!(skills.len(), 1);
        assert_eq!(skills[0].flat_name, "ok");
    }

    #[cfg(unix)]
    #[test]
    fn test_does_not_follow_symlinked_dirs() {
        let tmp = TempDir::new().unwrap();
        let elsewhere = TempDir::new().unwrap();
        write_skill(elsewhere.path(), "linked", "# linked");
        std::os::unix::fs::symlink(elsewhere.path().join("linked"), tmp.path().join("linked"))
            .unwrap();

        assert!(discover_skills(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn test_reads_frontmatter_fields() {
        let tmp = TempDir::new().unwrap();
        write_skill(
            tmp.path(),
            "pdf",
            "---\nname: pdf-tools\ntargets: [claude, codex]\n---\n# body",
        );

        let skills = discover_skills(tmp.path()).unwrap();
        assert_eq!(skills[0].declared_name.as_deref(), Some("pdf-tools"));
        assert_eq!(
            skills[0].targets,
            Some(vec!["claude".to_string(), "codex".to_string()])
        );
    }

    #[test]
    fn test_missing_source() {
        let err = discover_skills(&PathBuf::from("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, SyncError::SourceMissing(_)));
    }

    #[test]
    fn test_hidden_source_root_is_walked() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join(".skillsync/skills");
        write_skill(&root, "a", "# a");
        assert_eq!(discover_skills(&root).unwrap().len(), 1);
    }

    #[test]
    fn test_list_top_level_dirs() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("b")).unwrap();
        fs::create_dir_all(tmp.path().join("a")).unwrap();
        fs::create_dir_all(tmp.path().join(".git")).unwrap();
        fs::write(tmp.path().join("README.md"), "").unwrap();
        assert_eq!(list_top_level_dirs(tmp.path()).unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_scan_source_full() {
        let tmp = TempDir::new().unwrap();
        write_skill(tmp.path(), "pdf", "# pdf");
        let scan = scan_source(tmp.path()).unwrap();
        assert!(matches!(scan, SourceScan::Skills(_)));
        assert_eq!(scan.count(), 1);
        assert_eq!(scan.skills()[0].flat_name, "pdf");
    }

    #[test]
    fn test_failed_walk_falls_back_to_top_level_listing() {
        let tmp = TempDir::new().unwrap();
        write_skill(tmp.path(), "pdf", "# pdf");
        fs::create_dir_all(tmp.path().join("drafts")).unwrap();
        fs::create_dir_all(tmp.path().join(".cache")).unwrap();

        let failed = Err(SyncError::io("walk failed", io::Error::other("boom")));
        let scan = fall_back_to_listing(tmp.path(), failed).unwrap();
        match &scan {
            SourceScan::Coarse { dirs, error } => {
                assert_eq!(dirs, &vec!["drafts".to_string(), "pdf".to_string()]);
                assert!(error.to_string().contains("boom"));
            }
            other => panic!("expected coarse listing, got {other:?}"),
        }
        assert_eq!(scan.count(), 2);
        assert!(scan.skills().is_empty());
    }

    #[test]
    fn test_scan_of_missing_source_keeps_discovery_error() {
        let tmp = TempDir::new().unwrap();
        let err = scan_source(&tmp.path().join("nope")).unwrap_err();
        assert!(matches!(err, SyncError::SourceMissing(_)));
    }
}
