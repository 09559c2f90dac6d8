//! Read-only health checks over the source tree and targets.
//!
//! Nothing here mutates the filesystem; `status` and `doctor` build their
//! reports from these checks.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{IoResultExt, Result};
use crate::fs::{is_hidden_name, is_symlink};
use crate::skills::{SKILL_MARKER, Skill, SkillFilter, is_tracked_repo_dir};
use crate::sync::{Manifest, TargetInspection};
use crate::types::{SyncMode, Target, TargetStatus};

/// Several source directories flatten to the same target entry name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlatNameCollision {
    pub flat_name: String,
    pub source_paths: Vec<PathBuf>,
}

pub fn find_flat_name_collisions(skills: &[Skill]) -> Vec<FlatNameCollision> {
    let mut groups: BTreeMap<&str, BTreeSet<&Path>> = BTreeMap::new();
    for skill in skills {
        groups
            .entry(skill.flat_name.as_str())
            .or_default()
            .insert(skill.source_path.as_path());
    }
    groups
        .into_iter()
        .filter(|(_, paths)| paths.len() > 1)
        .map(|(flat_name, paths)| FlatNameCollision {
            flat_name: flat_name.to_string(),
            source_paths: paths.into_iter().map(Path::to_path_buf).collect(),
        })
        .collect()
}

/// Several skills declare the same frontmatter `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameCollision {
    pub name: String,
    pub rel_paths: Vec<String>,
}

pub fn find_declared_name_collisions<'a, I>(skills: I) -> Vec<NameCollision>
where
    I: IntoIterator<Item = &'a Skill>,
{
    let mut groups: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for skill in skills {
        if let Some(name) = skill.declared_name.as_deref() {
            groups
                .entry(name)
                .or_default()
                .push(skill.rel_path.clone());
        }
    }
    groups
        .into_iter()
        .filter(|(_, paths)| paths.len() > 1)
        .map(|(name, rel_paths)| NameCollision {
            name: name.to_string(),
            rel_paths,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetNameCollisions {
    pub target: String,
    pub collisions: Vec<NameCollision>,
}

/// Declared-name collisions over all skills, and per filtered target.
///
/// Symlink targets and targets without filters see the whole source, so
/// they add nothing beyond the global list and are skipped. Targets with
/// invalid patterns are skipped too; `doctor` reports those separately.
pub fn find_name_collisions_for_targets(
    skills: &[Skill],
    targets: &[Target],
) -> (Vec<NameCollision>, Vec<TargetNameCollisions>) {
    let global = find_declared_name_collisions(skills);
    let mut per_target = Vec::new();

    for target in targets {
        if target.mode == SyncMode::Symlink || !target.has_filters() {
            continue;
        }
        let Ok(filter) = SkillFilter::new(&target.include, &target.exclude) else {
            continue;
        };
        let selected = filter.apply(skills, &target.name);
        let collisions = find_declared_name_collisions(selected);
        if !collisions.is_empty() {
            per_target.push(TargetNameCollisions {
                target: target.name.clone(),
                collisions,
            });
        }
    }

    (global, per_target)
}

/// A merge or copy target holding fewer synced entries than it should.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriftReport {
    pub target: String,
    pub mode: SyncMode,
    pub expected: usize,
    pub actual: usize,
    pub observed: TargetStatus,
}

impl DriftReport {
    pub fn missing(&self) -> usize {
        self.expected.saturating_sub(self.actual)
    }
}

/// Drift of an inspected target against the number of skills it selects.
pub fn drift_from(
    target: &Target,
    expected: usize,
    inspection: &TargetInspection,
) -> Option<DriftReport> {
    let actual = inspection.synced();
    (actual < expected).then(|| DriftReport {
        target: target.name.clone(),
        mode: target.mode,
        expected,
        actual,
        observed: inspection.status,
    })
}

/// A skill present in the source and also as a real directory elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateSkill {
    pub name: String,
    /// `source` followed by the names of targets holding a real copy
    pub locations: Vec<String>,
}

/// Scan symlink and copy targets for real, unmanaged directories named like
/// a source skill. Merge targets keep local entries by design and are not
/// scanned.
pub fn find_duplicate_skills(source_names: &[String], targets: &[Target]) -> Vec<DuplicateSkill> {
    let known: HashSet<&str> = source_names.iter().map(String::as_str).collect();
    let mut found: BTreeMap<String, Vec<String>> = BTreeMap::new();

    let mut ordered: Vec<&Target> = targets.iter().collect();
    ordered.sort_by(|a, b| a.name.cmp(&b.name));

    for target in ordered {
        if target.mode == SyncMode::Merge || is_symlink(&target.path) {
            continue;
        }
        let manifest = Manifest::load(&target.path).unwrap_or_default();
        let Ok(entries) = fs::read_dir(&target.path) else {
            continue;
        };
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_hidden_name(&entry.file_name())
                || !known.contains(name.as_str())
                || manifest.is_managed(&name)
            {
                continue;
            }
            if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                found.entry(name).or_default().push(target.name.clone());
            }
        }
    }

    found
        .into_iter()
        .map(|(name, targets)| {
            let mut locations = vec!["source".to_string()];
            locations.extend(targets);
            DuplicateSkill { name, locations }
        })
        .collect()
}

/// Create and drop a scratch file in `dir` to prove the current user can
/// write there. Permission bits alone miss ownership and ACLs.
pub fn check_writable(dir: &Path) -> Result<()> {
    tempfile::Builder::new()
        .prefix(".skillsync-write-test")
        .tempfile_in(dir)
        .map(drop)
        .io_context(|| format!("Cannot write to {}", dir.display()))
}

/// Dangling symlinks directly under `dir`, by name.
pub fn find_broken_links(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut broken: Vec<String> = entries
        .flatten()
        .filter(|entry| entry.file_type().map(|t| t.is_symlink()).unwrap_or(false))
        .filter(|entry| fs::metadata(entry.path()).is_err())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    broken.sort();
    broken
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalSkill {
    pub name: String,
    pub path: PathBuf,
}

/// Real directories in a merge or copy target that the engine does not own.
pub fn find_local_skills(target: &Path) -> Result<Vec<LocalSkill>> {
    if is_symlink(target) || !target.is_dir() {
        return Ok(Vec::new());
    }
    let manifest = Manifest::load(target)?;
    let mut locals = Vec::new();
    for entry in
        fs::read_dir(target).io_context(|| format!("Failed to read target: {}", target.display()))?
    {
        let entry = entry.io_context(|| format!("Failed to read target: {}", target.display()))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_hidden_name(&entry.file_name()) || manifest.is_managed(&name) {
            continue;
        }
        if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            locals.push(LocalSkill {
                name,
                path: entry.path(),
            });
        }
    }
    locals.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(locals)
}

/// Skills whose `targets` field names a target that is neither configured
/// nor known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnknownSkillTarget {
    pub skill: String,
    pub target: String,
}

pub fn find_unknown_skill_targets(
    skills: &[Skill],
    valid_targets: &HashSet<String>,
) -> Vec<UnknownSkillTarget> {
    let mut unknown = Vec::new();
    for skill in skills {
        for name in skill.targets.iter().flatten() {
            if !valid_targets.contains(name) {
                unknown.push(UnknownSkillTarget {
                    skill: skill.flat_name.clone(),
                    target: name.clone(),
                });
            }
        }
    }
    unknown
}

/// Top-level source directories that look like skills but have no
/// `SKILL.md` anywhere below them.
pub fn find_dirs_without_marker(source: &Path, skills: &[Skill]) -> Vec<String> {
    let Ok(entries) = fs::read_dir(source) else {
        return Vec::new();
    };
    let covered: HashSet<&str> = skills
        .iter()
        .filter_map(|s| s.rel_path.split('/').next())
        .collect();

    let mut missing: Vec<String> = entries
        .flatten()
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| !name.starts_with('.') && !is_tracked_repo_dir(name))
        .filter(|name| !covered.contains(name.as_str()))
        .filter(|name| !source.join(name).join(SKILL_MARKER).exists())
        .collect();
    missing.sort();
    missing
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skills::discover_skills;
    use crate::sync::inspect_target;
    use tempfile::TempDir;

    fn write_skill(root: &Path, rel: &str, name: Option<&str>) {
        let dir = root.join(rel);
        fs::create_dir_all(&dir).unwrap();
        let body = match name {
            Some(name) => format!("---\nname: {name}\n---\n"),
            None => "# skill".to_string(),
        };
        fs::write(dir.join(SKILL_MARKER), body).unwrap();
    }

    fn fake_skill(flat: &str, path: &str) -> Skill {
        Skill {
            source_path: PathBuf::from(path),
            rel_path: path.trim_start_matches("/src/").to_string(),
            flat_name: flat.to_string(),
            in_tracked_repo: false,
            targets: None,
            declared_name: None,
        }
    }

    #[test]
    fn test_flat_name_collisions() {
        let skills = vec![
            fake_skill("a__b", "/src/a/b"),
            fake_skill("a__b", "/src/a__b"),
            fake_skill("c", "/src/c"),
        ];
        let collisions = find_flat_name_collisions(&skills);
        assert_eq!(collisions.len(), 1);
        assert_eq!(collisions[0].flat_name, "a__b");
        assert_eq!(collisions[0].source_paths.len(), 2);
    }

    #[test]
    fn test_declared_name_collisions_per_target() {
        let tmp = TempDir::new().unwrap();
        write_skill(tmp.path(), "one", Some("shared"));
        write_skill(tmp.path(), "two", Some("shared"));
        write_skill(tmp.path(), "three", None);
        let skills = discover_skills(tmp.path()).unwrap();

        let targets = vec![
            Target::new("narrow", "/t/narrow", SyncMode::Merge).with_include(["one"]),
            Target::new("wide", "/t/wide", SyncMode::Merge).with_include(["one", "two"]),
            Target::new("all", "/t/all", SyncMode::Symlink).with_include(["one", "two"]),
        ];
        let (global, per_target) = find_name_collisions_for_targets(&skills, &targets);

        assert_eq!(global.len(), 1);
        assert_eq!(global[0].rel_paths, vec!["one", "two"]);
        assert_eq!(per_target.len(), 1);
        assert_eq!(per_target[0].target, "wide");
    }

    #[test]
    fn test_unknown_skill_targets() {
        let mut skill = fake_skill("a", "/src/a");
        skill.targets = Some(vec!["claude".into(), "nope".into()]);
        let valid: HashSet<String> = ["claude".to_string()].into_iter().collect();
        let unknown = find_unknown_skill_targets(&[skill], &valid);
        assert_eq!(
            unknown,
            vec![UnknownSkillTarget {
                skill: "a".into(),
                target: "nope".into()
            }]
        );
    }

    #[test]
    fn test_dirs_without_marker() {
        let tmp = TempDir::new().unwrap();
        write_skill(tmp.path(), "ok", None);
        write_skill(tmp.path(), "group/nested", None);
        fs::create_dir_all(tmp.path().join("empty")).unwrap();
        fs::create_dir_all(tmp.path().join("_repo")).unwrap();
        let skills = discover_skills(tmp.path()).unwrap();

        assert_eq!(find_dirs_without_marker(tmp.path(), &skills), vec!["empty"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_broken_links_and_local_skills() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("target");
        fs::create_dir_all(target.join("mine")).unwrap();
        fs::create_dir_all(target.join("copied")).unwrap();
        std::os::unix::fs::symlink(tmp.path().join("gone"), target.join("dead")).unwrap();
        let mut manifest = Manifest::default();
        manifest.record("copied", "h".into());
        manifest.save(&target).unwrap();

        assert_eq!(find_broken_links(&target), vec!["dead"]);
        let locals = find_local_skills(&target).unwrap();
        assert_eq!(locals.len(), 1);
        assert_eq!(locals[0].name, "mine");
    }

    #[test]
    fn test_duplicates_skip_merge_and_managed() {
        let tmp = TempDir::new().unwrap();
        let copy_target = tmp.path().join("copy");
        let merge_target = tmp.path().join("merge");
        fs::create_dir_all(copy_target.join("pdf")).unwrap();
        fs::create_dir_all(copy_target.join("managed")).unwrap();
        fs::create_dir_all(merge_target.join("pdf")).unwrap();
        let mut manifest = Manifest::default();
        manifest.record("managed", "h".into());
        manifest.save(&copy_target).unwrap();

        let targets = vec![
            Target::new("copy", &copy_target, SyncMode::Copy),
            Target::new("merge", &merge_target, SyncMode::Merge),
        ];
        let names = vec!["pdf".to_string(), "managed".to_string()];
        let dups = find_duplicate_skills(&names, &targets);
        assert_eq!(dups.len(), 1);
        assert_eq!(dups[0].locations, vec!["source", "copy"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_drift_counts_missing_links() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("source");
        write_skill(&source, "a", None);
        write_skill(&source, "b", None);
        let skills = discover_skills(&source).unwrap();
        let target = Target::new("t", tmp.path().join("t"), SyncMode::Merge);
        fs::create_dir_all(&target.path).unwrap();
        std::os::unix::fs::symlink(source.join("a"), target.path.join("a")).unwrap();

        let inspection = inspect_target(&target.path, &source, target.mode).unwrap();
        let drift = drift_from(&target, skills.len(), &inspection).unwrap();
        assert_eq!(drift.expected, 2);
        assert_eq!(drift.actual, 1);
        assert_eq!(drift.missing(), 1);

        std::os::unix::fs::symlink(source.join("b"), target.path.join("b")).unwrap();
        let inspection = inspect_target(&target.path, &source, target.mode).unwrap();
        assert!(drift_from(&target, skills.len(), &inspection).is_none());
    }

    #[test]
    fn test_check_writable() {
        let tmp = TempDir::new().unwrap();
        check_writable(tmp.path()).unwrap();
        assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);

        let missing = tmp.path().join("missing");
        let err = check_writable(&missing).unwrap_err();
        assert!(err.to_string().starts_with("Cannot write to"));
    }
}
