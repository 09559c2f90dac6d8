#![cfg(unix)]

use std::fs;
use std::path::Path;

use skillsync_core::skills::discover_skills;
use skillsync_core::sync::{Manifest, SkipReason, SyncEngine, SyncOptions, TargetSyncReport};
use skillsync_core::types::{SyncMode, Target, TargetStatus};
use tempfile::TempDir;

fn add_skill(source: &Path, rel: &str, body: &str) {
    let dir = source.join(rel);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("SKILL.md"), body).unwrap();
}

fn sync(source: &Path, target: &Target, options: SyncOptions) -> TargetSyncReport {
    let skills = discover_skills(source).unwrap();
    SyncEngine::new(source, &skills)
        .sync_target(target, options)
        .unwrap()
}

#[test]
fn copy_target_tracks_changes_through_manifest() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("source");
    add_skill(&source, "a", "# a\n");
    add_skill(&source, "b", "# b\n");
    let target = Target::new("cursor", temp.path().join("cursor"), SyncMode::Copy);

    let report = sync(&source, &target, SyncOptions::default());
    assert_eq!(report.outcome.as_copy().unwrap().copied, vec!["a", "b"]);
    assert!(target.path.join("a").is_dir());
    assert!(!target.path.join("a").is_symlink());
    let manifest = Manifest::load(&target.path).unwrap();
    assert!(manifest.is_managed("a"));
    assert!(manifest.is_managed("b"));

    let report = sync(&source, &target, SyncOptions::default());
    assert!(!report.changed());
    assert_eq!(
        report.outcome.as_copy().unwrap().skipped_with(SkipReason::UpToDate),
        vec!["a", "b"]
    );

    fs::write(source.join("a/SKILL.md"), "# a, revised\n").unwrap();
    let report = sync(&source, &target, SyncOptions::default());
    assert_eq!(report.outcome.as_copy().unwrap().updated, vec!["a"]);
    assert_eq!(
        fs::read_to_string(target.path.join("a/SKILL.md")).unwrap(),
        "# a, revised\n"
    );
}

#[test]
fn copy_prune_is_symmetric_with_selection() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("source");
    add_skill(&source, "a", "# a\n");
    add_skill(&source, "b", "# b\n");
    let target = Target::new("cursor", temp.path().join("cursor"), SyncMode::Copy);
    sync(&source, &target, SyncOptions::default());

    fs::create_dir_all(target.path.join("local")).unwrap();
    fs::remove_dir_all(source.join("b")).unwrap();

    let report = sync(&source, &target, SyncOptions::default());
    assert_eq!(report.pruned.removed, vec!["b"]);
    assert!(!target.path.join("b").exists());
    assert!(target.path.join("local").is_dir());
    assert!(!Manifest::load(&target.path).unwrap().is_managed("b"));

    let skills = discover_skills(&source).unwrap();
    let inspection = SyncEngine::new(&source, &skills).inspect(&target).unwrap();
    assert_eq!(inspection.status, TargetStatus::Copied);
    assert_eq!(inspection.managed, 1);
    assert_eq!(inspection.local, 1);
}

#[test]
fn unmanaged_directory_is_adopted_only_with_force() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("source");
    add_skill(&source, "a", "# a\n");
    let target = Target::new("cursor", temp.path().join("cursor"), SyncMode::Copy);
    fs::create_dir_all(target.path.join("a")).unwrap();
    fs::write(target.path.join("a/SKILL.md"), "# hand written\n").unwrap();

    let report = sync(&source, &target, SyncOptions::default());
    assert_eq!(
        report.outcome.as_copy().unwrap().skipped_with(SkipReason::LocalPreserved),
        vec!["a"]
    );
    assert_eq!(
        fs::read_to_string(target.path.join("a/SKILL.md")).unwrap(),
        "# hand written\n"
    );

    let report = sync(&source, &target, SyncOptions::default().with_force(true));
    assert_eq!(report.outcome.as_copy().unwrap().updated, vec!["a"]);
    assert_eq!(fs::read_to_string(target.path.join("a/SKILL.md")).unwrap(), "# a\n");
}

#[test]
fn failing_skill_does_not_stop_the_others() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("source");
    // Each segment fits on disk, but the joined flat name is too long to copy to.
    let long_rel = format!("{}/{}", "a".repeat(200), "b".repeat(200));
    let long_flat = format!("{}__{}", "a".repeat(200), "b".repeat(200));
    add_skill(&source, &long_rel, "# long\n");
    add_skill(&source, "pdf", "# pdf\n");
    let target = Target::new("cursor", temp.path().join("cursor"), SyncMode::Copy);

    let report = sync(&source, &target, SyncOptions::default());
    let copy = report.outcome.as_copy().unwrap();
    assert_eq!(copy.copied, vec!["pdf"]);
    assert_eq!(copy.skipped_with(SkipReason::Failed), vec![long_flat.as_str()]);
    assert!(copy.warnings.iter().any(|w| w.starts_with(&long_flat)));
    assert_eq!(
        fs::read_to_string(target.path.join("pdf/SKILL.md")).unwrap(),
        "# pdf\n"
    );

    let manifest = Manifest::load(&target.path).unwrap();
    assert!(manifest.is_managed("pdf"));
    assert!(!manifest.is_managed(&long_flat));
}

#[test]
fn corrupt_manifest_leaves_copies_local_until_forced() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("source");
    add_skill(&source, "pdf", "# pdf\n");
    let target = Target::new("cursor", temp.path().join("cursor"), SyncMode::Copy);
    sync(&source, &target, SyncOptions::default());

    fs::write(Manifest::path_in(&target.path), "{ not json").unwrap();
    let report = sync(&source, &target, SyncOptions::default());
    let copy = report.outcome.as_copy().unwrap();
    assert_eq!(copy.skipped_with(SkipReason::LocalPreserved), vec!["pdf"]);
    assert!(report.pruned.removed.is_empty());
    assert!(target.path.join("pdf/SKILL.md").is_file());

    let report = sync(&source, &target, SyncOptions::default().with_force(true));
    assert_eq!(report.outcome.as_copy().unwrap().updated, vec!["pdf"]);
    assert!(Manifest::load(&target.path).unwrap().is_managed("pdf"));
}
