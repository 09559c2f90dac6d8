use std::collections::HashSet;
use std::fs;

use skillsync_core::diagnostics::find_flat_name_collisions;
use skillsync_core::skills::{discover_skills, flat_name};
use tempfile::TempDir;

#[test]
fn discovered_flat_names_are_unique_without_separator_in_segments() {
    let temp = TempDir::new().unwrap();
    let source = temp.path();
    for rel in ["a", "group/a", "group/b", "_repo/tools/c", "deep/er/still"] {
        let dir = source.join(rel);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("SKILL.md"), "# skill\n").unwrap();
    }

    let skills = discover_skills(source).unwrap();
    let names: HashSet<&str> = skills.iter().map(|s| s.flat_name.as_str()).collect();
    assert_eq!(names.len(), skills.len());
    assert!(names.contains("group__a"));
    assert!(names.contains("_repo__tools__c"));
    assert!(find_flat_name_collisions(&skills).is_empty());

    let repo = skills.iter().find(|s| s.rel_path == "_repo/tools/c").unwrap();
    assert!(repo.in_tracked_repo);
}

#[test]
fn separator_inside_a_segment_collides() {
    let temp = TempDir::new().unwrap();
    let source = temp.path();
    for rel in ["x__y", "x/y"] {
        let dir = source.join(rel);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("SKILL.md"), "# skill\n").unwrap();
    }

    assert_eq!(flat_name("x/y"), "x__y");
    let skills = discover_skills(source).unwrap();
    let collisions = find_flat_name_collisions(&skills);
    assert_eq!(collisions.len(), 1);
    assert_eq!(collisions[0].flat_name, "x__y");
    assert_eq!(collisions[0].source_paths.len(), 2);
}
