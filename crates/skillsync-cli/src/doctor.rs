//! Health checks behind `skillsync doctor`.

use std::path::Path;

use anyhow::Result;
use console::style;

use skillsync_core::context::{AppContext, SyncSetup};
use skillsync_core::diagnostics::{
    check_writable, drift_from, find_broken_links, find_dirs_without_marker, find_duplicate_skills,
    find_flat_name_collisions, find_name_collisions_for_targets, find_unknown_skill_targets,
};
use skillsync_core::fs::{create_link, remove_path};
use skillsync_core::git::{SourceGitState, source_git_state};
use skillsync_core::skills::{Skill, SourceScan, scan_source};
use skillsync_core::sync::SyncEngine;
use skillsync_core::types::{SyncMode, Target, TargetStatus};

#[derive(Default)]
struct Checkup {
    errors: usize,
    warnings: usize,
}

impl Checkup {
    fn ok(&self, msg: impl AsRef<str>) {
        println!("  {} {}", style("✓").green(), msg.as_ref());
    }

    fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings += 1;
        println!("  {} {}", style("!").yellow(), msg.as_ref());
    }

    fn error(&mut self, msg: impl AsRef<str>) {
        self.errors += 1;
        println!("  {} {}", style("✗").red(), msg.as_ref());
    }

    fn section(&self, title: &str) {
        println!();
        println!("{}", style(title).bold());
    }
}

/// Returns false when any check failed outright.
pub fn run(ctx: &AppContext) -> Result<bool> {
    let mut check = Checkup::default();
    let setup = ctx.load_setup()?;

    println!("{}", style("skillsync doctor").bold().cyan());
    check.section("Config");
    if setup.config_exists {
        check.ok(format!("{} config: {}", ctx.scope().as_str(), setup.config_path.display()));
    } else {
        check.warn(format!(
            "No config at {} (run 'skillsync init')",
            setup.config_path.display()
        ));
    }

    check.section("Source");
    let skills = check_source(&mut check, &setup);
    check_link_support(&mut check);

    check.section("Targets");
    if setup.targets.is_empty() {
        check.warn("No targets configured");
    }
    let engine = SyncEngine::new(&setup.source, &skills);
    for target in &setup.targets {
        check_target(&mut check, &engine, target);
    }

    check.section("Skills");
    check_skills(&mut check, &setup, &skills);

    println!();
    if check.errors > 0 {
        println!(
            "Summary: {} errors, {} warnings",
            style(check.errors).red(),
            check.warnings
        );
    } else if check.warnings > 0 {
        println!("Summary: no errors, {} warnings", style(check.warnings).yellow());
    } else {
        println!("Summary: all checks passed");
    }
    Ok(check.errors == 0)
}

fn check_source(check: &mut Checkup, setup: &SyncSetup) -> Vec<Skill> {
    let skills = match scan_source(&setup.source) {
        Ok(SourceScan::Skills(skills)) => {
            check.ok(format!(
                "{} ({} skills)",
                setup.source.display(),
                skills.len()
            ));
            skills
        }
        Ok(SourceScan::Coarse { dirs, error }) => {
            check.warn(format!(
                "skill discovery failed ({}); {} top-level directories: {}",
                error,
                dirs.len(),
                dirs.join(", ")
            ));
            Vec::new()
        }
        Err(err) => {
            check.error(err.to_string());
            return Vec::new();
        }
    };

    match source_git_state(&setup.source) {
        Ok(SourceGitState::NotRepository) => check.ok("not a git repository"),
        Ok(SourceGitState::Dirty { changes }) => {
            check.warn(format!("git: {} uncommitted changes", changes))
        }
        Ok(SourceGitState::Clean { has_remote: true }) => check.ok("git: clean"),
        Ok(SourceGitState::Clean { has_remote: false }) => {
            check.warn("git: clean, but no remote configured")
        }
        Err(err) => check.warn(format!("git: {:#}", err)),
    }
    skills
}

fn check_link_support(check: &mut Checkup) {
    let base = std::env::temp_dir();
    let scratch = base.join(format!(".skillsync-link-test-{}", std::process::id()));
    match create_link(&base, &scratch) {
        Ok(()) => {
            let _ = remove_path(&scratch);
            check.ok("symlinks supported");
        }
        Err(err) => check.error(format!(
            "cannot create symlinks ({}); symlink and merge targets will fail",
            err
        )),
    }
}

fn check_target(check: &mut Checkup, engine: &SyncEngine, target: &Target) {
    let label = format!("{} ({})", target.name, target.mode);
    let inspection = match engine.inspect(target) {
        Ok(inspection) => inspection,
        Err(err) => {
            check.error(format!("{}: {}", label, err));
            return;
        }
    };

    match inspection.status {
        TargetStatus::NotExist => {
            let parent_exists = target.path.parent().map(Path::is_dir).unwrap_or(false);
            if parent_exists {
                check.ok(format!("{}: not synced yet", label));
            } else {
                check.warn(format!(
                    "{}: parent directory missing: {}",
                    label,
                    target.path.display()
                ));
            }
        }
        TargetStatus::Conflict => check.error(format!(
            "{}: links somewhere other than the source (sync --force to replace)",
            label
        )),
        TargetStatus::Broken => check.warn(format!("{}: broken link, sync will fix it", label)),
        status => {
            if let Some(observed) = inspection.mode_drift() {
                check.warn(format!("{}: looks {}, run sync to convert", label, observed));
            } else {
                check.ok(format!("{}: {}", label, status));
            }
        }
    }

    if target.mode == SyncMode::Symlink && target.has_filters() {
        check.warn(format!("{}: include/exclude are ignored in symlink mode", label));
    }

    if target.path.is_dir()
        && let Err(err) = check_writable(&target.path)
    {
        check.error(format!("{}: {}", label, err));
    }

    match engine.selected_skills(target) {
        Ok(selected) => {
            if let Some(drift) = drift_from(target, selected.len(), &inspection) {
                check.warn(format!(
                    "{}: {} of {} skills synced ({} missing)",
                    label,
                    drift.actual,
                    drift.expected,
                    drift.missing()
                ));
            }
        }
        Err(err) => check.error(format!("{}: {}", label, err)),
    }

    if target.mode != SyncMode::Symlink && inspection.status != TargetStatus::Linked {
        let broken = find_broken_links(&target.path);
        if !broken.is_empty() {
            check.warn(format!("{}: broken links: {}", label, broken.join(", ")));
        }
    }
}

fn check_skills(check: &mut Checkup, setup: &SyncSetup, skills: &[Skill]) {
    let before = (check.errors, check.warnings);
    let without_marker = find_dirs_without_marker(&setup.source, skills);
    if !without_marker.is_empty() {
        check.warn(format!(
            "directories without SKILL.md: {}",
            without_marker.join(", ")
        ));
    }

    for unknown in find_unknown_skill_targets(skills, &setup.valid_target_names()) {
        check.warn(format!(
            "{}: unknown target '{}' in targets field",
            unknown.skill, unknown.target
        ));
    }

    for collision in find_flat_name_collisions(skills) {
        check.error(format!(
            "'{}' is produced by {} skills",
            collision.flat_name,
            collision.source_paths.len()
        ));
    }

    let (global, per_target) = find_name_collisions_for_targets(skills, &setup.targets);
    for target in &per_target {
        for collision in &target.collisions {
            check.warn(format!(
                "{}: name '{}' declared by {}",
                target.target,
                collision.name,
                collision.rel_paths.join(", ")
            ));
        }
    }
    for collision in &global {
        check.warn(format!(
            "name '{}' declared by {}",
            collision.name,
            collision.rel_paths.join(", ")
        ));
    }

    let names: Vec<String> = skills.iter().map(|s| s.flat_name.clone()).collect();
    for duplicate in find_duplicate_skills(&names, &setup.targets) {
        check.warn(format!(
            "'{}' exists in {}",
            duplicate.name,
            duplicate.locations.join(" and ")
        ));
    }

    if (check.errors, check.warnings) == before {
        check.ok("no problems found");
    }
}
