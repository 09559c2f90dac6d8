//! skillsync - keep agent skill directories in step with one source tree
//!
//! Usage:
//!   skillsync init          # Write a config for the detected tools
//!   skillsync sync          # Reconcile every configured target
//!   skillsync status        # Show per-target state and drift
//!   skillsync diff          # Preview what sync would change
//!   skillsync doctor        # Run health checks

mod doctor;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use skillsync_core::config::{
    ConfigStore, GlobalConfig, ProjectConfig, ProjectTargetEntry, TargetEntry, TargetRegistry,
};
use skillsync_core::context::{AppContext, SyncSetup};
use skillsync_core::diagnostics::{
    DriftReport, drift_from, find_flat_name_collisions, find_local_skills,
    find_name_collisions_for_targets,
};
use skillsync_core::diff::{DiffAction, TargetDiff};
use skillsync_core::skills::{Skill, SourceScan, read_install_meta};
use skillsync_core::sync::{
    SkipReason, SyncEngine, SyncOptions, SyncOutcome, SyncRunReport, TargetInspection,
    TargetSyncReport,
};
use skillsync_core::types::{ConfigScope, SyncMode, Target, TargetStatus};

#[derive(Parser)]
#[command(name = "skillsync")]
#[command(about = "Sync one skills directory into many AI tools", long_about = None)]
struct Cli {
    /// Use the project config in ./.skillsync
    #[arg(short, long, global = true, conflicts_with = "global")]
    project: bool,

    /// Use the global config even inside a project
    #[arg(short, long, global = true)]
    global: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a config file
    Init {
        /// Source directory holding the skills
        #[arg(long)]
        source: Option<String>,

        /// Default sync mode (symlink, merge, copy)
        #[arg(long)]
        mode: Option<String>,

        /// Targets to add; defaults to every detected tool
        #[arg(long = "target", value_name = "NAME")]
        targets: Vec<String>,

        /// Overwrite an existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Reconcile targets with the source
    Sync {
        /// Targets to sync (default: all)
        targets: Vec<String>,

        /// Show what would change without touching anything
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Replace foreign links and local directories
        #[arg(short, long)]
        force: bool,

        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show source and target state
    Status {
        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },

    /// Preview what sync would change, without touching anything
    Diff {
        /// Targets to compare (default: all)
        targets: Vec<String>,

        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },

    /// Check the setup for problems
    Doctor,

    /// List skills in the source
    #[command(alias = "ls")]
    List {
        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },

    /// List known targets
    Targets,
}

#[derive(Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
}

fn main() -> Result<()> {
    // Logs go to stderr so table and JSON output stay clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skillsync=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let scope = scope_flag(cli.project, cli.global);

    let ctx = AppContext::from_env(scope)?;
    let ok = run(&ctx, cli.command)?;
    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

fn scope_flag(project: bool, global: bool) -> Option<ConfigScope> {
    if project {
        Some(ConfigScope::Project)
    } else if global {
        Some(ConfigScope::Global)
    } else {
        None
    }
}

/// Returns false when the command should exit non-zero.
fn run(ctx: &AppContext, command: Commands) -> Result<bool> {
    match command {
        Commands::Init {
            source,
            mode,
            targets,
            force,
        } => {
            run_init(ctx, source, mode, targets, force)?;
            Ok(true)
        }
        Commands::Sync {
            targets,
            dry_run,
            force,
            format,
        } => run_sync(ctx, &targets, dry_run, force, format),
        Commands::Status { format } => {
            run_status(ctx, format)?;
            Ok(true)
        }
        Commands::Diff { targets, format } => run_diff(ctx, &targets, format),
        Commands::Doctor => doctor::run(ctx),
        Commands::List { format } => {
            run_list(ctx, format)?;
            Ok(true)
        }
        Commands::Targets => {
            print_known_targets();
            Ok(true)
        }
    }
}

// =============================================================================
// init
// =============================================================================

fn run_init(
    ctx: &AppContext,
    source: Option<String>,
    mode: Option<String>,
    targets: Vec<String>,
    force: bool,
) -> Result<()> {
    let mode = mode.map(|m| m.parse::<SyncMode>()).transpose()?;
    let store = ctx.config_store();
    if store.exists() && !force {
        anyhow::bail!(
            "Config already exists at {} (use --force to overwrite)",
            store.config_path().display()
        );
    }

    let registry = TargetRegistry::builtin();
    for name in &targets {
        if !registry.contains(name) {
            anyhow::bail!(
                "Unknown target '{}'. Run 'skillsync targets' to see known targets",
                name
            );
        }
    }

    let added = match ctx.scope() {
        ConfigScope::Global => init_global(ctx, &store, source, mode, targets)?,
        ConfigScope::Project => {
            if source.is_some() {
                tracing::warn!("--source is ignored for project configs");
            }
            init_project(&store, mode, targets)?
        }
    };

    let setup = ctx.load_setup()?;
    std::fs::create_dir_all(&setup.source).with_context(|| {
        format!("Failed to create source directory: {}", setup.source.display())
    })?;

    println!(
        "{} Wrote {} config: {}",
        style("✓").green(),
        ctx.scope().as_str(),
        store.config_path().display()
    );
    println!("  Source: {}", setup.source.display());
    if added.is_empty() {
        println!("  No targets added. Edit the config or pass --target.");
    } else {
        println!("  Targets: {}", added.join(", "));
    }
    Ok(())
}

fn init_global(
    ctx: &AppContext,
    store: &ConfigStore,
    source: Option<String>,
    mode: Option<SyncMode>,
    targets: Vec<String>,
) -> Result<Vec<String>> {
    let names = if targets.is_empty() {
        TargetRegistry::builtin()
            .detect_installed(ctx.home_dir())
            .into_iter()
            .map(|t| t.name.clone())
            .collect()
    } else {
        targets
    };

    let config = GlobalConfig {
        source,
        mode,
        targets: names
            .iter()
            .map(|name| (name.clone(), TargetEntry::default()))
            .collect(),
    };
    store.save_global(&config)?;
    Ok(names)
}

fn init_project(
    store: &ConfigStore,
    mode: Option<SyncMode>,
    targets: Vec<String>,
) -> Result<Vec<String>> {
    let config = ProjectConfig {
        mode,
        targets: targets
            .iter()
            .cloned()
            .map(ProjectTargetEntry::Name)
            .collect(),
    };
    store.save_project(&config)?;
    Ok(targets)
}

// =============================================================================
// sync
// =============================================================================

fn run_sync(
    ctx: &AppContext,
    names: &[String],
    dry_run: bool,
    force: bool,
    format: OutputFormat,
) -> Result<bool> {
    let setup = ctx.load_setup()?;
    let targets = setup.select(names)?;
    if targets.is_empty() {
        println!("No targets configured. Run 'skillsync init' first.");
        return Ok(true);
    }

    let skills = setup.discover()?;
    report_collisions(&skills, &targets);

    let options = SyncOptions { dry_run, force };
    let engine = SyncEngine::new(&setup.source, &skills);
    let report = engine.sync_all(&targets, options);

    match format {
        OutputFormat::Table => print_sync_table(&report, dry_run),
        OutputFormat::Json => print_sync_json(&report)?,
    }
    Ok(report.is_success())
}

fn report_collisions(skills: &[Skill], targets: &[Target]) {
    for collision in find_flat_name_collisions(skills) {
        let paths: Vec<String> = collision
            .source_paths
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        eprintln!(
            "{} '{}' is produced by several skills: {}",
            style("warning:").yellow(),
            collision.flat_name,
            paths.join(", ")
        );
    }

    let (global, per_target) = find_name_collisions_for_targets(skills, targets);
    for target in &per_target {
        for collision in &target.collisions {
            eprintln!(
                "{} {}: skill name '{}' declared by {}",
                style("warning:").yellow(),
                target.target,
                collision.name,
                collision.rel_paths.join(", ")
            );
        }
    }
    if !global.is_empty() && per_target.is_empty() {
        for collision in &global {
            eprintln!(
                "{} skill name '{}' declared by {}",
                style("note:").dim(),
                collision.name,
                collision.rel_paths.join(", ")
            );
        }
    }
}

fn print_sync_table(report: &SyncRunReport, dry_run: bool) {
    if dry_run {
        println!("{}", style("Dry run: no changes made").dim());
    }

    for run in &report.targets {
        match &run.result {
            Ok(target) => print_target_report(target),
            Err(err) => println!("{} {}: {}", style("✗").red(), run.name, err),
        }
    }

    let failed = report.failed().count();
    let total = report.targets.len();
    println!();
    if failed > 0 {
        println!(
            "Summary: {} of {} targets failed",
            style(failed).red(),
            total
        );
    } else {
        println!("Summary: {} targets, all OK", total);
    }
}

fn print_target_report(report: &TargetSyncReport) {
    let marker = if report.changed() {
        style("✓").green()
    } else {
        style("=").dim()
    };
    println!(
        "{} {} ({}) {}",
        marker,
        style(&report.name).bold(),
        report.mode(),
        report.path.display()
    );

    match &report.outcome {
        SyncOutcome::Symlink { action } => println!("    {}", action.describe()),
        SyncOutcome::Merge(result) => {
            print_names("linked", &result.linked);
            print_names("updated", &result.updated);
            print_skips(&result.skipped_with(SkipReason::LocalPreserved), "local, kept");
            print_skips(&result.skipped_with(SkipReason::ForeignLink), "foreign link, kept");
            print_skips(&result.skipped_with(SkipReason::Failed), "failed");
            println!(
                "    {} up to date",
                result.skipped_with(SkipReason::UpToDate).len()
            );
        }
        SyncOutcome::Copy(result) => {
            print_names("copied", &result.copied);
            print_names("updated", &result.updated);
            print_skips(&result.skipped_with(SkipReason::LocalPreserved), "local, kept");
            print_skips(&result.skipped_with(SkipReason::ForeignLink), "foreign link, kept");
            print_skips(&result.skipped_with(SkipReason::Failed), "failed");
            println!(
                "    {} up to date",
                result.skipped_with(SkipReason::UpToDate).len()
            );
        }
    }

    print_names("pruned", &report.pruned.removed);
    if let Some(backup) = &report.backup {
        println!("    backup: {}", backup.display());
    }
    for warning in report
        .warnings
        .iter()
        .chain(report.outcome.warnings())
        .chain(&report.pruned.warnings)
    {
        println!("    {} {}", style("!").yellow(), warning);
    }
}

fn print_names(label: &str, names: &[String]) {
    if !names.is_empty() {
        println!("    {}: {}", label, names.join(", "));
    }
}

fn print_skips(names: &[&str], label: &str) {
    if !names.is_empty() {
        println!("    {} ({}): {}", style("skipped").yellow(), label, names.join(", "));
    }
}

fn print_sync_json(report: &SyncRunReport) -> Result<()> {
    let targets: Vec<serde_json::Value> = report
        .targets
        .iter()
        .map(|run| match &run.result {
            Ok(target) => serde_json::json!({ "name": run.name, "ok": true, "report": target }),
            Err(err) => serde_json::json!({ "name": run.name, "ok": false, "error": err.to_string() }),
        })
        .collect();
    let output = serde_json::json!({
        "schema_version": 1,
        "success": report.is_success(),
        "targets": targets,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

// =============================================================================
// status
// =============================================================================

struct StatusRow<'a> {
    target: &'a Target,
    state: Result<TargetState, String>,
}

struct TargetState {
    inspection: TargetInspection,
    local: usize,
    drift: Option<DriftReport>,
}

fn run_status(ctx: &AppContext, format: OutputFormat) -> Result<()> {
    let setup = ctx.load_setup()?;
    let scan = setup.scan()?;
    let engine = SyncEngine::new(&setup.source, scan.skills());

    let rows: Vec<StatusRow> = setup
        .targets
        .iter()
        .map(|target| StatusRow {
            target,
            state: inspect_row(&engine, target).map_err(|e| e.to_string()),
        })
        .collect();

    match format {
        OutputFormat::Json => print_status_json(ctx, &setup, &scan, &rows)?,
        OutputFormat::Table => print_status_table(ctx, &setup, &scan, &rows),
    }
    Ok(())
}

fn inspect_row(engine: &SyncEngine, target: &Target) -> skillsync_core::error::Result<TargetState> {
    let inspection = engine.inspect(target)?;
    let expected = engine.selected_skills(target)?.len();
    let local = match target.mode {
        SyncMode::Symlink => 0,
        SyncMode::Merge | SyncMode::Copy => find_local_skills(&target.path)?.len(),
    };
    Ok(TargetState {
        drift: drift_from(target, expected, &inspection),
        inspection,
        local,
    })
}

fn print_status_json(
    ctx: &AppContext,
    setup: &SyncSetup,
    scan: &SourceScan,
    rows: &[StatusRow],
) -> Result<()> {
    let targets: Vec<serde_json::Value> = rows
        .iter()
        .map(|row| {
            let mut value = serde_json::json!({
                "name": row.target.name,
                "path": row.target.path,
                "mode": row.target.mode,
            });
            match &row.state {
                Ok(state) => {
                    value["status"] = serde_json::json!(state.inspection.status);
                    value["linked"] = serde_json::json!(state.inspection.linked);
                    value["managed"] = serde_json::json!(state.inspection.managed);
                    value["local"] = serde_json::json!(state.local);
                    value["mode_drift"] = serde_json::json!(state.inspection.mode_drift());
                    value["drift"] = serde_json::json!(state.drift);
                }
                Err(err) => value["error"] = serde_json::json!(err),
            }
            value
        })
        .collect();

    let mut output = serde_json::json!({
        "schema_version": 1,
        "scope": ctx.scope(),
        "config": setup.config_path,
        "source": setup.source,
        "skills": scan.count(),
        "targets": targets,
    });
    if let SourceScan::Coarse { dirs, error } = scan {
        output["source_dirs"] = serde_json::json!(dirs);
        output["source_error"] = serde_json::json!(error.to_string());
    }
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_status_table(ctx: &AppContext, setup: &SyncSetup, scan: &SourceScan, rows: &[StatusRow]) {
    println!("Scope: {}", ctx.scope().as_str());
    println!("Config: {}", setup.config_path.display());
    match scan {
        SourceScan::Skills(skills) => {
            println!("Source: {} ({} skills)", setup.source.display(), skills.len())
        }
        SourceScan::Coarse { dirs, error } => {
            println!("Source: {} ({} directories)", setup.source.display(), dirs.len());
            println!("  {} skill discovery failed: {}", style("!").yellow(), error);
        }
    }
    println!();

    if rows.is_empty() {
        println!("No targets configured.");
        return;
    }

    println!(
        "  {:<12} {:<8} {:<10} {:<28} Path",
        "Target", "Mode", "Status", "Detail"
    );
    println!("  {}", "-".repeat(84));

    for row in rows {
        let target = row.target;
        let (status, detail) = match &row.state {
            Ok(state) => (state.inspection.status.to_string(), status_detail(target, state)),
            Err(err) => ("error".to_string(), err.clone()),
        };
        println!(
            "  {:<12} {:<8} {:<10} {:<28} {}",
            truncate(&target.name, 12),
            target.mode.as_str(),
            status,
            truncate(&detail, 28),
            target.path.display()
        );
    }
}

fn status_detail(target: &Target, state: &TargetState) -> String {
    if let Some(observed) = state.inspection.mode_drift() {
        return format!("looks {}, mode is {}", observed, target.mode);
    }
    let mut detail = match target.mode {
        SyncMode::Symlink => String::new(),
        SyncMode::Merge => format!("{} linked, {} local", state.inspection.linked, state.local),
        SyncMode::Copy => format!("{} managed, {} local", state.inspection.managed, state.local),
    };
    if let Some(drift) = &state.drift {
        detail.push_str(&format!(", {} missing", drift.missing()));
    }
    detail
}

// =============================================================================
// diff
// =============================================================================

fn run_diff(ctx: &AppContext, names: &[String], format: OutputFormat) -> Result<bool> {
    let setup = ctx.load_setup()?;
    let targets = setup.select(names)?;
    if targets.is_empty() {
        println!("No targets configured. Run 'skillsync init' first.");
        return Ok(true);
    }

    let scan = setup.scan()?;
    if let SourceScan::Coarse { error, .. } = &scan {
        anyhow::bail!("Cannot diff without a full skill list: {}", error);
    }
    let engine = SyncEngine::new(&setup.source, scan.skills());

    let mut ordered: Vec<&Target> = targets.iter().collect();
    ordered.sort_by(|a, b| a.name.cmp(&b.name));
    let diffs: Vec<(&Target, Result<TargetDiff, String>)> = ordered
        .into_iter()
        .map(|target| (target, engine.diff(target).map_err(|e| e.to_string())))
        .collect();

    match format {
        OutputFormat::Json => print_diff_json(&diffs)?,
        OutputFormat::Table => print_diff_table(&diffs),
    }
    Ok(diffs.iter().all(|(_, diff)| diff.is_ok()))
}

fn print_diff_json(diffs: &[(&Target, Result<TargetDiff, String>)]) -> Result<()> {
    let targets: Vec<serde_json::Value> = diffs
        .iter()
        .map(|(target, diff)| match diff {
            Ok(diff) => serde_json::json!({ "name": target.name, "ok": true, "diff": diff }),
            Err(err) => serde_json::json!({ "name": target.name, "ok": false, "error": err }),
        })
        .collect();
    let output = serde_json::json!({
        "schema_version": 1,
        "targets": targets,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_diff_table(diffs: &[(&Target, Result<TargetDiff, String>)]) {
    let mut pending = 0;
    for (target, diff) in diffs {
        let diff = match diff {
            Ok(diff) => diff,
            Err(err) => {
                println!("{} {}: {}", style("✗").red(), target.name, err);
                continue;
            }
        };
        pending += diff.pending();

        let marker = if diff.is_clean() {
            style("=").dim()
        } else {
            style("~").yellow()
        };
        println!(
            "{} {} ({}) {}",
            marker,
            style(&target.name).bold(),
            diff.mode,
            diff.status
        );
        if diff.mode != SyncMode::Symlink && diff.status == TargetStatus::Linked {
            println!("    whole-directory link, sync converts it to per-skill entries");
        }
        for item in &diff.items {
            let symbol = match item.action {
                DiffAction::Add => style(item.action.symbol()).green(),
                DiffAction::Update => style(item.action.symbol()).cyan(),
                DiffAction::Replace => style(item.action.symbol()).red(),
                DiffAction::Prune => style(item.action.symbol()).magenta(),
                DiffAction::LocalOnly => style(item.action.symbol()).dim(),
            };
            println!("    {} {:<28} {}", symbol, truncate(&item.name, 28), item.reason);
        }
        if diff.mode != SyncMode::Symlink {
            println!("    {} in sync", diff.in_sync);
        }
    }

    println!();
    if pending == 0 {
        println!("Nothing to sync.");
    } else {
        println!("{} change(s) pending. Run 'skillsync sync' to apply.", pending);
    }
}

// =============================================================================
// list / targets
// =============================================================================

fn run_list(ctx: &AppContext, format: OutputFormat) -> Result<()> {
    let setup = ctx.load_setup()?;
    let skills = setup.discover()?;

    match format {
        OutputFormat::Json => {
            let entries: Vec<serde_json::Value> = skills
                .iter()
                .map(|skill| {
                    serde_json::json!({
                        "skill": skill,
                        "install": read_install_meta(&skill.source_path),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        OutputFormat::Table => {
            if skills.is_empty() {
                println!("No skills in {}", setup.source.display());
                return Ok(());
            }
            println!("Skills ({}):", skills.len());
            println!(
                "  {:<28} {:<28} {:<14} Installed from",
                "Name", "Path", "Targets"
            );
            println!("  {}", "-".repeat(90));
            for skill in &skills {
                let targets = skill
                    .targets
                    .as_ref()
                    .filter(|t| !t.is_empty())
                    .map(|t| t.join(","))
                    .unwrap_or_else(|| "all".to_string());
                let origin = read_install_meta(&skill.source_path)
                    .map(|meta| match meta.version {
                        Some(version) => format!("{}@{}", meta.source, version),
                        None => meta.source,
                    })
                    .unwrap_or_else(|| "-".to_string());
                let repo = if skill.in_tracked_repo { " (repo)" } else { "" };
                println!(
                    "  {:<28} {:<28} {:<14} {}{}",
                    truncate(&skill.flat_name, 28),
                    truncate(&skill.rel_path, 28),
                    truncate(&targets, 14),
                    origin,
                    repo
                );
            }
        }
    }
    Ok(())
}

fn print_known_targets() {
    println!("  {:<10} {:<32} Project path", "Name", "Global path");
    println!("  {}", "-".repeat(70));
    for target in TargetRegistry::builtin().all() {
        println!(
            "  {:<10} {:<32} {}",
            target.name,
            target.global_path.as_deref().unwrap_or("-"),
            target.project_path.as_deref().unwrap_or("-")
        );
        if !target.aliases.is_empty() {
            println!("  {:<10} {}", "", style(format!("aka {}", target.aliases.join(", "))).dim());
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_with_flags_parses() {
        let cli = Cli::try_parse_from(["skillsync", "sync", "claude", "codex", "-n", "-f"]).unwrap();
        match cli.command {
            Commands::Sync {
                targets,
                dry_run,
                force,
                format,
            } => {
                assert_eq!(targets, vec!["claude", "codex"]);
                assert!(dry_run);
                assert!(force);
                assert!(format == OutputFormat::Table);
            }
            _ => panic!("expected sync"),
        }
    }

    #[test]
    fn status_json_parses() {
        let cli = Cli::try_parse_from(["skillsync", "status", "--format", "json"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Status {
                format: OutputFormat::Json
            }
        ));
    }

    #[test]
    fn scope_flags_are_global() {
        let cli = Cli::try_parse_from(["skillsync", "doctor", "-p"]).unwrap();
        assert!(cli.project);
        assert_eq!(scope_flag(cli.project, cli.global), Some(ConfigScope::Project));

        let cli = Cli::try_parse_from(["skillsync", "-g", "list"]).unwrap();
        assert_eq!(scope_flag(cli.project, cli.global), Some(ConfigScope::Global));
    }

    #[test]
    fn project_and_global_conflict() {
        assert!(Cli::try_parse_from(["skillsync", "status", "-p", "-g"]).is_err());
    }

    #[test]
    fn init_with_targets_parses() {
        let cli = Cli::try_parse_from([
            "skillsync",
            "init",
            "--mode",
            "copy",
            "--target",
            "claude",
            "--target",
            "cursor",
        ])
        .unwrap();
        match cli.command {
            Commands::Init { mode, targets, .. } => {
                assert_eq!(mode.as_deref(), Some("copy"));
                assert_eq!(targets, vec!["claude", "cursor"]);
            }
            _ => panic!("expected init"),
        }
    }

    #[test]
    fn diff_parses_targets_and_format() {
        let cli =
            Cli::try_parse_from(["skillsync", "diff", "cursor", "--format", "json"]).unwrap();
        match cli.command {
            Commands::Diff { targets, format } => {
                assert_eq!(targets, vec!["cursor"]);
                assert!(format == OutputFormat::Json);
            }
            _ => panic!("expected diff"),
        }

        let cli = Cli::try_parse_from(["skillsync", "diff"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Diff { ref targets, format: OutputFormat::Table } if targets.is_empty()
        ));
    }

    #[test]
    fn list_alias_parses() {
        let cli = Cli::try_parse_from(["skillsync", "ls"]).unwrap();
        assert!(matches!(cli.command, Commands::List { .. }));
    }

    #[test]
    fn truncate_long_names() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a-very-long-name", 10), "a-very-...");
    }
}
