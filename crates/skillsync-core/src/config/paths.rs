//! Config path resolution helpers.

use std::path::{Path, PathBuf};

use crate::types::ConfigScope;

pub const APP_DIR: &str = "skillsync";
pub const CONFIG_FILE: &str = "config.yaml";
pub const PROJECT_DIR: &str = ".skillsync";
pub const SOURCE_DIR: &str = "skills";

/// `$XDG_CONFIG_HOME/skillsync` when set, otherwise `~/.config/skillsync`.
pub fn global_config_dir(home: &Path, xdg_config_home: Option<&Path>) -> PathBuf {
    match xdg_config_home {
        Some(xdg) if !xdg.as_os_str().is_empty() => xdg.join(APP_DIR),
        _ => home.join(".config").join(APP_DIR),
    }
}

pub fn project_config_dir(project_root: &Path) -> PathBuf {
    project_root.join(PROJECT_DIR)
}

pub fn config_path_for_scope(
    scope: ConfigScope,
    global_dir: &Path,
    project_root: &Path,
) -> PathBuf {
    match scope {
        ConfigScope::Global => global_dir.join(CONFIG_FILE),
        ConfigScope::Project => project_config_dir(project_root).join(CONFIG_FILE),
    }
}

pub fn default_source_dir(scope: ConfigScope, global_dir: &Path, project_root: &Path) -> PathBuf {
    match scope {
        ConfigScope::Global => global_dir.join(SOURCE_DIR),
        ConfigScope::Project => project_config_dir(project_root).join(SOURCE_DIR),
    }
}

/// Expand a leading `~` to `home`.
pub fn expand_tilde(raw: &str, home: &Path) -> PathBuf {
    if raw == "~" {
        return home.to_path_buf();
    }
    match raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\")) {
        Some(rest) => home.join(rest),
        None => PathBuf::from(raw),
    }
}

/// Expand `~`, then anchor relative paths at `base`.
pub fn resolve_config_path(raw: &str, home: &Path, base: &Path) -> PathBuf {
    let expanded = expand_tilde(raw.trim(), home);
    if expanded.is_absolute() {
        expanded
    } else {
        base.join(expanded)
    }
}
