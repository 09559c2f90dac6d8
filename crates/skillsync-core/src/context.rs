//! Application context shared by frontends.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::config::paths::{
    self, default_source_dir, global_config_dir, project_config_dir, resolve_config_path,
};
use crate::config::{ConfigStore, TargetRegistry};
use crate::error::SyncError;
use crate::skills::{Skill, SourceScan, discover_skills, scan_source};
use crate::types::{ConfigScope, Target};

/// Environment variable naming an explicit global config file.
pub const CONFIG_ENV: &str = "SKILLSYNC_CONFIG";

/// Paths and scope a command runs against.
///
/// Frontends create this once and pass it to commands.
#[derive(Debug, Clone)]
pub struct AppContext {
    home_dir: PathBuf,
    project_root: PathBuf,
    global_config_dir: PathBuf,
    global_config_path: Option<PathBuf>,
    scope: ConfigScope,
}

impl AppContext {
    /// Create a new context with explicit paths.
    pub fn new(
        home_dir: PathBuf,
        project_root: PathBuf,
        global_config_dir: PathBuf,
        scope: ConfigScope,
    ) -> Self {
        Self {
            home_dir,
            project_root,
            global_config_dir,
            global_config_path: None,
            scope,
        }
    }

    /// Build from the process environment. Without an explicit scope, a
    /// working directory holding `.skillsync/config.yaml` selects project
    /// scope.
    pub fn from_env(scope: Option<ConfigScope>) -> anyhow::Result<Self> {
        let home_dir = dirs::home_dir().context("Could not determine home directory")?;
        let project_root = std::env::current_dir().context("Could not read current directory")?;
        let xdg = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from);
        let global_dir = global_config_dir(&home_dir, xdg.as_deref());
        let scope = scope.unwrap_or_else(|| Self::detect_scope(&project_root));

        let mut ctx = Self::new(home_dir, project_root, global_dir, scope);
        if let Some(explicit) = std::env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()) {
            ctx = ctx.with_global_config_path(PathBuf::from(explicit));
        }
        Ok(ctx)
    }

    pub fn detect_scope(project_root: &Path) -> ConfigScope {
        if project_config_dir(project_root)
            .join(paths::CONFIG_FILE)
            .is_file()
        {
            ConfigScope::Project
        } else {
            ConfigScope::Global
        }
    }

    pub fn with_global_config_path(mut self, path: PathBuf) -> Self {
        self.global_config_path = Some(path);
        self
    }

    pub fn with_scope(mut self, scope: ConfigScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn home_dir(&self) -> &Path {
        &self.home_dir
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn global_config_dir(&self) -> &Path {
        &self.global_config_dir
    }

    pub fn scope(&self) -> ConfigScope {
        self.scope
    }

    pub fn config_store(&self) -> ConfigStore {
        let store = ConfigStore::from_paths(
            self.scope,
            self.global_config_dir.clone(),
            self.project_root.clone(),
        );
        match (&self.global_config_path, self.scope) {
            (Some(path), ConfigScope::Global) => store.with_config_path(path.clone()),
            _ => store,
        }
    }

    /// Source tree used when the config names none.
    pub fn default_source_dir(&self) -> PathBuf {
        match (&self.global_config_path, self.scope) {
            (Some(path), ConfigScope::Global) => path
                .parent()
                .map(|dir| dir.join(paths::SOURCE_DIR))
                .unwrap_or_else(|| {
                    default_source_dir(self.scope, &self.global_config_dir, &self.project_root)
                }),
            _ => default_source_dir(self.scope, &self.global_config_dir, &self.project_root),
        }
    }

    /// Load and resolve the configuration of the current scope.
    pub fn load_setup(&self) -> anyhow::Result<SyncSetup> {
        let store = self.config_store();
        let registry = TargetRegistry::builtin();

        let (source, targets) = match self.scope {
            ConfigScope::Global => {
                let config = store.load_global()?;
                let source = config
                    .source
                    .as_deref()
                    .map(|raw| resolve_config_path(raw, &self.home_dir, &self.home_dir))
                    .unwrap_or_else(|| self.default_source_dir());
                (source, config.resolve_targets(&self.home_dir, registry)?)
            }
            ConfigScope::Project => {
                let config = store.load_project()?;
                let targets =
                    config.resolve_targets(&self.project_root, &self.home_dir, registry)?;
                (self.default_source_dir(), targets)
            }
        };

        Ok(SyncSetup {
            scope: self.scope,
            config_path: store.config_path().to_path_buf(),
            config_exists: store.exists(),
            source,
            targets,
        })
    }
}

/// Fully resolved configuration: a source tree and its targets.
#[derive(Debug, Clone)]
pub struct SyncSetup {
    pub scope: ConfigScope,
    pub config_path: PathBuf,
    pub config_exists: bool,
    pub source: PathBuf,
    pub targets: Vec<Target>,
}

impl SyncSetup {
    pub fn target(&self, name: &str) -> Result<&Target, SyncError> {
        self.targets
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| SyncError::UnknownTarget(name.to_string()))
    }

    /// The named targets, or all of them when `names` is empty.
    pub fn select(&self, names: &[String]) -> Result<Vec<Target>, SyncError> {
        if names.is_empty() {
            return Ok(self.targets.clone());
        }
        names
            .iter()
            .map(|name| self.target(name).cloned())
            .collect()
    }

    pub fn discover(&self) -> crate::error::Result<Vec<Skill>> {
        discover_skills(&self.source)
    }

    /// Best-effort view of the source for read-only commands. A source that
    /// does not exist yet scans as empty.
    pub fn scan(&self) -> crate::error::Result<SourceScan> {
        if !self.source.is_dir() {
            return Ok(SourceScan::Skills(Vec::new()));
        }
        scan_source(&self.source)
    }

    /// Configured target names plus every known target name and alias.
    pub fn valid_target_names(&self) -> HashSet<String> {
        self.targets
            .iter()
            .map(|t| t.name.clone())
            .chain(TargetRegistry::builtin().names().map(String::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GlobalConfig, TargetEntry};
    use crate::types::SyncMode;
    use tempfile::TempDir;

    fn context(tmp: &TempDir, scope: ConfigScope) -> AppContext {
        AppContext::new(
            tmp.path().join("home"),
            tmp.path().join("project"),
            tmp.path().join("home/.config/skillsync"),
            scope,
        )
    }

    #[test]
    fn test_detect_scope() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(AppContext::detect_scope(tmp.path()), ConfigScope::Global);
        std::fs::create_dir_all(tmp.path().join(".skillsync")).unwrap();
        std::fs::write(tmp.path().join(".skillsync/config.yaml"), "targets: []\n").unwrap();
        assert_eq!(AppContext::detect_scope(tmp.path()), ConfigScope::Project);
    }

    #[test]
    fn test_global_setup_defaults_source() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(&tmp, ConfigScope::Global);
        let mut config = GlobalConfig::default();
        config.targets.insert(
            "claude".into(),
            TargetEntry {
                mode: Some(SyncMode::Copy),
                ..Default::default()
            },
        );
        ctx.config_store().save_global(&config).unwrap();

        let setup = ctx.load_setup().unwrap();
        assert!(setup.config_exists);
        assert_eq!(setup.source, tmp.path().join("home/.config/skillsync/skills"));
        assert_eq!(
            setup.target("claude").unwrap().path,
            tmp.path().join("home/.claude/skills")
        );
        assert!(matches!(
            setup.select(&["nope".to_string()]),
            Err(SyncError::UnknownTarget(_))
        ));
    }

    #[test]
    fn test_project_setup_uses_project_source() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(&tmp, ConfigScope::Project);
        let setup = ctx.load_setup().unwrap();
        assert!(!setup.config_exists);
        assert_eq!(setup.source, tmp.path().join("project/.skillsync/skills"));
        assert!(setup.targets.is_empty());
    }

    #[test]
    fn test_scan_of_missing_source_is_empty() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(&tmp, ConfigScope::Project);
        let setup = ctx.load_setup().unwrap();
        assert_eq!(setup.scan().unwrap().count(), 0);
        assert!(setup.discover().is_err());

        std::fs::create_dir_all(setup.source.join("pdf")).unwrap();
        std::fs::write(setup.source.join("pdf/SKILL.md"), "# pdf").unwrap();
        assert_eq!(setup.scan().unwrap().count(), 1);
        assert_eq!(setup.discover().unwrap().len(), 1);
    }

    #[test]
    fn test_explicit_global_config_path() {
        let tmp = TempDir::new().unwrap();
        let explicit = tmp.path().join("elsewhere/conf.yaml");
        let ctx = context(&tmp, ConfigScope::Global).with_global_config_path(explicit.clone());
        assert_eq!(ctx.config_store().config_path(), explicit.as_path());
        assert_eq!(ctx.default_source_dir(), tmp.path().join("elsewhere/skills"));
    }
}
