//! YAML configuration schema
//!
//! Global config (`~/.config/skillsync/config.yaml`):
//! ```yaml
//! source: ~/skills
//! mode: merge
//! targets:
//!   claude: {}
//!   cursor:
//!     path: ~/.cursor/skills
//!     mode: copy
//!     include: ["frontend__*"]
//! ```
//!
//! Project config (`.skillsync/config.yaml`), where each target is either a
//! bare name or an object:
//! ```yaml
//! targets:
//!   - claude
//!   - name: tools
//!     path: tools/skills
//!     exclude: ["*__wip"]
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use super::known_targets::TargetRegistry;
use super::paths::resolve_config_path;
use crate::error::SyncError;
use crate::skills::SkillFilter;
use crate::types::{ConfigScope, SyncMode, Target};

/// One entry of the global `targets` map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<SyncMode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Source tree; defaults to `<config dir>/skills`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Mode for targets that set none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<SyncMode>,
    #[serde(default)]
    pub targets: BTreeMap<String, TargetEntry>,
}

impl GlobalConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(source) = &self.source
            && source.trim().is_empty()
        {
            anyhow::bail!("'source' must not be empty");
        }
        for (name, entry) in &self.targets {
            validate_target(name, &entry.include, &entry.exclude)?;
        }
        Ok(())
    }

    /// Resolve every target into an absolute [`Target`], in name order.
    pub fn resolve_targets(
        &self,
        home: &Path,
        registry: &TargetRegistry,
    ) -> Result<Vec<Target>, SyncError> {
        self.targets
            .iter()
            .map(|(name, entry)| -> Result<Target, SyncError> {
                let path = match entry.path.as_deref().filter(|p| !p.trim().is_empty()) {
                    Some(raw) => resolve_config_path(raw, home, home),
                    None => registry
                        .get(name)
                        .and_then(|known| known.path_for_scope(ConfigScope::Global, home, home))
                        .ok_or_else(|| SyncError::UnresolvedTargetPath { name: name.clone() })?,
                };
                Ok(Target {
                    name: name.clone(),
                    path,
                    mode: entry.mode.or(self.mode).unwrap_or_default(),
                    include: entry.include.clone(),
                    exclude: entry.exclude.clone(),
                })
            })
            .collect()
    }
}

/// Object form of a project target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectTargetSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<SyncMode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
}

/// A project target: a bare known-target name or a full object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProjectTargetEntry {
    Name(String),
    Detailed(ProjectTargetSpec),
}

impl ProjectTargetEntry {
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) => name,
            Self::Detailed(spec) => &spec.name,
        }
    }

    /// Canonical object form.
    pub fn to_spec(&self) -> ProjectTargetSpec {
        match self {
            Self::Name(name) => ProjectTargetSpec {
                name: name.clone(),
                ..Default::default()
            },
            Self::Detailed(spec) => spec.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<SyncMode>,
    #[serde(default)]
    pub targets: Vec<ProjectTargetEntry>,
}

impl ProjectConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        let mut seen = HashSet::new();
        for entry in &self.targets {
            let spec = entry.to_spec();
            if !seen.insert(spec.name.clone()) {
                anyhow::bail!("Duplicate target '{}'", spec.name);
            }
            validate_target(&spec.name, &spec.include, &spec.exclude)?;
        }
        Ok(())
    }

    /// Resolve every target into an absolute [`Target`], in name order.
    /// Relative paths are anchored at `project_root`.
    pub fn resolve_targets(
        &self,
        project_root: &Path,
        home: &Path,
        registry: &TargetRegistry,
    ) -> Result<Vec<Target>, SyncError> {
        let mut targets = self
            .targets
            .iter()
            .map(|entry| -> Result<Target, SyncError> {
                let spec = entry.to_spec();
                let path = match spec.path.as_deref().filter(|p| !p.trim().is_empty()) {
                    Some(raw) => resolve_config_path(raw, home, project_root),
                    None => registry
                        .get(&spec.name)
                        .and_then(|known| {
                            known.path_for_scope(ConfigScope::Project, home, project_root)
                        })
                        .ok_or_else(|| SyncError::UnresolvedTargetPath {
                            name: spec.name.clone(),
                        })?,
                };
                Ok(Target {
                    mode: spec.mode.or(self.mode).unwrap_or_default(),
                    name: spec.name,
                    path,
                    include: spec.include,
                    exclude: spec.exclude,
                })
            })
            .collect::<Result<Vec<_>, SyncError>>()?;
        targets.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(targets)
    }
}

fn validate_target(name: &str, include: &[String], exclude: &[String]) -> anyhow::Result<()> {
    if name.trim().is_empty() {
        anyhow::bail!("Target name must not be empty");
    }
    SkillFilter::new(include, exclude)
        .with_context(|| format!("Invalid filters for target '{}'", name))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_global_resolution_uses_known_paths_and_modes() {
        let mut config = GlobalConfig {
            source: Some("~/skills".into()),
            mode: Some(SyncMode::Copy),
            ..Default::default()
        };
        config.targets.insert("claude".into(), TargetEntry::default());
        config.targets.insert(
            "custom".into(),
            TargetEntry {
                path: Some("~/tools/skills".into()),
                mode: Some(SyncMode::Symlink),
                ..Default::default()
            },
        );

        let home = Path::new("/home/u");
        let targets = config
            .resolve_targets(home, TargetRegistry::builtin())
            .unwrap();
        assert_eq!(targets[0].name, "claude");
        assert_eq!(targets[0].path, PathBuf::from("/home/u/.claude/skills"));
        assert_eq!(targets[0].mode, SyncMode::Copy);
        assert_eq!(targets[1].path, PathBuf::from("/home/u/tools/skills"));
        assert_eq!(targets[1].mode, SyncMode::Symlink);
    }

    #[test]
    fn test_unknown_target_without_path() {
        let mut config = GlobalConfig::default();
        config.targets.insert("mystery".into(), TargetEntry::default());
        let err = config
            .resolve_targets(Path::new("/home/u"), TargetRegistry::builtin())
            .unwrap_err();
        assert!(matches!(err, SyncError::UnresolvedTargetPath { .. }));
    }

    #[test]
    fn test_default_mode_is_merge() {
        let mut config = GlobalConfig::default();
        config.targets.insert(
            "x".into(),
            TargetEntry {
                path: Some("/x".into()),
                ..Default::default()
            },
        );
        let targets = config
            .resolve_targets(Path::new("/h"), TargetRegistry::builtin())
            .unwrap();
        assert_eq!(targets[0].mode, SyncMode::Merge);
    }

    #[test]
    fn test_project_targets_resolve_against_root() {
        let config = ProjectConfig {
            mode: None,
            targets: vec![
                ProjectTargetEntry::Name("claude".into()),
                ProjectTargetEntry::Detailed(ProjectTargetSpec {
                    name: "agents".into(),
                    path: Some("tools/agents".into()),
                    mode: Some(SyncMode::Copy),
                    ..Default::default()
                }),
            ],
        };
        let targets = config
            .resolve_targets(
                Path::new("/work/app"),
                Path::new("/home/u"),
                TargetRegistry::builtin(),
            )
            .unwrap();
        assert_eq!(targets[0].name, "agents");
        assert_eq!(targets[0].path, PathBuf::from("/work/app/tools/agents"));
        assert_eq!(targets[1].path, PathBuf::from("/work/app/.claude/skills"));
    }

    #[test]
    fn test_project_duplicate_names_rejected() {
        let config = ProjectConfig {
            mode: None,
            targets: vec![
                ProjectTargetEntry::Name("claude".into()),
                ProjectTargetEntry::Detailed(ProjectTargetSpec {
                    name: "claude".into(),
                    ..Default::default()
                }),
            ],
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_pattern_fails_validation() {
        let mut config = GlobalConfig::default();
        config.targets.insert(
            "claude".into(),
            TargetEntry {
                include: vec!["[oops".into()],
                ..Default::default()
            },
        );
        let err = config.validate().unwrap_err();
        assert!(format!("{:#}", err).contains("[oops"));
    }
}
