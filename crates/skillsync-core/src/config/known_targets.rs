//! Registry of well-known targets.
//!
//! The table is embedded at build time and parsed once on first use.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use super::paths::expand_tilde;
use crate::types::ConfigScope;

const KNOWN_TARGETS_TOML: &str = include_str!("known_targets.toml");

/// A tool whose skill directory location is known in advance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownTarget {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub global_path: Option<String>,
    #[serde(default)]
    pub project_path: Option<String>,
}

impl KnownTarget {
    pub fn matches(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|a| a == name)
    }

    /// Default location for `scope`, resolved against `home` or the project
    /// root.
    pub fn path_for_scope(&self, scope: ConfigScope, home: &Path, project_root: &Path) -> Option<PathBuf> {
        match scope {
            ConfigScope::Global => self.global_path.as_deref().map(|p| expand_tilde(p, home)),
            ConfigScope::Project => self.project_path.as_deref().map(|p| project_root.join(p)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct KnownTargetsFile {
    #[serde(default)]
    targets: Vec<KnownTarget>,
}

/// Lookup table of known targets.
#[derive(Debug, Clone, Default)]
pub struct TargetRegistry {
    targets: Vec<KnownTarget>,
}

static BUILTIN: OnceLock<TargetRegistry> = OnceLock::new();

impl TargetRegistry {
    /// Parse a registry from TOML content.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        let file: KnownTargetsFile = toml::from_str(content)?;
        Ok(Self {
            targets: file.targets,
        })
    }

    /// The embedded registry.
    pub fn builtin() -> &'static TargetRegistry {
        BUILTIN.get_or_init(|| {
            Self::from_toml(KNOWN_TARGETS_TOML).unwrap_or_else(|err| {
                tracing::error!(error = %err, "embedded target table is invalid");
                Self::default()
            })
        })
    }

    pub fn all(&self) -> &[KnownTarget] {
        &self.targets
    }

    /// Find a target by name or alias.
    pub fn get(&self, name: &str) -> Option<&KnownTarget> {
        self.targets.iter().find(|t| t.matches(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Names and aliases of every known target.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.targets
            .iter()
            .flat_map(|t| std::iter::once(t.name.as_str()).chain(t.aliases.iter().map(String::as_str)))
    }

    /// Known targets whose global directory's parent exists under `home`,
    /// i.e. the tool looks installed.
    pub fn detect_installed(&self, home: &Path) -> Vec<&KnownTarget> {
        self.targets
            .iter()
            .filter(|t| {
                t.path_for_scope(ConfigScope::Global, home, home)
                    .and_then(|p| p.parent().map(Path::is_dir))
                    .unwrap_or(false)
            })
            .collect()
    }
}
