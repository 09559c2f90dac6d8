//! Config store for loading and saving YAML configuration.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;

use crate::types::ConfigScope;

use super::paths::config_path_for_scope;
use super::{GlobalConfig, ProjectConfig, parser};

#[derive(Debug, Clone)]
pub struct ConfigStore {
    scope: ConfigScope,
    config_path: PathBuf,
    project_root: PathBuf,
}

impl ConfigStore {
    pub fn from_paths(scope: ConfigScope, global_dir: PathBuf, project_root: PathBuf) -> Self {
        let config_path = config_path_for_scope(scope, &global_dir, &project_root);
        Self {
            scope,
            config_path,
            project_root,
        }
    }

    /// Use an explicit config file instead of the scope default.
    pub fn with_config_path(mut self, config_path: PathBuf) -> Self {
        self.config_path = config_path;
        self
    }

    pub fn scope(&self) -> ConfigScope {
        self.scope
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn exists(&self) -> bool {
        self.config_path.is_file()
    }

    pub fn load_global(&self) -> anyhow::Result<GlobalConfig> {
        if !self.exists() {
            return Ok(GlobalConfig::default());
        }
        parser::parse_global_config(&self.config_path)
    }

    pub fn load_project(&self) -> anyhow::Result<ProjectConfig> {
        if !self.exists() {
            return Ok(ProjectConfig::default());
        }
        parser::parse_project_config(&self.config_path)
    }

    pub fn save_global(&self, config: &GlobalConfig) -> anyhow::Result<()> {
        config.validate()?;
        self.write(config)
    }

    pub fn save_project(&self, config: &ProjectConfig) -> anyhow::Result<()> {
        config.validate()?;
        self.write(config)
    }

    fn write<T: Serialize>(&self, config: &T) -> anyhow::Result<()> {
        let content = parser::to_yaml(config)?;
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        std::fs::write(&self.config_path, content).with_context(|| {
            format!(
                "Failed to write config file: {}",
                self.config_path.display()
            )
        })?;
        Ok(())
    }
}
