//! YAML parser with helpful error messages

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::schema::{GlobalConfig, ProjectConfig};

pub fn parse_global_config(path: &Path) -> Result<GlobalConfig> {
    let content = read_config(path)?;
    parse_global_config_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

pub fn parse_global_config_str(content: &str) -> Result<GlobalConfig> {
    let config: GlobalConfig = parse_yaml(content)?;
    config.validate()?;
    Ok(config)
}

pub fn parse_project_config(path: &Path) -> Result<ProjectConfig> {
    let content = read_config(path)?;
    parse_project_config_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

pub fn parse_project_config_str(content: &str) -> Result<ProjectConfig> {
    let config: ProjectConfig = parse_yaml(content)?;
    config.validate()?;
    Ok(config)
}

/// Serialize a configuration to a YAML string
pub fn to_yaml<T: Serialize>(config: &T) -> Result<String> {
    serde_yaml::to_string(config).context("Failed to serialize configuration to YAML")
}

fn read_config(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))
}

fn parse_yaml<T: DeserializeOwned + Default>(content: &str) -> Result<T> {
    // An empty file (or one holding only comments) is an empty config.
    if content
        .lines()
        .all(|line| line.trim().is_empty() || line.trim_start().starts_with('#'))
    {
        return Ok(T::default());
    }
    serde_yaml::from_str(content).map_err(|e| enhance_yaml_error(e, content))
}

/// Enhance YAML parsing errors with the offending lines
fn enhance_yaml_error(error: serde_yaml::Error, content: &str) -> anyhow::Error {
    match error.location() {
        Some(location) => {
            let line_num = location.line();
            let context = get_line_context(content, line_num);
            anyhow::anyhow!(
                "YAML parsing error at line {}:\n{}\n\nError: {}",
                line_num,
                context,
                error
            )
        }
        None => anyhow::anyhow!("YAML parsing error: {}", error),
    }
}

/// Get context lines around an error
fn get_line_context(content: &str, line_num: usize) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let start = line_num.saturating_sub(2).min(lines.len());
    let end = (line_num + 2).min(lines.len());

    lines[start..end]
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let num = start + i + 1;
            let marker = if num == line_num { ">>>" } else { "   " };
            format!("{} {:4} | {}", marker, num, line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
