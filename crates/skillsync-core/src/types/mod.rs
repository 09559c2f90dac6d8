//! Shared core types used across configuration and the sync engine.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Configuration scope levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigScope {
    /// User-wide configuration under the config directory.
    Global,
    /// Configuration under `.skillsync/` in a project root.
    Project,
}

impl ConfigScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Project => "project",
        }
    }
}

/// How a target directory is kept in step with the source tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// The whole target directory is one link to the source root.
    Symlink,
    /// One link per skill; local entries are preserved.
    #[default]
    Merge,
    /// One physical copy per skill, tracked by a manifest.
    Copy,
}

impl SyncMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Symlink => "symlink",
            Self::Merge => "merge",
            Self::Copy => "copy",
        }
    }
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "symlink" | "link" => Ok(Self::Symlink),
            "merge" => Ok(Self::Merge),
            "copy" => Ok(Self::Copy),
            other => anyhow::bail!(
                "Unknown sync mode: {}. Use 'symlink', 'merge' or 'copy'",
                other
            ),
        }
    }
}

/// Observed relationship between a target path and the source tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetStatus {
    NotExist,
    Linked,
    HasFiles,
    Broken,
    Conflict,
    Merged,
    Copied,
}

impl TargetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotExist => "not exist",
            Self::Linked => "linked",
            Self::HasFiles => "has files",
            Self::Broken => "broken",
            Self::Conflict => "conflict",
            Self::Merged => "merged",
            Self::Copied => "copied",
        }
    }
}

impl fmt::Display for TargetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved sync destination.
///
/// Configuration layers produce these after path resolution; the engine never
/// sees raw config entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    pub name: String,
    pub path: PathBuf,
    pub mode: SyncMode,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
}

impl Target {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, mode: SyncMode) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            mode,
            include: Vec::new(),
            exclude: Vec::new(),
        }
    }

    pub fn with_include<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_exclude<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn has_filters(&self) -> bool {
        !self.include.is_empty() || !self.exclude.is_empty()
    }
}
