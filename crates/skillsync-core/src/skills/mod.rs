//! Skills in the source tree
//!
//! A skill is any directory below the source root that contains a
//! `SKILL.md` file. Nested skills are addressed in targets by a flat name
//! whose segments are joined with `__`.

pub mod discovery;
pub mod filter;
pub mod frontmatter;
pub mod meta;

use std::path::PathBuf;

use serde::Serialize;

pub use discovery::{SourceScan, discover_skills, list_top_level_dirs, scan_source};
pub use filter::SkillFilter;
pub use frontmatter::{SkillFrontmatter, parse_frontmatter, read_skill_frontmatter};
pub use meta::{InstallMeta, META_FILE, read_install_meta};

/// Marker file that turns a directory into a skill.
pub const SKILL_MARKER: &str = "SKILL.md";

/// Reserved separator between path segments in a flat name.
pub const FLAT_SEPARATOR: &str = "__";

/// A skill discovered in the source tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skill {
    /// Absolute directory of the skill in the source tree
    pub source_path: PathBuf,
    /// `/`-separated path relative to the source root
    pub rel_path: String,
    /// Name of the entry this skill gets in merge and copy targets
    pub flat_name: String,
    /// Whether the first path segment is a tracked repository (`_name`)
    pub in_tracked_repo: bool,
    /// Targets this skill is restricted to; `None` means all targets
    #[serde(skip_serializing_if = "Option::is_none")]
    pub targets: Option<Vec<String>>,
    /// The `name` declared in the skill's frontmatter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declared_name: Option<String>,
}

impl Skill {
    /// Whether the skill's own restriction allows `target_name`.
    ///
    /// An absent or empty restriction allows every target.
    pub fn allows_target(&self, target_name: &str) -> bool {
        match &self.targets {
            Some(list) if !list.is_empty() => list.iter().any(|t| t == target_name),
            _ => true,
        }
    }
}

/// Flatten a `/`-separated relative path into a target entry name.
pub fn flat_name(rel_path: &str) -> String {
    rel_path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(FLAT_SEPARATOR)
}

/// Top-level directories starting with `_` hold tracked repositories.
pub fn is_tracked_repo_dir(name: &str) -> bool {
    name.len() > 1 && name.starts_with('_')
}
