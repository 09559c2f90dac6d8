//! `SKILL.md` frontmatter parsing.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer};
use tracing::debug;

use super::SKILL_MARKER;

/// The fields of a skill's YAML frontmatter that the engine reads.
///
/// Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SkillFrontmatter {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Either a single target name or a list of them
    #[serde(default, deserialize_with = "one_or_many")]
    pub targets: Option<Vec<String>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<OneOrMany>::deserialize(deserializer)?;
    Ok(value.map(|v| match v {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(list) => list,
    }))
}

/// Slice out the YAML between the leading `---` line and the next `---` line.
pub fn extract_frontmatter(content: &str) -> Option<&str> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let rest = content.strip_prefix("---")?;
    let rest = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            return Some(&rest[..offset]);
        }
        offset += line.len();
    }
    None
}

/// Parse frontmatter from `SKILL.md` content. Missing or malformed
/// frontmatter yields `None`.
pub fn parse_frontmatter(content: &str) -> Option<SkillFrontmatter> {
    let yaml = extract_frontmatter(content)?;
    if yaml.trim().is_empty() {
        return Some(SkillFrontmatter::default());
    }
    match serde_yaml::from_str::<SkillFrontmatter>(yaml) {
        Ok(frontmatter) => Some(frontmatter),
        Err(err) => {
            debug!(error = %err, "ignoring malformed frontmatter");
            None
        }
    }
}

/// Read the frontmatter of the skill in `skill_dir`, defaulting every field
/// when the file is unreadable or has none.
pub fn read_skill_frontmatter(skill_dir: &Path) -> SkillFrontmatter {
    fs::read_to_string(skill_dir.join(SKILL_MARKER))
        .ok()
        .and_then(|content| parse_frontmatter(&content))
        .map(|mut fm| {
            if let Some(targets) = fm.targets.as_mut() {
                targets.retain(|t| !t.trim().is_empty());
            }
            fm
        })
        .unwrap_or_default()
}
