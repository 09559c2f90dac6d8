//! Per-target skill selection.

use glob::Pattern;

use super::Skill;
use crate::error::{Result, SyncError};

/// Compiled include/exclude patterns of one target.
///
/// Patterns are shell globs matched against a skill's flat name. A skill is
/// selected when it matches some include (or there are none), matches no
/// exclude, and its own restriction allows the target.
#[derive(Debug, Clone, Default)]
pub struct SkillFilter {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl SkillFilter {
    /// Compile both lists, failing on the first invalid pattern.
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self> {
        Ok(Self {
            include: compile("include", include)?,
            exclude: compile("exclude", exclude)?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }

    /// Pattern check only; ignores per-skill target restrictions.
    pub fn matches_name(&self, flat_name: &str) -> bool {
        let included =
            self.include.is_empty() || self.include.iter().any(|p| p.matches(flat_name));
        included && !self.exclude.iter().any(|p| p.matches(flat_name))
    }

    pub fn matches(&self, skill: &Skill, target_name: &str) -> bool {
        self.matches_name(&skill.flat_name) && skill.allows_target(target_name)
    }

    /// The skills selected for `target_name`, in input order.
    pub fn apply<'a>(&self, skills: &'a [Skill], target_name: &str) -> Vec<&'a Skill> {
        skills
            .iter()
            .filter(|skill| self.matches(skill, target_name))
            .collect()
    }
}

fn compile(kind: &'static str, patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|source| SyncError::InvalidPattern {
                kind,
                pattern: pattern.clone(),
                source,
            })
        })
        .collect()
}
