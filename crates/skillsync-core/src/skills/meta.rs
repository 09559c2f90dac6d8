//! Install metadata written next to installed skills.
//!
//! The installer records where a skill came from; sync only reads it for
//! display.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata file name inside an installed skill directory.
pub const META_FILE: &str = ".skillsync-meta.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallMeta {
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed_at: Option<DateTime<Utc>>,
}

/// Read install metadata, if the skill has any readable metadata file.
pub fn read_install_meta(skill_dir: &Path) -> Option<InstallMeta> {
    let raw = fs::read_to_string(skill_dir.join(META_FILE)).ok()?;
    serde_json::from_str(&raw).ok()
}
