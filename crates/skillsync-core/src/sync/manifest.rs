//! Copy-mode manifest persistence.
//!
//! A hidden JSON file inside a copy-mode target records which entries the
//! engine owns and the source fingerprint each was copied from.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{IoResultExt, Result, SyncError};

/// Manifest file name inside a copy-mode target.
pub const MANIFEST_FILE: &str = ".skillsync-manifest.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Flat name -> source fingerprint at copy time
    #[serde(default)]
    pub managed: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Manifest {
    pub fn path_in(target_dir: &Path) -> PathBuf {
        target_dir.join(MANIFEST_FILE)
    }

    pub fn exists_in(target_dir: &Path) -> bool {
        Self::path_in(target_dir).is_file()
    }

    /// Load the manifest of `target_dir`.
    ///
    /// A missing file yields an empty manifest. So does a corrupt one, which
    /// leaves every existing copy unmanaged: sync keeps them as local until
    /// `--force` adopts them. Keys that do not name a direct child of the
    /// target are dropped.
    pub fn load(target_dir: &Path) -> Result<Self> {
        let path = Self::path_in(target_dir);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => {
                return Err(SyncError::io(
                    format!("Failed to read manifest: {}", path.display()),
                    err,
                ));
            }
        };

        match serde_json::from_slice::<Self>(&bytes) {
            Ok(mut manifest) => {
                manifest.managed.retain(|name, _| {
                    let valid = is_entry_name(name);
                    if !valid {
                        warn!(
                            path = %path.display(),
                            entry = %name,
                            "ignoring manifest key outside target"
                        );
                    }
                    valid
                });
                Ok(manifest)
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "ignoring corrupt manifest");
                Ok(Self::default())
            }
        }
    }

    /// Save atomically (tmp + rename), stamping `updated_at`.
    pub fn save(&mut self, target_dir: &Path) -> Result<()> {
        self.updated_at = Some(Utc::now());
        let path = Self::path_in(target_dir);
        let tmp_path = target_dir.join(format!("{}.tmp.{}", MANIFEST_FILE, std::process::id()));

        let bytes = serde_json::to_vec_pretty(self).map_err(|err| {
            SyncError::io("Failed to serialize manifest", io::Error::other(err))
        })?;
        fs::write(&tmp_path, bytes)
            .io_context(|| format!("Failed to write tmp manifest: {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &path)
            .io_context(|| format!("Failed to rename tmp manifest: {}", tmp_path.display()))
    }

    /// Delete the manifest file if present.
    pub fn remove(target_dir: &Path) -> Result<bool> {
        let path = Self::path_in(target_dir);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(SyncError::io(
                format!("Failed to remove manifest: {}", path.display()),
                err,
            )),
        }
    }

    pub fn is_managed(&self, flat_name: &str) -> bool {
        self.managed.contains_key(flat_name)
    }

    pub fn fingerprint(&self, flat_name: &str) -> Option<&str> {
        self.managed.get(flat_name).map(String::as_str)
    }

    pub fn record(&mut self, flat_name: &str, fingerprint: String) {
        self.managed.insert(flat_name.to_string(), fingerprint);
    }

    pub fn forget(&mut self, flat_name: &str) -> bool {
        self.managed.remove(flat_name).is_some()
    }
}

/// True when `name` can only address a direct, non-hidden child of a target
/// directory: a single normal path component.
pub fn is_entry_name(name: &str) -> bool {
    if name.is_empty() || name.starts_with('.') || name.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
