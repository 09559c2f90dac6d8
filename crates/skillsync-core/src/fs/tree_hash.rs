//! Deterministic tree hashing for change detection
//!
//! Copy-mode targets record the hash of each skill directory at copy time;
//! a later sync re-copies only when the source hash differs.

use std::fs;
use std::path::Path;

use crate::error::{IoResultExt, Result};

/// Compute deterministic tree hash of a directory
///
/// # Algorithm
/// - Recursive directory traversal, entries sorted by name
/// - Files: `blake3(relative_path || 0x00 || content)`
/// - Directories: `relative_path || 0xFF`, then children
/// - Symlinks: `relative_path || 0xFE || link_target` (not followed)
/// - `.git` directories are skipped
/// - Output: hex string
///
/// # Example
/// ```no_run
/// use skillsync_core::fs::tree_hash::hash_tree;
/// use std::path::Path;
///
/// let hash = hash_tree(Path::new("/path/to/skill"))?;
/// assert_eq!(hash.len(), 64);
/// # Ok::<(), skillsync_core::error::SyncError>(())
/// ```
pub fn hash_tree(path: &Path) -> Result<String> {
    let mut hasher = blake3::Hasher::new();
    hash_dir_recursive(&mut hasher, path, "")?;
    Ok(hasher.finalize().to_hex().to_string())
}

fn hash_dir_recursive(hasher: &mut blake3::Hasher, dir: &Path, base: &str) -> Result<()> {
    let mut entries = fs::read_dir(dir)
        .io_context(|| format!("Failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()
        .io_context(|| format!("Failed to read directory entries: {}", dir.display()))?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let name = entry.file_name();
        let name_str = name.to_string_lossy();
        let rel_path = if base.is_empty() {
            name_str.to_string()
        } else {
            format!("{}/{}", base, name_str)
        };

        let ty = entry
            .file_type()
            .io_context(|| format!("Failed to stat file: {}", entry.path().display()))?;

        if ty.is_symlink() {
            let dest = fs::read_link(entry.path())
                .io_context(|| format!("Failed to read link: {}", entry.path().display()))?;
            hasher.update(rel_path.as_bytes());
            hasher.update(&[0xFE]);
            hasher.update(dest.to_string_lossy().as_bytes());
        } else if ty.is_dir() {
            if name_str == ".git" {
                continue;
            }
            hasher.update(rel_path.as_bytes());
            hasher.update(&[0xFF]);
            hash_dir_recursive(hasher, &entry.path(), &rel_path)?;
        } else if ty.is_file() {
            hasher.update(rel_path.as_bytes());
            hasher.update(&[0x00]);
            let content = fs::read(entry.path())
                .io_context(|| format!("Failed to read file: {}", entry.path().display()))?;
            hasher.update(&content);
        }
        // Sockets, fifos and devices carry no skill content.
    }

    Ok(())
}
