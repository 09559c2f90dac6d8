//! Link, copy and path primitives for materializing skills in targets.

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::{IoResultExt, Result, SyncError};

/// Names starting with `.` are never skills, never migrated as skills and
/// never pruned.
pub fn is_hidden_name(name: &OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

pub fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|meta| meta.file_type().is_symlink())
        .unwrap_or(false)
}

/// Read a link and return its destination as an absolute, lexically
/// normalized path. Relative destinations are taken relative to the link's
/// parent directory.
pub fn resolve_link(link: &Path) -> io::Result<PathBuf> {
    let dest = fs::read_link(link)?;
    if dest.is_absolute() {
        return Ok(normalize_path(&dest));
    }
    let base = link.parent().unwrap_or_else(|| Path::new("."));
    Ok(normalize_path(&base.join(dest)))
}

/// Make a path absolute and fold `.` and `..` without touching the disk.
pub fn normalize_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };

    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(not(windows))]
pub fn same_path(a: &Path, b: &Path) -> bool {
    normalize_path(a) == normalize_path(b)
}

#[cfg(windows)]
pub fn same_path(a: &Path, b: &Path) -> bool {
    let a = normalize_path(a).to_string_lossy().to_lowercase();
    let b = normalize_path(b).to_string_lossy().to_lowercase();
    a == b
}

/// True when `path` is `root` or lies below it.
pub fn is_within(path: &Path, root: &Path) -> bool {
    let path = normalize_path(path);
    let root = normalize_path(root);
    if cfg!(windows) {
        let path = path.to_string_lossy().to_lowercase();
        let root = root.to_string_lossy().to_lowercase();
        return Path::new(&path).starts_with(Path::new(&root));
    }
    path.starts_with(&root)
}

/// Create `link` pointing at the absolute form of `src_dir`, creating the
/// link's parent directories as needed.
pub fn create_link(src_dir: &Path, link: &Path) -> Result<()> {
    ensure_parent_dir(link)?;
    let src = normalize_path(src_dir);
    create_dir_symlink(&src, link).io_context(|| {
        format!(
            "Failed to create symlink {} -> {}",
            link.display(),
            src.display()
        )
    })?;
    debug!(link = %link.display(), dest = %src.display(), "created symlink");
    Ok(())
}

#[cfg(unix)]
pub fn create_dir_symlink(src_dir: &Path, dst_link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src_dir, dst_link)
}

#[cfg(windows)]
pub fn create_dir_symlink(src_dir: &Path, dst_link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(src_dir, dst_link)
}

#[cfg(not(any(unix, windows)))]
pub fn create_dir_symlink(_src_dir: &Path, _dst_link: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "Symlinks are not supported on this platform",
    ))
}

pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    fs::create_dir_all(parent)
        .io_context(|| format!("Failed to create parent directory: {}", parent.display()))
}

/// Remove a file, a link (never its destination) or a whole directory.
pub fn remove_path(path: &Path) -> io::Result<()> {
    let meta = fs::symlink_metadata(path)?;
    if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

/// Hidden sibling path used to stage a copy before it is renamed into place.
pub fn unique_temp_path(dst: &Path) -> Result<PathBuf> {
    let invalid = |what: &str| {
        SyncError::io(
            format!("Destination path has no {}: {}", what, dst.display()),
            io::Error::from(io::ErrorKind::InvalidInput),
        )
    };
    let parent = dst.parent().ok_or_else(|| invalid("parent"))?;
    let base = dst.file_name().ok_or_else(|| invalid("filename"))?;

    for attempt in 0u32..1000 {
        let name = if attempt == 0 {
            format!(".{}.tmp.{}", base.to_string_lossy(), std::process::id())
        } else {
            format!(
                ".{}.tmp.{}.{}",
                base.to_string_lossy(),
                std::process::id(),
                attempt
            )
        };
        let candidate = parent.join(name);
        if fs::symlink_metadata(&candidate).is_err() {
            return Ok(candidate);
        }
    }

    Err(SyncError::io(
        format!("Failed to allocate a unique temp path for {}", dst.display()),
        io::Error::from(io::ErrorKind::AlreadyExists),
    ))
}

/// Recursively copy `src` into the existing directory `dst`. Symlinks are
/// recreated as symlinks.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    for entry in fs::read_dir(src).io_context(|| format!("Failed to read dir: {}", src.display()))?
    {
        let entry = entry.io_context(|| format!("Failed to read dir entry: {}", src.display()))?;
        let ty = entry
            .file_type()
            .io_context(|| format!("Failed to stat dir entry: {}", entry.path().display()))?;
        let from = entry.path();
        let to = dst.join(entry.file_name());

        if ty.is_symlink() {
            let dest = fs::read_link(&from)
                .io_context(|| format!("Failed to read link: {}", from.display()))?;
            copy_symlink(&dest, &to)
                .io_context(|| format!("Failed to recreate link: {}", to.display()))?;
        } else if ty.is_dir() {
            fs::create_dir_all(&to)
                .io_context(|| format!("Failed to create directory: {}", to.display()))?;
            copy_tree(&from, &to)?;
        } else if ty.is_file() {
            fs::copy(&from, &to).io_context(|| {
                format!(
                    "Failed to copy file from {} to {}",
                    from.display(),
                    to.display()
                )
            })?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(dest: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(dest, link)
}

#[cfg(windows)]
fn copy_symlink(dest: &Path, link: &Path) -> io::Result<()> {
    let resolved = link.parent().map(|p| p.join(dest)).unwrap_or_default();
    if resolved.is_dir() {
        std::os::windows::fs::symlink_dir(dest, link)
    } else {
        std::os::windows::fs::symlink_file(dest, link)
    }
}

#[cfg(not(any(unix, windows)))]
fn copy_symlink(_dest: &Path, _link: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "Symlinks are not supported on this platform",
    ))
}

/// Copy `src` into a staging sibling of `dst`, then swap it into place.
///
/// Whatever is at `dst` is removed only after the staged copy is complete,
/// so a failed copy leaves the destination as it was.
pub fn replace_with_copy(src: &Path, dst: &Path) -> Result<()> {
    ensure_parent_dir(dst)?;
    let tmp_dir = unique_temp_path(dst)?;
    fs::create_dir_all(&tmp_dir)
        .io_context(|| format!("Failed to create temp directory: {}", tmp_dir.display()))?;

    if let Err(err) = copy_tree(src, &tmp_dir) {
        let _ = fs::remove_dir_all(&tmp_dir);
        return Err(err);
    }

    if fs::symlink_metadata(dst).is_ok()
        && let Err(err) = remove_path(dst)
    {
        let _ = fs::remove_dir_all(&tmp_dir);
        return Err(SyncError::io(
            format!("Failed to remove existing destination: {}", dst.display()),
            err,
        ));
    }

    fs::rename(&tmp_dir, dst).io_context(|| {
        format!(
            "Failed to move temp path {} into destination {}",
            tmp_dir.display(),
            dst.display()
        )
    })
}

/// Move an entry, falling back to copy-and-remove across filesystems.
pub fn move_path(from: &Path, to: &Path) -> Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(err) if is_cross_device_os_error(&err) => {
            let meta = fs::symlink_metadata(from)
                .io_context(|| format!("Failed to stat {}", from.display()))?;
            if meta.is_dir() {
                fs::create_dir_all(to)
                    .io_context(|| format!("Failed to create directory: {}", to.display()))?;
                copy_tree(from, to)?;
            } else if meta.file_type().is_symlink() {
                let dest = fs::read_link(from)
                    .io_context(|| format!("Failed to read link: {}", from.display()))?;
                copy_symlink(&dest, to)
                    .io_context(|| format!("Failed to recreate link: {}", to.display()))?;
            } else {
                fs::copy(from, to).io_context(|| {
                    format!("Failed to copy {} to {}", from.display(), to.display())
                })?;
            }
            remove_path(from).io_context(|| format!("Failed to remove {}", from.display()))
        }
        Err(err) => Err(SyncError::io(
            format!("Failed to move {} to {}", from.display(), to.display()),
            err,
        )),
    }
}

fn is_cross_device_os_error(err: &io::Error) -> bool {
    let Some(code) = err.raw_os_error() else {
        return false;
    };

    #[cfg(unix)]
    {
        const EXDEV: i32 = 18;
        code == EXDEV
    }

    #[cfg(windows)]
    {
        const ERROR_NOT_SAME_DEVICE: i32 = 17;
        code == ERROR_NOT_SAME_DEVICE
    }

    #[cfg(not(any(unix, windows)))]
    {
        let _ = code;
        false
    }
}
