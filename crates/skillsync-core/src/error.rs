//! Error taxonomy for the sync engine.
//!
//! Configuration errors are fatal before any mutation. Conflict errors abort
//! a single target. Per-item failures never surface here; merge and copy
//! record them as skipped entries with a warning.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("invalid {kind} pattern '{pattern}': {source}")]
    InvalidPattern {
        kind: &'static str,
        pattern: String,
        source: glob::PatternError,
    },

    #[error("unknown target: {0}")]
    UnknownTarget(String),

    #[error("target '{name}' has no path and is not a known target")]
    UnresolvedTargetPath { name: String },

    #[error("source directory does not exist: {}", .0.display())]
    SourceMissing(PathBuf),

    #[error(
        "target is a symlink to a different location: {} -> {} (use --force to replace)",
        path.display(),
        points_to.display()
    )]
    Conflict { path: PathBuf, points_to: PathBuf },

    #[error(
        "cannot migrate {}: already present in source: {}",
        path.display(),
        names.join(", ")
    )]
    MigrationCollision { path: PathBuf, names: Vec<String> },

    #[error("target path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl SyncError {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Errors that stem from configuration rather than disk state.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidPattern { .. }
                | Self::UnknownTarget(_)
                | Self::UnresolvedTargetPath { .. }
                | Self::SourceMissing(_)
        )
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. } | Self::MigrationCollision { .. })
    }
}

/// Attach a path-bearing context to raw I/O results.
pub trait IoResultExt<T> {
    fn io_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn io_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|err| SyncError::io(f(), err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_errors_are_classified() {
        assert!(SyncError::UnknownTarget("x".into()).is_configuration());
        assert!(SyncError::SourceMissing(PathBuf::from("/nope")).is_configuration());
        assert!(!SyncError::NotADirectory(PathBuf::from("/f")).is_configuration());
    }

    #[test]
    fn test_io_context_keeps_message() {
        let res: io::Result<()> = Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        let err = res.io_context(|| "Failed to read /x".to_string()).unwrap_err();
        assert_eq!(err.to_string(), "Failed to read /x: denied");
        assert!(!err.is_conflict());
    }

    #[test]
    fn test_migration_collision_lists_names() {
        let err = SyncError::MigrationCollision {
            path: PathBuf::from("/t"),
            names: vec!["a".into(), "b".into()],
        };
        assert!(err.is_conflict());
        assert!(err.to_string().ends_with("a, b"));
    }
}
