//! Skillsync Core Library
//!
//! Keeps one source tree of skills in step with the skill directories of
//! several AI tools, using symlink, merge or copy reconciliation per target.

pub mod config;
pub mod context;
pub mod diagnostics;
pub mod diff;
pub mod error;
pub mod fs;
pub mod git;
pub mod skills;
pub mod sync;
pub mod types;

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration
    pub use crate::config::{
        ConfigStore, GlobalConfig, ProjectConfig, ProjectTargetEntry, TargetEntry,
        TargetRegistry,
    };
    pub use crate::context::{AppContext, SyncSetup};

    // Diff
    pub use crate::diff::{DiffAction, DiffItem, TargetDiff, diff_target};

    // Errors
    pub use crate::error::{Result, SyncError};

    // Skills
    pub use crate::skills::{Skill, SkillFilter, discover_skills};

    // Sync
    pub use crate::sync::{
        BackupHook, CopyResult, MergeResult, PruneResult, SkipReason, SyncEngine, SyncOptions,
        SyncOutcome, SyncStrategy, TargetInspection, TargetSyncReport, strategy_for,
    };

    // Shared types
    pub use crate::types::{ConfigScope, SyncMode, Target, TargetStatus};
}
