//! Configuration management
//!
//! Global and project configuration live in YAML files. Both resolve into
//! the same list of [`Target`](crate::types::Target)s before the sync
//! engine sees them.

pub mod known_targets;
pub mod parser;
pub mod paths;
pub mod schema;
pub mod store;

pub use known_targets::{KnownTarget, TargetRegistry};
pub use schema::{GlobalConfig, ProjectConfig, ProjectTargetEntry, ProjectTargetSpec, TargetEntry};
pub use store::ConfigStore;
