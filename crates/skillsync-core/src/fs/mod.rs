//! Filesystem primitives shared by discovery, the sync strategies and
//! diagnostics.

pub mod link;
pub mod tree_hash;

pub use link::{
    copy_tree, create_link, is_hidden_name, is_symlink, is_within, move_path, normalize_path,
    remove_path, replace_with_copy, resolve_link, same_path,
};
pub use tree_hash::hash_tree;
