//! Content-addressed file trees
//!
//! A tree maps normalized relative paths to entries whose fingerprint is a
//! hash of the file's content only. Trees are built once, either by walking a
//! local directory or by adapting a remote listing, and never mutated.

pub mod builder;
pub mod entry;
pub mod hasher;
pub mod path;
pub mod walker;

pub use builder::{Tree, TreeBuilder};
pub use entry::PathEntry;
