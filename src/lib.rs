//! Wood: content-hash deployment to object stores and CDNs
//!
//! Fingerprints a local directory, compares it with what an object store
//! holds, applies the difference to the store, and invalidates the changed
//! paths on every configured CDN using as few patterns as is safe.

pub mod cdn;
pub mod cli;
pub mod compare;
pub mod concurrency;
pub mod config;
pub mod deploy;
pub mod error;
pub mod invalidation;
pub mod logging;
pub mod store;
pub mod sync;
pub mod tree;
pub mod types;
