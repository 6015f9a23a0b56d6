//! Core types for the wood sync and invalidation engine.

/// Fingerprint: BLAKE3 hash of a file's content, never of its metadata
pub type Fingerprint = [u8; 32];

/// Reference identifier returned by a CDN for one submitted batch
pub type ReferenceId = String;
