//! Content fingerprinting using BLAKE3
//!
//! Fingerprints depend on file content only. Modification times, permissions
//! and storage metadata never contribute, so the same bytes hash identically
//! on every machine and across redeploys.

use crate::error::ReadError;
use crate::types::Fingerprint;
use blake3::Hasher;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const READ_CHUNK_SIZE: usize = 64 * 1024;

/// Compute the fingerprint of in-memory content
pub fn compute_content_hash(content: &[u8]) -> Fingerprint {
    let mut hasher = Hasher::new();
    hasher.update(content);
    *hasher.finalize().as_bytes()
}

/// Compute the fingerprint of everything a reader yields, returning the
/// fingerprint and the number of bytes consumed.
pub fn hash_reader<R: Read>(mut reader: R) -> std::io::Result<(Fingerprint, u64)> {
    let mut hasher = Hasher::new();
    let mut buffer = vec![0u8; READ_CHUNK_SIZE];
    let mut total: u64 = 0;

    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..read]);
        total += read as u64;
    }

    Ok((*hasher.finalize().as_bytes(), total))
}

/// Stream a file from disk and fingerprint it.
///
/// The file must be read completely; any I/O failure is a [`ReadError`].
pub fn hash_file(path: &Path) -> Result<(Fingerprint, u64), ReadError> {
    let display = path.display().to_string();
    let file = File::open(path).map_err(|e| ReadError::io(&display, e))?;
    hash_reader(file).map_err(|e| ReadError::io(display, e))
}
