//! Content signatures for source files.
//!
//! A signature is the lowercase hex SHA-256 of the file bytes. Whole-file
//! transcodes are only reused while the stored signature matches.

use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;

use crate::Result;

/// Compute the signature of the file at `path`.
pub fn file_signature(path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Signature of an in-memory buffer.
pub fn bytes_signature(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
