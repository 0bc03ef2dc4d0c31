//! Hashing helpers shared by the audit log integrity chain.

use sha2::{Digest, Sha256};

/// SHA-256 digest of `data`, hex-encoded (lowercase, 64 characters).
pub fn sha256_hex(data: &[u8]) -> String {
    use std::fmt::Write;

    let mut hasher = Sha256::new();
    hasher.update(data);
    let digest = hasher.finalize();
    let mut out = String::with_capacity(64);
    for byte in digest {
        let _ = write!(out, "{byte:02x}");
    }
    out
}
