//! Blake3 hashing utilities for content-derived identifiers.

/// Compute Blake3 hash of data as lowercase hex
pub fn blake3_hash(data: &[u8]) -> String {
    let hash = blake3::hash(data);
    hex::encode(hash.as_bytes())
}

/// Identifier derived from a prefix and key parts (`prefix-<10 hex chars>`)
///
/// Equal inputs always produce equal ids, so re-running an analysis over an
/// unchanged snapshot reproduces the same identifiers.
pub fn stable_id(prefix: &str, parts: &[&str]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(prefix.as_bytes());
    for part in parts {
        // Separator keeps ("ab", "c") and ("a", "bc") apart
        hasher.update(&[0]);
        hasher.update(part.as_bytes());
    }
    let digest = hex::encode(hasher.finalize().as_bytes());
    format!("{}-{}", prefix, &digest[..10])
}
