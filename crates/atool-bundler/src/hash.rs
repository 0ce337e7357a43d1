//! BLAKE3 content hashes used in file names and build stats.

use blake3::Hasher;

/// Full hex digest of `content`.
pub fn content_hash(content: &[u8]) -> String {
    blake3::hash(content).to_hex().to_string()
}

/// Digest over an ordered list of hashes, e.g. all chunk hashes of a build.
pub fn combined_hash<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    let mut hasher = Hasher::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update(b"\0"); // separator
    }
    hasher.finalize().to_hex().to_string()
}

/// First `len` characters of a hex digest.
pub fn short(hash: &str, len: usize) -> &str {
    &hash[..len.min(hash.len())]
}
