//! Content fingerprinting for uploaded documents.
//!
//! The fingerprint keys the result cache: identical bytes uploaded by
//! different users share one cache entry, so the key must depend on content
//! only, never on the document id or the uploader.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 hex digest of raw document bytes.
pub fn fingerprint(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_stable() {
        let a = fingerprint(b"announcement bytes");
        let b = fingerprint(b"announcement bytes");
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_is_content_sensitive() {
        assert_ne!(fingerprint(b"a"), fingerprint(b"b"));
    }

    #[test]
    fn test_fingerprint_is_hex_sha256() {
        let fp = fingerprint(b"");
        assert_eq!(fp.len(), 64);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
        // Known digest of the empty input.
        assert_eq!(
            fp,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
