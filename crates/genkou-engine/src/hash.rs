//! Content fingerprinting.
//!
//! Fingerprints identify content for change detection: equal text always
//! produces an equal fingerprint, across runs and platforms. They gate
//! no-op saves and redundant remote writes. Not security-sensitive —
//! a truncated blake3 digest is plenty for collision resistance at the
//! scale of one user's documents.

use genkou_types::Fingerprint;

/// Digest length in bytes before hex encoding (16 hex chars).
const DIGEST_BYTES: usize = 8;

/// Fingerprint a snapshot's canonical linear-text form.
///
/// Pure and infallible. Stable across runs and platforms for the same
/// input bytes.
pub fn fingerprint(text: &str) -> Fingerprint {
    let digest = blake3::hash(text.as_bytes());
    Fingerprint::from_hex(hex::encode(&digest.as_bytes()[..DIGEST_BYTES]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stable_across_calls() {
        assert_eq!(fingerprint("# Title\n\nBody."), fingerprint("# Title\n\nBody."));
    }

    #[test]
    fn test_differs_on_content_change() {
        assert_ne!(fingerprint("# Title\n\nBody."), fingerprint("# Title\n\nBody!"));
    }

    #[test]
    fn test_empty_text_has_a_fingerprint() {
        let fp = fingerprint("");
        assert_eq!(fp.as_str().len(), DIGEST_BYTES * 2);
    }

    #[test]
    fn test_known_width() {
        assert_eq!(fingerprint("x").as_str().len(), 16);
    }
}
