//! Content fingerprints and the per-run dedup gate.
//!
//! A [`Fingerprint`] is the SHA-256 digest of a content string. The
//! [`FingerprintStore`] keeps every fingerprint accepted during one run, up
//! to a fixed capacity. Past that capacity new fingerprints are still
//! compared against the retained set but no longer stored, so duplicates of
//! late-run content may slip through. Nothing is persisted between runs.

use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, warn};

/// SHA-256 digest of a content string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn of(content: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        Self(hasher.finalize().into())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Set of fingerprints seen during a single pipeline run.
#[derive(Debug)]
pub struct FingerprintStore {
    seen: HashSet<Fingerprint>,
    capacity: usize,
    warned_full: bool,
}

impl FingerprintStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            seen: HashSet::with_capacity(capacity.min(1024)),
            capacity,
            warned_full: false,
        }
    }

    /// Returns `true` if `content` must be rejected as a duplicate.
    ///
    /// Empty content is always a duplicate and is never registered. New
    /// content is registered while capacity remains.
    pub fn is_duplicate(&mut self, content: &str) -> bool {
        if content.is_empty() {
            return true;
        }

        let fingerprint = Fingerprint::of(content);
        if self.seen.contains(&fingerprint) {
            debug!(%fingerprint, "fingerprint already seen");
            return true;
        }

        if self.seen.len() < self.capacity {
            self.seen.insert(fingerprint);
        } else if !self.warned_full {
            warn!(
                capacity = self.capacity,
                "fingerprint store full; later duplicates may go undetected"
            );
            self.warned_full = true;
        }
        false
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_sighting_is_duplicate() {
        let mut store = FingerprintStore::new(10);
        assert!(!store.is_duplicate("int main(void) { return 0; }"));
        assert!(store.is_duplicate("int main(void) { return 0; }"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_distinct_content_not_duplicate() {
        let mut store = FingerprintStore::new(10);
        assert!(!store.is_duplicate("alpha"));
        assert!(!store.is_duplicate("beta"));
        assert!(!store.is_duplicate("alpha "));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_empty_is_duplicate_without_registering() {
        let mut store = FingerprintStore::new(10);
        assert!(store.is_duplicate(""));
        assert!(store.is_duplicate(""));
        assert!(store.is_empty());
    }

    #[test]
    fn test_full_store_stops_retaining() {
        let mut store = FingerprintStore::new(2);
        assert!(!store.is_duplicate("one"));
        assert!(!store.is_duplicate("two"));
        assert_eq!(store.len(), 2);

        // Retained content is still caught.
        assert!(store.is_duplicate("one"));

        // New content is compared but not stored.
        assert!(!store.is_duplicate("three"));
        assert!(!store.is_duplicate("three"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_zero_capacity_never_retains() {
        let mut store = FingerprintStore::new(0);
        assert!(!store.is_duplicate("x"));
        assert!(!store.is_duplicate("x"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_fingerprint_hex() {
        let fp = Fingerprint::of("abc");
        assert_eq!(
            fp.to_string(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_isolated_instances() {
        let mut a = FingerprintStore::new(10);
        let mut b = FingerprintStore::new(10);
        assert!(!a.is_duplicate("shared"));
        assert!(!b.is_duplicate("shared"));
    }
}
