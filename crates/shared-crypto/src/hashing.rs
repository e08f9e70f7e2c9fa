//! # BLAKE2s Hashing
//!
//! Object identifiers are the BLAKE2s-256 digest of an object's canonical
//! encoding. The miner hashes the same encoding millions of times per
//! second, so the hasher is reusable between candidates.

use blake2::{Blake2s256, Digest};

/// BLAKE2s-256 hash output.
pub type Hash = [u8; 32];

/// Stateful BLAKE2s-256 hasher.
#[derive(Clone, Default)]
pub struct Blake2sHasher {
    inner: Blake2s256,
}

impl Blake2sHasher {
    /// Create new hasher.
    pub fn new() -> Self {
        Self {
            inner: Blake2s256::new(),
        }
    }

    /// Update with data.
    pub fn update(&mut self, data: &[u8]) -> &mut Self {
        Digest::update(&mut self.inner, data);
        self
    }

    /// Finalize and reset the hasher for reuse.
    pub fn finalize_reset(&mut self) -> Hash {
        self.inner.finalize_reset().into()
    }

    /// Finalize and return hash.
    pub fn finalize(self) -> Hash {
        self.inner.finalize().into()
    }
}

/// Hash data with BLAKE2s-256 (one-shot).
pub fn blake2s_256(data: &[u8]) -> Hash {
    Blake2s256::digest(data).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vector() {
        // RFC 7693 Appendix B
        let hash = blake2s_256(b"abc");
        assert_eq!(
            hex::encode(hash),
            "508c5e8c327c14e2e1a72ba34eeb452f37458b209ed63a294d999b4c86675982"
        );
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(blake2s_256(b"marabu"), blake2s_256(b"marabu"));
        assert_ne!(blake2s_256(b"marabu"), blake2s_256(b"marabv"));
    }

    #[test]
    fn test_incremental_matches_one_shot() {
        let mut hasher = Blake2sHasher::new();
        hasher.update(b"hello ").update(b"world");
        assert_eq!(hasher.finalize(), blake2s_256(b"hello world"));
    }

    #[test]
    fn test_finalize_reset_reuses_hasher() {
        let mut hasher = Blake2sHasher::new();
        hasher.update(b"first");
        let first = hasher.finalize_reset();
        hasher.update(b"first");
        let second = hasher.finalize_reset();

        assert_eq!(first, second);
        assert_eq!(first, blake2s_256(b"first"));
    }
}
