//! Nonce layout.
//!
//! ```text
//! bytes  0..8   salt, random per dispatch
//! bytes  8..16  worker slot index
//! bytes 16..24  zero
//! bytes 24..32  per-worker counter
//! ```
//!
//! Two workers of one dispatch never try the same nonce, and a new dispatch
//! almost surely starts in fresh territory.

use shared_types::Nonce;

/// Nonce space searched by one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NonceSpace {
    salt: [u8; 8],
    slot: u64,
}

impl NonceSpace {
    /// Space of `slot` under `salt`.
    pub fn new(salt: [u8; 8], slot: usize) -> Self {
        Self {
            salt,
            slot: slot as u64,
        }
    }

    /// Draw a random salt.
    pub fn random_salt() -> [u8; 8] {
        rand::random()
    }

    /// The `counter`-th nonce of this space.
    pub fn nonce(&self, counter: u64) -> Nonce {
        let mut bytes = [0u8; 32];
        bytes[0..8].copy_from_slice(&self.salt);
        bytes[8..16].copy_from_slice(&self.slot.to_be_bytes());
        bytes[24..32].copy_from_slice(&counter.to_be_bytes());
        Nonce::from_bytes(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let space = NonceSpace::new([0xaa; 8], 3);
        let nonce = space.nonce(0x0102);
        assert_eq!(
            nonce.to_hex(),
            format!(
                "{}{}{}{}",
                "aa".repeat(8),
                "0000000000000003",
                "0".repeat(16),
                "0000000000000102"
            )
        );
    }

    #[test]
    fn test_slots_are_disjoint() {
        let salt = [7u8; 8];
        let a = NonceSpace::new(salt, 0);
        let b = NonceSpace::new(salt, 1);
        for counter in 0..100 {
            assert_ne!(a.nonce(counter), b.nonce(counter));
            assert_ne!(a.nonce(counter), b.nonce(counter + 1));
        }
    }
}
