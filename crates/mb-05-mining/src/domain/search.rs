//! The nonce search loop.
//!
//! The template is encoded once. Each candidate overwrites the 64 hex
//! characters of the nonce in place and rehashes the buffer, avoiding any
//! per-attempt allocation.

use super::nonce::NonceSpace;
use super::template::BlockTemplate;
use crate::error::MiningError;
use shared_crypto::Blake2sHasher;
use shared_types::{Nonce, ObjectId, Target};
use std::sync::atomic::{AtomicBool, Ordering};

const NONCE_MARKER: &[u8] = b"\"nonce\":\"";
const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Reusable proof-of-work search over one template.
#[derive(Clone)]
pub struct NonceSearch {
    encoded: Vec<u8>,
    offset: usize,
    target: Target,
    hasher: Blake2sHasher,
}

impl NonceSearch {
    /// Prepare the search for `template`.
    pub fn new(template: &BlockTemplate) -> Result<Self, MiningError> {
        let encoded = template.to_block(Nonce::from_bytes([0; 32])).canonical_bytes();
        // String values are escaped, so the marker can only match the key.
        let offset = encoded
            .windows(NONCE_MARKER.len())
            .position(|w| w == NONCE_MARKER)
            .map(|p| p + NONCE_MARKER.len())
            .ok_or(MiningError::NonceFieldMissing)?;

        Ok(Self {
            encoded,
            offset,
            target: template.target,
            hasher: Blake2sHasher::new(),
        })
    }

    /// Block id the template would have with `nonce`.
    pub fn id_with(&mut self, nonce: &Nonce) -> ObjectId {
        let slot = &mut self.encoded[self.offset..self.offset + 64];
        for (i, byte) in nonce.as_bytes().iter().enumerate() {
            slot[2 * i] = HEX_DIGITS[(byte >> 4) as usize];
            slot[2 * i + 1] = HEX_DIGITS[(byte & 0x0f) as usize];
        }
        ObjectId::from_bytes(self.hasher.update(&self.encoded).finalize_reset())
    }

    /// Returns true if `nonce` solves the template.
    pub fn try_nonce(&mut self, nonce: &Nonce) -> bool {
        let target = self.target;
        self.id_with(nonce).meets(&target)
    }

    /// Search `space` from counter zero, checking `cancel` every `batch`
    /// attempts. Returns the first solving nonce, or `None` once cancelled.
    pub fn run(&mut self, space: NonceSpace, batch: u64, cancel: &AtomicBool) -> Option<Nonce> {
        let batch = batch.max(1);
        let mut counter = 0u64;
        loop {
            if cancel.load(Ordering::Relaxed) {
                return None;
            }
            for _ in 0..batch {
                let nonce = space.nonce(counter);
                if self.try_nonce(&nonce) {
                    return Some(nonce);
                }
                counter = counter.wrapping_add(1);
            }
        }
    }
}
