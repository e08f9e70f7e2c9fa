//! Error types for the mining subsystem

use shared_types::{Classify, ErrorKind};
use thiserror::Error;

/// Errors that can occur while dispatching mining work
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MiningError {
    /// Slot index outside the pool
    #[error("Invalid worker slot {slot}, pool has {size}")]
    InvalidSlot {
        /// Requested slot
        slot: usize,
        /// Pool size
        size: usize,
    },

    /// Canonical encoding of the template has no nonce field
    #[error("Block template encoding has no nonce field")]
    NonceFieldMissing,

    /// Pool configured with zero workers
    #[error("Worker pool has no slots")]
    NoWorkers,
}

impl Classify for MiningError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Internal
    }
}
