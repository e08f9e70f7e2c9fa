//! Errors surfaced by the node runtime.

use mb_01_object_store::{KVStoreError, StoreError, ValidationError};
use mb_03_chain::ChainError;
use mb_04_mempool::MempoolError;
use shared_types::{Classify, ErrorKind};
use thiserror::Error;

/// Failure while handling one inbound object or mining event.
#[derive(Debug, Error)]
pub enum NodeError {
    /// The transaction object is invalid.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The chain manager rejected a block.
    #[error(transparent)]
    Chain(#[from] ChainError),

    /// Mempool reconciliation or mining dispatch failed.
    #[error(transparent)]
    Mempool(#[from] MempoolError),

    /// Object store access failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Opening the storage backend failed.
    #[error("Cannot open storage: {0}")]
    Storage(#[from] KVStoreError),
}

impl Classify for NodeError {
    fn kind(&self) -> ErrorKind {
        match self {
            NodeError::Validation(e) => e.kind(),
            NodeError::Chain(e) => e.kind(),
            NodeError::Mempool(e) => e.kind(),
            NodeError::Store(e) => e.kind(),
            NodeError::Storage(_) => ErrorKind::Internal,
        }
    }
}
