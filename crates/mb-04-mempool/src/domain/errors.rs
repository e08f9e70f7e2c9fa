//! Mempool error types.

use mb_01_object_store::StoreError;
use mb_05_mining::MiningError;
use shared_types::{Classify, ErrorKind};
use thiserror::Error;

/// Errors of mempool operations.
///
/// Conflicting transactions are not errors: they are rejected with `false`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MempoolError {
    /// Reorg onto a tip change with no adopted block.
    #[error("Reorg has no adopted tip with computed state")]
    MissingTipState,

    /// Reading a transaction or writing the snapshot failed.
    #[error("Mempool storage error: {0}")]
    Store(#[from] StoreError),

    /// Dispatching mining work failed.
    #[error("Mining dispatch failed: {0}")]
    Mining(#[from] MiningError),
}

impl Classify for MempoolError {
    fn kind(&self) -> ErrorKind {
        match self {
            MempoolError::MissingTipState => ErrorKind::Internal,
            MempoolError::Store(err) => err.kind(),
            MempoolError::Mining(err) => err.kind(),
        }
    }
}
