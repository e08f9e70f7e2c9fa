//! Error types for the chain manager

use mb_01_object_store::StoreError;
use mb_02_utxo_state::UtxoError;
use shared_types::{Classify, ErrorKind, ObjectId, Target};

/// Reasons a block is rejected, or the chain manager fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    #[error("Unknown parent block: {0}")]
    UnknownParent(ObjectId),

    #[error("Block {0} has no parent but is not the genesis block")]
    GenesisMismatch(ObjectId),

    #[error("Ancestry of {block} exceeds {limit} unvalidated blocks")]
    AncestryTooDeep { block: ObjectId, limit: usize },

    #[error("Invalid ancestor {ancestor}: {reason}")]
    InvalidAncestor {
        ancestor: ObjectId,
        reason: Box<ChainError>,
    },

    #[error("Invalid target {declared}, expected {expected}")]
    InvalidTarget { declared: Target, expected: Target },

    #[error("Block id {0} does not meet its target")]
    InsufficientWork(ObjectId),

    #[error("Invalid timestamp: block {block} <= parent {parent}")]
    TimestampNotAfterParent { block: u64, parent: u64 },

    #[error("Timestamp in the future: {timestamp}, current is {current}")]
    FutureTimestamp { timestamp: u64, current: u64 },

    #[error("Unknown transaction: {0}")]
    UnknownTransaction(ObjectId),

    #[error("Object {0} listed in txids is not a transaction")]
    NotATransaction(ObjectId),

    #[error("First transaction is not a coinbase")]
    MissingCoinbase,

    #[error("Coinbase {0} is not the first transaction")]
    CoinbaseNotFirst(ObjectId),

    #[error("Coinbase height {declared:?} does not match block height {expected}")]
    CoinbaseHeight { declared: Option<u64>, expected: u64 },

    #[error("Coinbase has {0} outputs, expected 1")]
    CoinbaseOutputs(usize),

    #[error("Transaction {0} spends the coinbase of its own block")]
    CoinbaseSpentInBlock(ObjectId),

    #[error("Coinbase mints {minted}, allowed at most {allowed}")]
    CoinbaseExceedsReward { minted: u64, allowed: u64 },

    #[error("Block value overflows")]
    ValueOverflow,

    #[error("Transaction {txid} conflicts with parent state: {source}")]
    StateConflict {
        txid: ObjectId,
        #[source]
        source: UtxoError,
    },

    #[error("No state recorded for block {0}")]
    MissingState(ObjectId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Classify for ChainError {
    fn kind(&self) -> ErrorKind {
        match self {
            ChainError::StateConflict { .. } => ErrorKind::StateConflict,
            ChainError::MissingState(_) => ErrorKind::Internal,
            ChainError::Store(err) => match err.kind() {
                ErrorKind::Internal => ErrorKind::Internal,
                _ => ErrorKind::InvalidBlock,
            },
            ChainError::InvalidAncestor { reason, .. } => match reason.kind() {
                ErrorKind::Internal => ErrorKind::Internal,
                _ => ErrorKind::InvalidBlock,
            },
            _ => ErrorKind::InvalidBlock,
        }
    }
}

/// Result type for chain operations
pub type ChainResult<T> = Result<T, ChainError>;

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::Outpoint;

    #[test]
    fn test_reason_codes() {
        let id = ObjectId::from_bytes([1; 32]);
        assert_eq!(ChainError::UnknownParent(id).kind(), ErrorKind::InvalidBlock);
        assert_eq!(
            ChainError::StateConflict {
                txid: id,
                source: UtxoError::MissingOutpoint(Outpoint::new(id, 0)),
            }
            .kind(),
            ErrorKind::StateConflict
        );
        assert_eq!(ChainError::MissingState(id).kind(), ErrorKind::Internal);
        assert_eq!(
            ChainError::InvalidAncestor {
                ancestor: id,
                reason: Box::new(ChainError::MissingCoinbase),
            }
            .kind(),
            ErrorKind::InvalidBlock
        );
    }

    #[test]
    fn test_coinbase_height_message() {
        let missing = ChainError::CoinbaseHeight {
            declared: None,
            expected: 3,
        };
        assert_eq!(
            missing.to_string(),
            "Coinbase height None does not match block height 3"
        );

        let wrong = ChainError::CoinbaseHeight {
            declared: Some(2),
            expected: 3,
        };
        assert_eq!(
            wrong.to_string(),
            "Coinbase height Some(2) does not match block height 3"
        );
    }
}
