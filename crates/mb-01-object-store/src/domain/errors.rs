//! # Object Store Errors

use shared_types::{Classify, ErrorKind, ObjectError, ObjectId, ObjectKind, Outpoint};
use thiserror::Error;

/// Errors raised by a key-value backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KVStoreError {
    /// I/O error during read/write.
    #[error("KV store I/O error: {message}")]
    IOError {
        /// Underlying error message
        message: String,
    },

    /// Data corruption in the store.
    #[error("KV store corruption: {message}")]
    CorruptionError {
        /// What could not be decoded
        message: String,
    },
}

impl From<std::io::Error> for KVStoreError {
    fn from(err: std::io::Error) -> Self {
        KVStoreError::IOError {
            message: err.to_string(),
        }
    }
}

/// Errors of the [`ObjectStore`](crate::ObjectStore).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No object with this id.
    #[error("Object not found: {0}")]
    NotFound(ObjectId),

    /// Outpoint index beyond the transaction's outputs.
    #[error("Invalid outpoint {outpoint}: transaction has {outputs} outputs")]
    InvalidOutpoint {
        /// The offending outpoint
        outpoint: Outpoint,
        /// Number of outputs of the referenced transaction
        outputs: usize,
    },

    /// Stored object is of the other kind.
    #[error("Object {id} is a {found}, expected a {expected}")]
    KindMismatch {
        /// Requested id
        id: ObjectId,
        /// Kind the caller asked for
        expected: ObjectKind,
        /// Kind actually stored
        found: ObjectKind,
    },

    /// Stored bytes could not be decoded.
    #[error("Corrupt entry {key}: {message}")]
    Corrupt {
        /// Key of the entry
        key: String,
        /// Decoder message
        message: String,
    },

    /// A record could not be encoded.
    #[error("Cannot encode record {key}: {message}")]
    Encoding {
        /// Record name
        key: String,
        /// Encoder message
        message: String,
    },

    /// Backend failure.
    #[error(transparent)]
    Backend(#[from] KVStoreError),
}

impl StoreError {
    pub(crate) fn mismatch(id: ObjectId, err: ObjectError) -> Self {
        match err {
            ObjectError::KindMismatch { expected, found } => StoreError::KindMismatch {
                id,
                expected,
                found,
            },
            other => StoreError::Corrupt {
                key: id.to_hex(),
                message: other.to_string(),
            },
        }
    }
}

impl Classify for StoreError {
    fn kind(&self) -> ErrorKind {
        match self {
            StoreError::NotFound(_) => ErrorKind::NotFound,
            StoreError::InvalidOutpoint { .. } | StoreError::KindMismatch { .. } => {
                ErrorKind::InvalidObject
            }
            StoreError::Corrupt { .. } | StoreError::Encoding { .. } | StoreError::Backend(_) => {
                ErrorKind::Internal
            }
        }
    }
}

/// Reasons a received transaction is refused before it is stored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Coinbase without a height.
    #[error("Coinbase transaction has no height")]
    CoinbaseWithoutHeight,

    /// Coinbase must have exactly one output.
    #[error("Coinbase transaction has {0} outputs, expected 1")]
    CoinbaseOutputCount(usize),

    /// Only a coinbase may carry a height.
    #[error("Non-coinbase transaction carries a height")]
    UnexpectedHeight,

    /// Outpoint spent twice by one transaction.
    #[error("Outpoint {0} spent twice by the same transaction")]
    DuplicateInput(Outpoint),

    /// Input without a signature.
    #[error("Input {index} is not signed")]
    MissingSignature {
        /// Input position
        index: usize,
    },

    /// Input signature does not verify.
    #[error("Input {index} has an invalid signature")]
    InvalidSignature {
        /// Input position
        index: usize,
    },

    /// Value sum does not fit in 64 bits.
    #[error("Transaction value overflows")]
    ValueOverflow,

    /// Outputs exceed inputs.
    #[error("Outputs ({outputs}) exceed inputs ({inputs})")]
    Unbalanced {
        /// Sum of spent output values
        inputs: u64,
        /// Sum of created output values
        outputs: u64,
    },

    /// Referenced output could not be resolved.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Classify for ValidationError {
    fn kind(&self) -> ErrorKind {
        match self {
            ValidationError::Store(err) => err.kind(),
            _ => ErrorKind::InvalidObject,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let id = ObjectId::from_bytes([1; 32]);
        assert_eq!(StoreError::NotFound(id).kind(), ErrorKind::NotFound);
        assert_eq!(
            ValidationError::Store(StoreError::NotFound(id)).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            ValidationError::MissingSignature { index: 0 }.kind(),
            ErrorKind::InvalidObject
        );
        assert!(!StoreError::Backend(KVStoreError::IOError {
            message: "disk".into()
        })
        .is_recoverable());
    }
}
