//! # Error Types
//!
//! The reason-code taxonomy shared by every subsystem, and the decoding
//! errors of network objects.

use crate::entities::ObjectKind;
use thiserror::Error;

/// Coarse reason code attached to every rejected object or failed operation.
///
/// Callers decide how loudly to report a failure from its kind alone:
/// state conflicts are routine, invalid blocks are suspicious, internal
/// errors are bugs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// An object referenced by id is not in the store.
    NotFound,
    /// A transaction or encoding is malformed.
    InvalidObject,
    /// Bad linkage, bad proof-of-work or malformed block structure.
    InvalidBlock,
    /// Double spend or unknown input while applying a transaction.
    StateConflict,
    /// An invariant of the node itself was violated.
    Internal,
}

impl ErrorKind {
    /// Stable reason code used in logs and peer error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::InvalidObject => "INVALID_OBJECT",
            ErrorKind::InvalidBlock => "INVALID_BLOCK",
            ErrorKind::StateConflict => "STATE_CONFLICT",
            ErrorKind::Internal => "INTERNAL_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps a subsystem error onto the shared [`ErrorKind`] taxonomy.
pub trait Classify {
    /// Reason code of this error.
    fn kind(&self) -> ErrorKind;

    /// Returns true if the failure is an expected rejection rather than a bug.
    fn is_recoverable(&self) -> bool {
        self.kind() != ErrorKind::Internal
    }
}

/// Errors decoding or converting network objects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObjectError {
    /// Hex string has the wrong number of characters.
    #[error("Invalid hex length: expected {expected} chars, got {actual}")]
    InvalidHexLength {
        /// Expected number of hex characters
        expected: usize,
        /// Actual number of hex characters
        actual: usize,
    },

    /// Hex string contains a character outside `[0-9a-f]`.
    #[error("Invalid hex character in {0:?}")]
    InvalidHexCharacter(String),

    /// JSON payload does not describe a network object.
    #[error("Malformed object: {0}")]
    Malformed(String),

    /// Object decoded as the other variant of the union.
    #[error("Expected a {expected}, found a {found}")]
    KindMismatch {
        /// Variant the caller asked for
        expected: ObjectKind,
        /// Variant actually present
        found: ObjectKind,
    },
}

impl Classify for ObjectError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidObject
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_codes_are_stable() {
        assert_eq!(ErrorKind::StateConflict.to_string(), "STATE_CONFLICT");
        assert_eq!(ErrorKind::Internal.as_str(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_object_errors_are_recoverable() {
        let err = ObjectError::Malformed("missing type".into());
        assert_eq!(err.kind(), ErrorKind::InvalidObject);
        assert!(err.is_recoverable());
    }
}
