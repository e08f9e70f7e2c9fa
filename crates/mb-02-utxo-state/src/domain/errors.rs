//! # UTXO Errors

use shared_types::{Classify, ErrorKind, Outpoint};
use thiserror::Error;

/// Ways a transaction conflicts with a UTXO set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UtxoError {
    /// Input is unknown or already spent.
    #[error("Outpoint {0} is not unspent")]
    MissingOutpoint(Outpoint),

    /// Transaction spends the same outpoint twice.
    #[error("Outpoint {0} spent twice in one transaction")]
    DuplicateInput(Outpoint),

    /// Output would be created twice.
    #[error("Outpoint {0} already exists")]
    OutputExists(Outpoint),
}

impl Classify for UtxoError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::StateConflict
    }
}
