//! # Type-State Lifecycle
//!
//! Each lifecycle stage is a distinct type. `load` consumes the
//! uninitialized mempool and returns the loaded one; there is no way back.

use mb_02_utxo_state::UtxoSet;
use shared_types::{ObjectId, Transaction};

/// Marker: the snapshot has not been loaded yet.
#[derive(Debug, Clone, Copy, Default)]
pub struct Uninitialized;

/// Stage data of a loaded mempool.
#[derive(Debug, Clone, Default)]
pub struct Loaded {
    /// Pending transactions in admission order.
    pub(crate) txs: Vec<(ObjectId, Transaction)>,
    /// Tip state with every pending transaction applied.
    pub(crate) state: UtxoSet,
}

impl Loaded {
    /// Stage on top of `base` with nothing pending.
    pub(crate) fn on(base: UtxoSet) -> Self {
        Self {
            txs: Vec::new(),
            state: base,
        }
    }
}
