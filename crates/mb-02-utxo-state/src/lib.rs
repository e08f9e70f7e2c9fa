//! # UTXO State (mb-02)
//!
//! The set of currently unspent outpoints and the state-transition function
//! of a single transaction.
//!
//! ## Invariants
//!
//! - `apply` and `revert` are all-or-nothing: on error the set is unchanged
//! - An outpoint is never unspent twice
//! - Iteration order is the outpoint order, so snapshots are deterministic

pub mod domain;

pub use domain::errors::UtxoError;
pub use domain::utxo_set::UtxoSet;
