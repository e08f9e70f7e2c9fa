//! Domain layer of the UTXO state.

pub mod errors;
pub mod utxo_set;
