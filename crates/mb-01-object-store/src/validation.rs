//! # Transaction Object Validation
//!
//! Checks a received transaction against the outputs it spends before it is
//! admitted to the store. Whether those outputs are still unspent is a
//! question for the UTXO state, not for this validator.

use crate::domain::errors::ValidationError;
use crate::ports::outbound::KeyValueStore;
use crate::service::ObjectStore;
use shared_types::Transaction;
use std::collections::HashSet;
use std::sync::Arc;

/// Validates transactions against the object store.
pub struct ObjectValidator<S: KeyValueStore> {
    store: Arc<ObjectStore<S>>,
}

impl<S: KeyValueStore> ObjectValidator<S> {
    /// Create a validator reading from `store`.
    pub fn new(store: Arc<ObjectStore<S>>) -> Self {
        Self { store }
    }

    /// Validate a transaction object.
    ///
    /// # Checks
    ///
    /// 1. Coinbase shape: a height and exactly one output
    /// 2. Non-coinbase carries no height and spends each outpoint once
    /// 3. Every input resolves to a stored output
    /// 4. Every input is signed by the spent output's owner
    /// 5. Inputs cover outputs, without overflow
    pub fn validate_transaction(&self, tx: &Transaction) -> Result<(), ValidationError> {
        if tx.is_coinbase() {
            if tx.height.is_none() {
                return Err(ValidationError::CoinbaseWithoutHeight);
            }
            if tx.outputs.len() != 1 {
                return Err(ValidationError::CoinbaseOutputCount(tx.outputs.len()));
            }
            return Ok(());
        }

        if tx.height.is_some() {
            return Err(ValidationError::UnexpectedHeight);
        }

        let mut seen = HashSet::with_capacity(tx.inputs.len());
        let message = tx.signing_message();
        let mut input_sum = 0u64;

        for (index, input) in tx.inputs.iter().enumerate() {
            if !seen.insert(input.outpoint) {
                return Err(ValidationError::DuplicateInput(input.outpoint));
            }

            let spent = self.store.output(&input.outpoint)?;

            let sig = input
                .sig
                .ok_or(ValidationError::MissingSignature { index })?;
            spent
                .pubkey
                .verify(&message, &sig)
                .map_err(|_| ValidationError::InvalidSignature { index })?;

            input_sum = input_sum
                .checked_add(spent.value)
                .ok_or(ValidationError::ValueOverflow)?;
        }

        let output_sum = tx.output_sum().ok_or(ValidationError::ValueOverflow)?;
        if output_sum > input_sum {
            return Err(ValidationError::Unbalanced {
                inputs: input_sum,
                outputs: output_sum,
            });
        }

        Ok(())
    }
}
