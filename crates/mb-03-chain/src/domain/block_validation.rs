//! Per-block consensus checks.

use super::chain::ChainEntry;
use super::error::{ChainError, ChainResult};
use super::params::ConsensusParams;
use mb_01_object_store::{KeyValueStore, ObjectStore, StoreError};
use shared_types::{Block, ObjectId, Transaction};
use std::sync::Arc;

/// Validate `block` (with id `id`) on top of its validated `parent`.
///
/// Checks run in order: target, proof-of-work, timestamps, transaction
/// resolution, coinbase placement and height, coinbase spends, coinbase
/// value, then state. Nothing is mutated; the returned entry carries the
/// state after the block.
pub fn validate_block<S: KeyValueStore>(
    block: &Block,
    id: ObjectId,
    parent: &ChainEntry,
    params: &ConsensusParams,
    store: &ObjectStore<S>,
    now: u64,
) -> ChainResult<ChainEntry> {
    let height = parent.height + 1;

    let expected = params.target_at(height);
    if block.target != expected {
        return Err(ChainError::InvalidTarget {
            declared: block.target,
            expected,
        });
    }
    if !id.meets(&block.target) {
        return Err(ChainError::InsufficientWork(id));
    }

    if block.created <= parent.block.created {
        return Err(ChainError::TimestampNotAfterParent {
            block: block.created,
            parent: parent.block.created,
        });
    }
    if block.created > now {
        return Err(ChainError::FutureTimestamp {
            timestamp: block.created,
            current: now,
        });
    }

    let txs = resolve_transactions(block, store)?;

    let (coinbase_id, coinbase) = txs.first().ok_or(ChainError::MissingCoinbase)?;
    if !coinbase.is_coinbase() {
        return Err(ChainError::MissingCoinbase);
    }
    if let Some((extra, _)) = txs.iter().skip(1).find(|(_, tx)| tx.is_coinbase()) {
        return Err(ChainError::CoinbaseNotFirst(*extra));
    }
    if coinbase.height != Some(height) {
        return Err(ChainError::CoinbaseHeight {
            declared: coinbase.height,
            expected: height,
        });
    }
    if coinbase.outputs.len() != 1 {
        return Err(ChainError::CoinbaseOutputs(coinbase.outputs.len()));
    }

    let mut fees = 0u64;
    for (txid, tx) in txs.iter().skip(1) {
        if tx.inputs.iter().any(|i| i.outpoint.txid == *coinbase_id) {
            return Err(ChainError::CoinbaseSpentInBlock(*txid));
        }
        fees = fees
            .checked_add(transaction_fee(tx, store)?)
            .ok_or(ChainError::ValueOverflow)?;
    }

    let minted = coinbase.output_sum().ok_or(ChainError::ValueOverflow)?;
    let allowed = params
        .block_reward
        .checked_add(fees)
        .ok_or(ChainError::ValueOverflow)?;
    if minted > allowed {
        return Err(ChainError::CoinbaseExceedsReward { minted, allowed });
    }

    let mut state = (*parent.state_after).clone();
    for (txid, tx) in &txs {
        state
            .apply(txid, tx)
            .map_err(|source| ChainError::StateConflict {
                txid: *txid,
                source,
            })?;
    }

    Ok(ChainEntry {
        id,
        block: block.clone(),
        height,
        state_after: Arc::new(state),
    })
}

fn resolve_transactions<S: KeyValueStore>(
    block: &Block,
    store: &ObjectStore<S>,
) -> ChainResult<Vec<(ObjectId, Transaction)>> {
    block
        .txids
        .iter()
        .map(|txid| match store.get_transaction(txid) {
            Ok(tx) => Ok((*txid, tx)),
            Err(StoreError::NotFound(_)) => Err(ChainError::UnknownTransaction(*txid)),
            Err(StoreError::KindMismatch { .. }) => Err(ChainError::NotATransaction(*txid)),
            Err(other) => Err(other.into()),
        })
        .collect()
}

/// Inputs minus outputs of a stored, validated transaction.
fn transaction_fee<S: KeyValueStore>(tx: &Transaction, store: &ObjectStore<S>) -> ChainResult<u64> {
    let mut inputs = 0u64;
    for input in &tx.inputs {
        let spent = store.output(&input.outpoint)?;
        inputs = inputs
            .checked_add(spent.value)
            .ok_or(ChainError::ValueOverflow)?;
    }
    let outputs = tx.output_sum().ok_or(ChainError::ValueOverflow)?;
    Ok(inputs.saturating_sub(outputs))
}
