//! Chain Manager Service
//!
//! Owns the validated block tree, the best tip and every block's
//! `state_after`. Callers serialise access; the manager itself holds no lock.

use crate::domain::block_validation::validate_block;
use crate::domain::chain::{ChainEntry, ChainState, TipChange};
use crate::domain::error::{ChainError, ChainResult};
use crate::domain::params::ConsensusParams;
use crate::ports::outbound::TimeSource;
use mb_01_object_store::{KeyValueStore, ObjectStore, StoreError};
use mb_02_utxo_state::UtxoSet;
use serde::{Deserialize, Serialize};
use shared_types::{Block, ObjectId};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Record key of the persisted best tip.
pub const TIP_RECORD_KEY: &str = "chain:tip";

/// Persisted best tip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TipRecord {
    /// Tip block id.
    pub tip: ObjectId,
    /// Tip height.
    pub height: u64,
}

/// Result of submitting a block.
#[derive(Debug, Clone)]
pub enum BlockOutcome {
    /// The block (and any unvalidated ancestors) was validated and stored.
    Added {
        /// Block id.
        id: ObjectId,
        /// Block height.
        height: u64,
        /// Present when the block became the new best tip.
        tip_change: Option<TipChange>,
    },
    /// The block was validated before.
    AlreadyKnown(ObjectId),
}

impl BlockOutcome {
    /// Id of the submitted block.
    pub fn id(&self) -> ObjectId {
        match self {
            BlockOutcome::Added { id, .. } | BlockOutcome::AlreadyKnown(id) => *id,
        }
    }

    /// Tip change caused by the block, if any.
    pub fn tip_change(&self) -> Option<&TipChange> {
        match self {
            BlockOutcome::Added { tip_change, .. } => tip_change.as_ref(),
            BlockOutcome::AlreadyKnown(_) => None,
        }
    }
}

/// Chain manager in the *ready* state.
///
/// The only constructor is [`ChainManager::init`], so a manager that has not
/// loaded genesis and its persisted tip cannot exist.
pub struct ChainManager<S: KeyValueStore> {
    store: Arc<ObjectStore<S>>,
    params: ConsensusParams,
    time: Arc<dyn TimeSource>,
    state: ChainState,
}

impl<S: KeyValueStore> ChainManager<S> {
    /// Bootstrap genesis and restore the persisted tip.
    ///
    /// The state of every block on the path from genesis to the persisted
    /// tip is re-derived by validating the path from the object store. If
    /// the persisted tip cannot be validated the manager starts at genesis.
    pub fn init(
        store: Arc<ObjectStore<S>>,
        params: ConsensusParams,
        time: Arc<dyn TimeSource>,
    ) -> ChainResult<Self> {
        let genesis_id = store.put_block(&params.genesis)?;
        let genesis = ChainEntry {
            id: genesis_id,
            block: params.genesis.clone(),
            height: 0,
            state_after: Arc::new(UtxoSet::new()),
        };

        let mut manager = Self {
            store,
            params,
            time,
            state: ChainState::with_genesis(genesis),
        };

        match manager.store.get_record::<TipRecord>(TIP_RECORD_KEY)? {
            Some(record) if record.tip != genesis_id => {
                // A rejected record is kept so a later start can retry it.
                match manager.restore_tip(&record) {
                    Ok(()) => info!(
                        "[mb-03] Restored tip {} at height {}",
                        record.tip, record.height
                    ),
                    Err(e) => warn!(
                        "[mb-03] Persisted tip {} rejected ({}), starting from genesis",
                        record.tip, e
                    ),
                }
            }
            _ => {
                info!("[mb-03] Starting from genesis {}", genesis_id);
                manager.persist_tip()?;
            }
        }

        Ok(manager)
    }

    fn restore_tip(&mut self, record: &TipRecord) -> ChainResult<()> {
        let block = self.store.get_block(&record.tip)?;
        // Every block on the path was accepted before, so the clock is not
        // consulted: it may have moved backwards since.
        let accepted = self.resolve(&block, record.tip, usize::MAX, u64::MAX)?;
        let tip = self.commit(accepted)?;
        self.state.choose(&tip)?;
        Ok(())
    }

    /// Validate a block, updating the best tip by the longest-chain rule.
    ///
    /// Unvalidated ancestors found in the object store are validated first,
    /// oldest first. Either the block and all of them are accepted, or
    /// nothing is retained.
    pub fn on_block(&mut self, block: &Block) -> ChainResult<BlockOutcome> {
        let id = block.id();
        if self.state.contains(&id) {
            return Ok(BlockOutcome::AlreadyKnown(id));
        }

        let now = self.time.now();
        let accepted = self.resolve(block, id, self.params.max_ancestry_depth, now)?;
        self.store.put_block(block)?;
        let entry = self.commit(accepted)?;

        let height = entry.height;
        let tip_change = self.state.choose(&entry)?;
        if let Some(change) = &tip_change {
            self.persist_tip()?;
            info!(
                "[mb-03] New tip {} at height {} (lca height {}, -{} +{})",
                id,
                height,
                change.lca.height,
                change.short_fork.len(),
                change.long_fork.len()
            );
        } else {
            debug!("[mb-03] Added side block {} at height {}", id, height);
        }

        Ok(BlockOutcome::Added {
            id,
            height,
            tip_change,
        })
    }

    /// Validate `block` and every unvalidated ancestor without retaining
    /// anything. Returns the new entries oldest first, `block` last.
    fn resolve(
        &self,
        block: &Block,
        id: ObjectId,
        limit: usize,
        now: u64,
    ) -> ChainResult<Vec<Arc<ChainEntry>>> {
        let mut pending = vec![(id, block.clone())];
        let mut cursor = block.previd;

        let parent = loop {
            let Some(parent_id) = cursor else {
                let oldest = pending[pending.len() - 1].0;
                return Err(ChainError::GenesisMismatch(oldest));
            };
            if let Some(parent) = self.state.entry(&parent_id) {
                break parent.clone();
            }
            if pending.len() > limit {
                return Err(ChainError::AncestryTooDeep { block: id, limit });
            }
            let ancestor = match self.store.get_block(&parent_id) {
                Ok(ancestor) => ancestor,
                Err(StoreError::NotFound(_)) | Err(StoreError::KindMismatch { .. }) => {
                    return Err(ChainError::UnknownParent(parent_id));
                }
                Err(e) => return Err(e.into()),
            };
            cursor = ancestor.previd;
            pending.push((parent_id, ancestor));
        };

        let mut accepted = Vec::with_capacity(pending.len());
        let mut tip = parent;
        for (block_id, candidate) in pending.iter().rev() {
            let entry = validate_block(candidate, *block_id, &tip, &self.params, &self.store, now)
                .map_err(|reason| {
                    if *block_id == id {
                        reason
                    } else {
                        ChainError::InvalidAncestor {
                            ancestor: *block_id,
                            reason: Box::new(reason),
                        }
                    }
                })?;
            tip = Arc::new(entry);
            accepted.push(tip.clone());
        }
        Ok(accepted)
    }

    /// Add validated entries to the block tree; returns the last one.
    fn commit(&mut self, accepted: Vec<Arc<ChainEntry>>) -> ChainResult<Arc<ChainEntry>> {
        let last = accepted
            .last()
            .cloned()
            .ok_or(ChainError::MissingState(self.state.tip().id))?;
        for entry in accepted {
            self.state.insert(entry);
        }
        Ok(last)
    }

    fn persist_tip(&self) -> ChainResult<()> {
        let tip = self.state.tip();
        self.store.put_record(
            TIP_RECORD_KEY,
            &TipRecord {
                tip: tip.id,
                height: tip.height,
            },
        )?;
        Ok(())
    }

    /// Current best tip.
    pub fn tip(&self) -> &Arc<ChainEntry> {
        self.state.tip()
    }

    /// Height of the best tip.
    pub fn height(&self) -> u64 {
        self.state.height()
    }

    /// State after the best tip.
    pub fn tip_state(&self) -> Arc<UtxoSet> {
        self.state.tip().state_after.clone()
    }

    /// A validated block.
    pub fn entry(&self, id: &ObjectId) -> Option<&Arc<ChainEntry>> {
        self.state.entry(id)
    }

    /// Returns true if `id` is a validated block.
    pub fn contains(&self, id: &ObjectId) -> bool {
        self.state.contains(id)
    }

    /// Number of validated blocks, genesis included.
    pub fn block_count(&self) -> usize {
        self.state.block_count()
    }

    /// Consensus parameters in force.
    pub fn params(&self) -> &ConsensusParams {
        &self.params
    }

    /// The object store blocks are read from.
    pub fn store(&self) -> &Arc<ObjectStore<S>> {
        &self.store
    }
}
