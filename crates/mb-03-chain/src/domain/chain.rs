//! Chain state management
//!
//! Validated blocks form a tree rooted at genesis. The tip is the highest
//! block, first seen winning ties.

use super::error::{ChainError, ChainResult};
use mb_02_utxo_state::UtxoSet;
use shared_types::{Block, ObjectId};
use std::collections::HashMap;
use std::sync::Arc;

/// A validated block and the state it produces.
#[derive(Debug)]
pub struct ChainEntry {
    /// Block id.
    pub id: ObjectId,
    /// The block itself.
    pub block: Block,
    /// Distance from genesis; genesis is at height 0.
    pub height: u64,
    /// UTXO set after applying every transaction of the block on top of the
    /// parent's state.
    pub state_after: Arc<UtxoSet>,
}

/// Blocks from some ancestor towards a tip, oldest first.
pub type Chain = Vec<Arc<ChainEntry>>;

/// Description of a best-tip change.
///
/// `short_fork` holds the blocks abandoned by the old best chain and
/// `long_fork` the blocks adopted by the new one, both oldest first and both
/// excluding `lca`. A plain extension of the tip has an empty short fork.
#[derive(Debug, Clone)]
pub struct TipChange {
    /// Lowest common ancestor of the old and the new tip.
    pub lca: Arc<ChainEntry>,
    /// Abandoned blocks.
    pub short_fork: Chain,
    /// Adopted blocks; never empty, the last one is the new tip.
    pub long_fork: Chain,
}

impl TipChange {
    /// The adopted tip.
    pub fn new_tip(&self) -> &Arc<ChainEntry> {
        self.long_fork.last().unwrap_or(&self.lca)
    }

    /// Returns true if blocks of the previous best chain were abandoned.
    pub fn is_reorg(&self) -> bool {
        !self.short_fork.is_empty()
    }
}

/// Chain state tracking validated blocks
pub struct ChainState {
    entries: HashMap<ObjectId, Arc<ChainEntry>>,
    tip: Arc<ChainEntry>,
}

impl ChainState {
    /// Chain state containing only the genesis entry.
    pub fn with_genesis(genesis: ChainEntry) -> Self {
        let genesis = Arc::new(genesis);
        let mut entries = HashMap::new();
        entries.insert(genesis.id, genesis.clone());
        Self {
            entries,
            tip: genesis,
        }
    }

    /// Check if a block is validated
    pub fn contains(&self, id: &ObjectId) -> bool {
        self.entries.contains_key(id)
    }

    /// Get a validated block
    pub fn entry(&self, id: &ObjectId) -> Option<&Arc<ChainEntry>> {
        self.entries.get(id)
    }

    /// Current best tip
    pub fn tip(&self) -> &Arc<ChainEntry> {
        &self.tip
    }

    /// Height of the best tip
    pub fn height(&self) -> u64 {
        self.tip.height
    }

    /// Count of validated blocks
    pub fn block_count(&self) -> usize {
        self.entries.len()
    }

    /// Add a validated block. Its parent must already be present.
    pub fn insert(&mut self, entry: Arc<ChainEntry>) {
        self.entries.insert(entry.id, entry);
    }

    /// Apply the longest-chain rule to `candidate`.
    ///
    /// The candidate becomes tip only with strictly greater height, so the
    /// first-seen block wins a tie.
    pub fn choose(&mut self, candidate: &Arc<ChainEntry>) -> ChainResult<Option<TipChange>> {
        if candidate.height <= self.tip.height {
            return Ok(None);
        }
        let change = self.fork_between(&self.tip.clone(), candidate)?;
        self.tip = candidate.clone();
        Ok(Some(change))
    }

    fn parent(&self, entry: &ChainEntry) -> ChainResult<Arc<ChainEntry>> {
        entry
            .block
            .previd
            .and_then(|id| self.entries.get(&id).cloned())
            .ok_or(ChainError::MissingState(entry.id))
    }

    /// Compute LCA and both forks between `old` and `new`.
    pub fn fork_between(
        &self,
        old: &Arc<ChainEntry>,
        new: &Arc<ChainEntry>,
    ) -> ChainResult<TipChange> {
        let mut short_fork = Vec::new();
        let mut long_fork = Vec::new();
        let mut a = old.clone();
        let mut b = new.clone();

        while a.height > b.height {
            short_fork.push(a.clone());
            a = self.parent(&a)?;
        }
        while b.height > a.height {
            long_fork.push(b.clone());
            b = self.parent(&b)?;
        }
        while a.id != b.id {
            short_fork.push(a.clone());
            long_fork.push(b.clone());
            a = self.parent(&a)?;
            b = self.parent(&b)?;
        }

        short_fork.reverse();
        long_fork.reverse();
        Ok(TipChange {
            lca: a,
            short_fork,
            long_fork,
        })
    }

    /// Blocks from genesis to `id`, oldest first. Empty if `id` is unknown.
    pub fn path_to(&self, id: &ObjectId) -> Chain {
        let mut path = Vec::new();
        let mut cursor = self.entries.get(id).cloned();
        while let Some(entry) = cursor {
            cursor = entry
                .block
                .previd
                .and_then(|prev| self.entries.get(&prev).cloned());
            path.push(entry);
        }
        path.reverse();
        path
    }
}
