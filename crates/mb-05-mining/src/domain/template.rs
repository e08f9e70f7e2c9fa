//! Block templates and mined results.

use shared_types::{Block, Nonce, ObjectId, Target, Transaction};

/// Everything of a block except its nonce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockTemplate {
    /// Parent block.
    pub previd: ObjectId,
    /// Transaction ids, coinbase first.
    pub txids: Vec<ObjectId>,
    /// Timestamp.
    pub created: u64,
    /// Target the block must meet.
    pub target: Target,
    /// Miner name.
    pub miner: Option<String>,
    /// Free-form note.
    pub note: Option<String>,
    /// Study-group identifiers.
    pub studentids: Option<Vec<String>>,
}

impl BlockTemplate {
    /// Complete the template with `nonce`.
    pub fn to_block(&self, nonce: Nonce) -> Block {
        Block {
            txids: self.txids.clone(),
            nonce,
            previd: Some(self.previd),
            created: self.created,
            target: self.target,
            miner: self.miner.clone(),
            note: self.note.clone(),
            studentids: self.studentids.clone(),
        }
    }
}

/// A template together with the coinbase its first txid refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiningJob {
    /// Block to complete.
    pub template: BlockTemplate,
    /// Coinbase minting the reward of the block.
    pub coinbase: Transaction,
}

/// A solved block, ready to be stored and announced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinedBlock {
    /// Block whose id meets its target.
    pub block: Block,
    /// Its coinbase, which is not yet in the object store.
    pub coinbase: Transaction,
}
