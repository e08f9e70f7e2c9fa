//! # Node
//!
//! Single logical mutator over the chain manager and the mempool. Inbound
//! objects, mining ticks and mined blocks all take the same lock, so the
//! tip pointer and the mempool state are never mutated concurrently.
//!
//! ```text
//! peer object ──→ on_object ──┬─ tx ───→ validate → store → mempool
//!                             └─ block → chain.on_block ─→ mempool.reorg
//!                                                       └─→ mempool.mine (gated)
//! interval ────→ mine_tick ──→ mempool.mine
//! workers ─────→ on_mined ───→ store coinbase → on_block → announce
//! ```

use crate::error::NodeError;
use crate::ports::peers::PeerSet;
use mb_01_object_store::{KeyValueStore, ObjectStore, ObjectValidator};
use mb_02_utxo_state::UtxoSet;
use mb_03_chain::{BlockOutcome, ChainManager, ConsensusParams, TimeSource, TipRecord};
use mb_04_mempool::{Mempool, MempoolConfig};
use mb_05_mining::{MinedBlock, MiningJob};
use shared_types::{Block, Classify, ErrorKind, NetworkObject, ObjectId, Transaction};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, warn};

/// When the node mines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MiningGate {
    /// Periodic mining on the interval tick.
    pub enabled: bool,
    /// Tip changes restart mining only from this height on.
    pub activation_height: u64,
}

impl MiningGate {
    fn on_tip_change(&self, height: u64) -> bool {
        self.enabled && height >= self.activation_height
    }
}

/// Result of handling one inbound object.
#[derive(Debug, Clone)]
pub enum ObjectOutcome {
    /// A valid transaction was stored.
    Transaction {
        /// Transaction id
        id: ObjectId,
        /// Whether it joined the pending set
        admitted: bool,
    },
    /// A block was handled by the chain manager.
    Block(BlockOutcome),
}

struct Core<S: KeyValueStore> {
    chain: ChainManager<S>,
    mempool: Mempool<S>,
}

/// A running node.
pub struct Node<S: KeyValueStore> {
    store: Arc<ObjectStore<S>>,
    validator: ObjectValidator<S>,
    core: Mutex<Core<S>>,
    peers: Arc<dyn PeerSet>,
    gate: MiningGate,
}

impl<S: KeyValueStore> Node<S> {
    /// Restore the chain and the mempool from `store`.
    ///
    /// Blocks found by the miner workers arrive on the returned receiver and
    /// must be handed back through [`Node::on_mined`].
    pub fn new(
        store: Arc<ObjectStore<S>>,
        params: ConsensusParams,
        time: Arc<dyn TimeSource>,
        mempool_config: MempoolConfig,
        gate: MiningGate,
        peers: Arc<dyn PeerSet>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<MinedBlock>), NodeError> {
        let chain = ChainManager::init(store.clone(), params.clone(), time.clone())?;
        let (mempool, solutions) = Mempool::new(store.clone(), mempool_config, params, time);
        let mempool = mempool.load(&chain.tip_state())?;

        info!(
            "[node] Tip {} at height {}, {} pending transactions",
            chain.tip().id,
            chain.height(),
            mempool.len()
        );

        let node = Self {
            validator: ObjectValidator::new(store.clone()),
            store,
            core: Mutex::new(Core { chain, mempool }),
            peers,
            gate,
        };
        Ok((node, solutions))
    }

    /// Handle an object received from a peer.
    pub async fn on_object(&self, object: NetworkObject) -> Result<ObjectOutcome, NodeError> {
        let id = object.id();
        let result = match object {
            NetworkObject::Transaction(tx) => self.on_transaction(&tx).await,
            NetworkObject::Block(block) => self.on_block(&block).await.map(ObjectOutcome::Block),
        };
        if let Err(e) = &result {
            log_rejection(&id, e);
        }
        result
    }

    async fn on_transaction(&self, tx: &Transaction) -> Result<ObjectOutcome, NodeError> {
        self.validator.validate_transaction(tx)?;

        let mut core = self.core.lock().await;
        let id = self.store.put_transaction(tx)?;
        let admitted = core.mempool.on_transaction_arrival(tx)?;
        debug!("[node] Transaction {} stored, admitted: {}", id, admitted);
        Ok(ObjectOutcome::Transaction { id, admitted })
    }

    async fn on_block(&self, block: &Block) -> Result<BlockOutcome, NodeError> {
        let mut guard = self.core.lock().await;
        let Core { chain, mempool } = &mut *guard;

        let outcome = chain.on_block(block)?;
        let Some(change) = outcome.tip_change() else {
            return Ok(outcome);
        };

        let tip = change.new_tip().clone();
        if change.is_reorg() {
            info!(
                "[node] Reorg to {} at height {}: {} blocks abandoned, {} adopted",
                tip.id,
                tip.height,
                change.short_fork.len(),
                change.long_fork.len()
            );
        } else {
            info!("[node] New tip {} at height {}", tip.id, tip.height);
        }

        mempool.reorg(change)?;
        if self.gate.on_tip_change(tip.height) {
            if let Err(e) = mempool.mine(&tip).await {
                error!("[node] Mining on new tip {} failed: {}", tip.id, e);
            }
        }
        Ok(outcome)
    }

    /// Restart every worker on the current tip and pending set.
    ///
    /// Returns `None` when periodic mining is disabled.
    pub async fn mine_tick(&self) -> Result<Option<MiningJob>, NodeError> {
        if !self.gate.enabled {
            return Ok(None);
        }
        let mut guard = self.core.lock().await;
        let Core { chain, mempool } = &mut *guard;
        let tip = chain.tip().clone();
        let job = mempool.mine(&tip).await?;
        debug!(
            "[node] Mining on {} at height {} with {} txs",
            tip.id,
            tip.height + 1,
            job.template.txids.len()
        );
        Ok(Some(job))
    }

    /// Accept a block found by a worker and announce it.
    pub async fn on_mined(&self, mined: MinedBlock) -> Result<BlockOutcome, NodeError> {
        let MinedBlock { block, coinbase } = mined;
        let id = block.id();

        let result = self.accept_mined(&block, &coinbase).await;
        match &result {
            Ok(BlockOutcome::Added { height, .. }) => {
                info!("[node] Mined block {} at height {}", id, height);
                self.announce(block, coinbase).await;
            }
            Ok(BlockOutcome::AlreadyKnown(_)) => {}
            Err(e) => log_rejection(&id, e),
        }
        result
    }

    async fn accept_mined(
        &self,
        block: &Block,
        coinbase: &Transaction,
    ) -> Result<BlockOutcome, NodeError> {
        self.validator.validate_transaction(coinbase)?;
        self.store.put_transaction(coinbase)?;
        self.on_block(block).await
    }

    async fn announce(&self, block: Block, coinbase: Transaction) {
        let tip = self.tip().await.tip;
        let objects = [NetworkObject::from(coinbase), NetworkObject::from(block)];

        for peer in self.peers.peers().await {
            for object in &objects {
                if let Err(e) = peer.send_object(object).await {
                    warn!("[node] Announcing {} to {} failed: {}", object.id(), peer.address(), e);
                }
            }
            if let Err(e) = peer.send_chain_tip(tip).await {
                warn!("[node] Announcing tip to {} failed: {}", peer.address(), e);
            }
        }
    }

    /// Pending transaction ids, for inventory responses.
    pub async fn get_tx_ids(&self) -> Vec<ObjectId> {
        self.core.lock().await.mempool.get_tx_ids()
    }

    /// Current best tip.
    pub async fn tip(&self) -> TipRecord {
        let core = self.core.lock().await;
        let tip = core.chain.tip();
        TipRecord {
            tip: tip.id,
            height: tip.height,
        }
    }

    /// Copy of the mempool state.
    pub async fn mempool_state(&self) -> UtxoSet {
        self.core.lock().await.mempool.state().clone()
    }

    /// Copy of the UTXO set at the best tip.
    pub async fn tip_state(&self) -> UtxoSet {
        UtxoSet::clone(&self.core.lock().await.chain.tip_state())
    }

    /// The object store.
    pub fn store(&self) -> &Arc<ObjectStore<S>> {
        &self.store
    }

    /// Stop every miner worker.
    pub async fn shutdown(&self) {
        self.core.lock().await.mempool.shutdown().await;
        info!("[node] Miner workers stopped");
    }
}

fn log_rejection(id: &ObjectId, err: &NodeError) {
    match err.kind() {
        ErrorKind::StateConflict => debug!("[node] Object {} rejected: {}", id, err),
        ErrorKind::NotFound | ErrorKind::InvalidObject | ErrorKind::InvalidBlock => {
            warn!("[node] Object {} rejected ({}): {}", id, err.kind(), err)
        }
        ErrorKind::Internal => error!("[node] Internal error handling {}: {}", id, err),
    }
}
