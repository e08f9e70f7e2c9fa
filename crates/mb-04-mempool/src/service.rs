//! Mempool Service
//!
//! Pending transactions, their combined state on top of the best tip, and
//! the proof-of-work workers mining them.

use crate::config::MempoolConfig;
use crate::domain::errors::MempoolError;
use crate::domain::report::ReorgReport;
use crate::domain::typestate::{Loaded, Uninitialized};
use mb_01_object_store::{KeyValueStore, ObjectStore, RecordBatch, StoreError};
use mb_02_utxo_state::UtxoSet;
use mb_03_chain::{ChainEntry, ConsensusParams, TimeSource, TipChange};
use mb_05_mining::{BlockTemplate, MinedBlock, MiningJob, WorkerPool};
use shared_types::{ObjectId, Outpoint, Output, Transaction};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Record key of the ordered pending transaction ids.
pub const MEMPOOL_TXIDS_KEY: &str = "mempool:txids";

/// Record key of the mempool state outpoints.
pub const MEMPOOL_STATE_KEY: &str = "mempool:state";

/// Pool of pending transactions in lifecycle stage `St`.
pub struct Mempool<S: KeyValueStore, St = Loaded> {
    store: Arc<ObjectStore<S>>,
    config: MempoolConfig,
    params: ConsensusParams,
    time: Arc<dyn TimeSource>,
    workers: WorkerPool,
    stage: St,
}

impl<S: KeyValueStore> Mempool<S, Uninitialized> {
    /// Create an unloaded mempool. Mined blocks arrive on the receiver.
    pub fn new(
        store: Arc<ObjectStore<S>>,
        config: MempoolConfig,
        params: ConsensusParams,
        time: Arc<dyn TimeSource>,
    ) -> (Self, mpsc::UnboundedReceiver<MinedBlock>) {
        let (workers, solutions) = WorkerPool::new(config.miner.clone());
        (
            Self {
                store,
                config,
                params,
                time,
                workers,
                stage: Uninitialized,
            },
            solutions,
        )
    }

    /// Restore the persisted pending list on top of `tip_state`.
    ///
    /// Transactions missing from the store or no longer applicable are
    /// dropped. The resulting snapshot is saved.
    pub fn load(self, tip_state: &UtxoSet) -> Result<Mempool<S, Loaded>, MempoolError> {
        let txids: Vec<ObjectId> = self
            .store
            .get_record(MEMPOOL_TXIDS_KEY)?
            .unwrap_or_default();

        let mut candidates = Vec::with_capacity(txids.len());
        for txid in txids {
            match self.store.get_transaction(&txid) {
                Ok(tx) => candidates.push((txid, tx)),
                Err(StoreError::NotFound(_)) => {
                    warn!("[mb-04] Pending transaction {} missing from store", txid);
                }
                Err(e) => return Err(e.into()),
            }
        }

        let mut mempool = Mempool {
            store: self.store,
            config: self.config,
            params: self.params,
            time: self.time,
            workers: self.workers,
            stage: Loaded::on(tip_state.clone()),
        };
        let total = candidates.len();
        for (txid, tx) in candidates {
            mempool.admit(txid, tx);
        }
        mempool.save()?;

        info!(
            "[mb-04] Loaded {} of {} pending transactions",
            mempool.len(),
            total
        );
        Ok(mempool)
    }
}

impl<S: KeyValueStore> Mempool<S, Loaded> {
    /// Persist the pending ids and the state in one atomic batch.
    pub fn save(&self) -> Result<(), MempoolError> {
        let mut batch = RecordBatch::new();
        batch
            .put(MEMPOOL_TXIDS_KEY, &self.get_tx_ids())?
            .put(MEMPOOL_STATE_KEY, &self.stage.state.to_vec())?;
        self.store.write_records(batch)?;
        Ok(())
    }

    /// Ids of the pending transactions, in admission order.
    pub fn get_tx_ids(&self) -> Vec<ObjectId> {
        self.stage.txs.iter().map(|(id, _)| *id).collect()
    }

    /// Number of pending transactions.
    pub fn len(&self) -> usize {
        self.stage.txs.len()
    }

    /// Returns true if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.stage.txs.is_empty()
    }

    /// Returns true if `txid` is pending.
    pub fn contains(&self, txid: &ObjectId) -> bool {
        self.stage.txs.iter().any(|(id, _)| id == txid)
    }

    /// Tip state with every pending transaction applied.
    pub fn state(&self) -> &UtxoSet {
        &self.stage.state
    }

    /// Offer a validated, stored transaction.
    ///
    /// Returns `false` for a coinbase and for a transaction conflicting with
    /// the current state; the mempool is then unchanged.
    pub fn on_transaction_arrival(&mut self, tx: &Transaction) -> Result<bool, MempoolError> {
        let txid = tx.id();
        if !self.admit(txid, tx.clone()) {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    fn admit(&mut self, txid: ObjectId, tx: Transaction) -> bool {
        if tx.is_coinbase() {
            debug!("[mb-04] Coinbase {} not admitted", txid);
            return false;
        }
        match self.stage.state.apply(&txid, &tx) {
            Ok(()) => {
                self.stage.txs.push((txid, tx));
                true
            }
            Err(e) => {
                debug!("[mb-04] Transaction {} rejected: {}", txid, e);
                false
            }
        }
    }

    /// Reconcile with a best-tip change.
    ///
    /// Candidates are the non-coinbase transactions of the abandoned blocks,
    /// oldest block first and in block order, followed by the previous
    /// pending list. They are replayed in that order on a copy of the new
    /// tip's state; those that no longer apply are dropped.
    pub fn reorg(&mut self, change: &TipChange) -> Result<ReorgReport, MempoolError> {
        let tip = change.long_fork.last().ok_or(MempoolError::MissingTipState)?;

        let mut orphaned = Vec::new();
        for entry in &change.short_fork {
            for txid in &entry.block.txids {
                let tx = self.store.get_transaction(txid)?;
                if !tx.is_coinbase() {
                    orphaned.push((*txid, tx));
                }
            }
        }

        let mut report = ReorgReport {
            orphaned: orphaned.iter().map(|(id, _)| *id).collect(),
            ..ReorgReport::default()
        };

        let previous = std::mem::take(&mut self.stage.txs);
        self.stage = Loaded::on(UtxoSet::clone(&tip.state_after));
        for (txid, tx) in orphaned.into_iter().chain(previous) {
            if self.admit(txid, tx) {
                report.readmitted.push(txid);
            } else {
                report.dropped.push(txid);
            }
        }
        self.save()?;

        info!(
            "[mb-04] Reorg onto {} at height {}: {} orphaned, {} pending, {} dropped",
            tip.id,
            tip.height,
            report.orphaned.len(),
            report.readmitted.len(),
            report.dropped.len()
        );
        Ok(report)
    }

    /// Build a block on `tip` from the pending transactions and hand it to
    /// every worker, replacing whatever they were mining.
    pub async fn mine(&mut self, tip: &ChainEntry) -> Result<MiningJob, MempoolError> {
        let job = self.template(tip);
        self.workers.dispatch(job.clone()).await?;
        Ok(job)
    }

    /// The timestamp is the current time, but always after the parent's.
    fn template(&self, tip: &ChainEntry) -> MiningJob {
        let height = tip.height + 1;
        let coinbase = Transaction::coinbase(
            height,
            vec![Output {
                pubkey: self.config.coinbase_recipient,
                value: self.config.block_reward,
            }],
        );

        let mut txids = Vec::with_capacity(self.stage.txs.len() + 1);
        txids.push(coinbase.id());
        txids.extend(self.get_tx_ids());

        MiningJob {
            template: BlockTemplate {
                previd: tip.id,
                txids,
                created: self.time.now().max(tip.block.created + 1),
                target: self.params.target_at(height),
                miner: self.config.miner_name.clone(),
                note: self.config.note.clone(),
                studentids: self.config.student_ids.clone(),
            },
            coinbase,
        }
    }

    /// Number of workers currently searching.
    pub fn mining_workers(&self) -> usize {
        self.workers.running()
    }

    /// Stop every worker.
    pub async fn shutdown(&mut self) {
        self.workers.cancel_all().await;
    }

    /// Outpoints of the persisted snapshot, for inspection.
    pub fn persisted_state(&self) -> Result<Vec<Outpoint>, MempoolError> {
        Ok(self
            .store
            .get_record(MEMPOOL_STATE_KEY)?
            .unwrap_or_default())
    }
}
