//! # Worker Pool
//!
//! Fixed set of worker slots owned by the mempool. Replacing a slot cancels
//! its worker, waits (bounded) for the worker's terminal outcome to be
//! observed, and only then starts the new worker.

use crate::config::MinerConfig;
use crate::domain::nonce::NonceSpace;
use crate::domain::search::NonceSearch;
use crate::domain::template::{MinedBlock, MiningJob};
use crate::error::MiningError;
use shared_types::Block;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Terminal message of a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerOutcome {
    /// The worker found a block meeting the target.
    Solved(Block),
    /// The worker was told to stop.
    Cancelled,
}

struct WorkerHandle {
    cancel: Arc<AtomicBool>,
    watcher: JoinHandle<()>,
}

/// Pool of proof-of-work workers, slots `0..N-1`.
pub struct WorkerPool {
    config: MinerConfig,
    slots: Vec<Option<WorkerHandle>>,
    solutions: mpsc::UnboundedSender<MinedBlock>,
}

impl WorkerPool {
    /// Create a pool; solved blocks arrive on the returned receiver.
    pub fn new(config: MinerConfig) -> (Self, mpsc::UnboundedReceiver<MinedBlock>) {
        let (solutions, receiver) = mpsc::unbounded_channel();
        let slots = (0..config.workers).map(|_| None).collect();
        (
            Self {
                config,
                slots,
                solutions,
            },
            receiver,
        )
    }

    /// Number of slots.
    pub fn size(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots with a worker that has not been cancelled or reaped.
    pub fn running(&self) -> usize {
        self.slots
            .iter()
            .flatten()
            .filter(|h| !h.watcher.is_finished())
            .count()
    }

    /// Replace every worker with one mining `job`.
    ///
    /// All workers of one dispatch share a fresh random salt and search
    /// disjoint nonce spaces.
    pub async fn dispatch(&mut self, job: MiningJob) -> Result<(), MiningError> {
        if self.slots.is_empty() {
            return Err(MiningError::NoWorkers);
        }
        let search = NonceSearch::new(&job.template)?;
        let salt = NonceSpace::random_salt();

        for slot in 0..self.slots.len() {
            self.stop(slot).await;
            self.start(slot, job.clone(), search.clone(), NonceSpace::new(salt, slot));
        }

        info!(
            "[mb-05] Dispatched {} workers on parent {} with {} txs",
            self.slots.len(),
            job.template.previd,
            job.template.txids.len()
        );
        Ok(())
    }

    /// Replace the worker in `slot` with one mining `job`.
    pub async fn replace(&mut self, slot: usize, job: MiningJob) -> Result<(), MiningError> {
        self.check_slot(slot)?;
        let search = NonceSearch::new(&job.template)?;
        self.stop(slot).await;
        let space = NonceSpace::new(NonceSpace::random_salt(), slot);
        self.start(slot, job, search, space);
        Ok(())
    }

    /// Cancel the worker in `slot`, if any.
    pub async fn cancel(&mut self, slot: usize) -> Result<(), MiningError> {
        self.check_slot(slot)?;
        self.stop(slot).await;
        Ok(())
    }

    /// Cancel every worker.
    pub async fn cancel_all(&mut self) {
        for slot in 0..self.slots.len() {
            self.stop(slot).await;
        }
    }

    fn check_slot(&self, slot: usize) -> Result<(), MiningError> {
        if slot >= self.slots.len() {
            return Err(MiningError::InvalidSlot {
                slot,
                size: self.slots.len(),
            });
        }
        Ok(())
    }

    async fn stop(&mut self, slot: usize) {
        let Some(handle) = self.slots[slot].take() else {
            return;
        };
        handle.cancel.store(true, Ordering::Relaxed);
        if tokio::time::timeout(self.config.cancel_timeout, handle.watcher)
            .await
            .is_err()
        {
            warn!(
                "[mb-05] Worker {} did not stop within {:?}",
                slot, self.config.cancel_timeout
            );
        }
    }

    fn start(&mut self, slot: usize, job: MiningJob, mut search: NonceSearch, space: NonceSpace) {
        let cancel = Arc::new(AtomicBool::new(false));
        let (tx, rx) = oneshot::channel();
        let batch = self.config.batch_size;

        let flag = cancel.clone();
        let template = job.template.clone();
        tokio::task::spawn_blocking(move || {
            let outcome = match search.run(space, batch, &flag) {
                Some(nonce) => WorkerOutcome::Solved(template.to_block(nonce)),
                None => WorkerOutcome::Cancelled,
            };
            let _ = tx.send(outcome);
        });

        let solutions = self.solutions.clone();
        let coinbase = job.coinbase;
        let watcher = tokio::spawn(async move {
            match rx.await {
                Ok(WorkerOutcome::Solved(block)) => {
                    info!("[mb-05] Worker {} solved block {}", slot, block.id());
                    if solutions.send(MinedBlock { block, coinbase }).is_err() {
                        debug!("[mb-05] Solution receiver dropped");
                    }
                }
                Ok(WorkerOutcome::Cancelled) => {
                    debug!("[mb-05] Worker {} cancelled", slot);
                }
                Err(_) => {
                    error!("[mb-05] Worker {} terminated without an outcome", slot);
                }
            }
        });

        self.slots[slot] = Some(WorkerHandle { cancel, watcher });
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        for handle in self.slots.iter().flatten() {
            handle.cancel.store(true, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::template::BlockTemplate;
    use shared_types::test_utils::{coinbase_to, test_keypair, TEST_TARGET};
    use shared_types::{ObjectId, Target};
    use std::time::Duration;

    fn config(workers: usize) -> MinerConfig {
        MinerConfig {
            workers,
            batch_size: 1_000,
            cancel_timeout: Duration::from_secs(5),
        }
    }

    fn job(target: Target) -> MiningJob {
        let coinbase = coinbase_to(&test_keypair(1), 1, 50);
        MiningJob {
            template: BlockTemplate {
                previd: ObjectId::from_bytes([1; 32]),
                txids: vec![coinbase.id()],
                created: 1_700_000_000,
                target,
                miner: Some("test".into()),
                note: None,
                studentids: None,
            },
            coinbase,
        }
    }

    #[tokio::test]
    async fn test_solution_forwarded_with_coinbase() {
        let (mut pool, mut solutions) = WorkerPool::new(config(2));
        let job = job(TEST_TARGET);

        pool.dispatch(job.clone()).await.unwrap();

        let mined = tokio::time::timeout(Duration::from_secs(5), solutions.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(mined.coinbase, job.coinbase);
        assert_eq!(mined.block.txids, job.template.txids);
        assert_eq!(mined.block.previd, Some(job.template.previd));
        assert!(mined.block.has_valid_pow());
    }

    #[tokio::test]
    async fn test_workers_of_one_dispatch_find_distinct_nonces() {
        let (mut pool, mut solutions) = WorkerPool::new(config(3));
        pool.dispatch(job(TEST_TARGET)).await.unwrap();

        let mut nonces = Vec::new();
        for _ in 0..3 {
            let mined = tokio::time::timeout(Duration::from_secs(5), solutions.recv())
                .await
                .unwrap()
                .unwrap();
            nonces.push(mined.block.nonce);
        }
        nonces.sort();
        nonces.dedup();
        assert_eq!(nonces.len(), 3);
    }

    #[tokio::test]
    async fn test_cancel_all_stops_workers() {
        let (mut pool, mut solutions) = WorkerPool::new(config(2));
        pool.dispatch(job(Target::from_bytes([0; 32]))).await.unwrap();
        assert_eq!(pool.size(), 2);

        pool.cancel_all().await;

        assert_eq!(pool.running(), 0);
        assert!(solutions.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_replace_single_slot() {
        let (mut pool, mut solutions) = WorkerPool::new(config(2));
        pool.dispatch(job(Target::from_bytes([0; 32]))).await.unwrap();

        pool.replace(1, job(TEST_TARGET)).await.unwrap();

        let mined = tokio::time::timeout(Duration::from_secs(5), solutions.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(mined.block.has_valid_pow());

        pool.cancel(0).await.unwrap();
        pool.cancel(1).await.unwrap();
        assert_eq!(pool.running(), 0);
    }

    #[tokio::test]
    async fn test_invalid_slot_rejected() {
        let (mut pool, _solutions) = WorkerPool::new(config(1));
        assert_eq!(
            pool.cancel(4).await,
            Err(MiningError::InvalidSlot { slot: 4, size: 1 })
        );
    }

    #[tokio::test]
    async fn test_empty_pool_rejects_dispatch() {
        let (mut pool, _solutions) = WorkerPool::new(config(0));
        assert_eq!(
            pool.dispatch(job(TEST_TARGET)).await,
            Err(MiningError::NoWorkers)
        );
    }
}
