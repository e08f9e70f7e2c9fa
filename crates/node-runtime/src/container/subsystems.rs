//! # Node Container
//!
//! Owns the node and the receiving end of the miner solutions channel.
//!
//! ## Event Loop
//!
//! ```text
//! loop {
//!     interval tick   → node.mine_tick()
//!     mined block     → node.on_mined(block)
//!     shutdown future → node.shutdown(), return
//! }
//! ```
//!
//! Errors of a single event are logged by the node and never end the loop.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use mb_01_object_store::{KeyValueStore, ObjectStore};
use mb_03_chain::{ConsensusParams, SystemTimeSource, TimeSource};
use mb_05_mining::MinedBlock;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::container::config::NodeConfig;
use crate::error::NodeError;
use crate::node::{MiningGate, Node};
use crate::ports::peers::PeerSet;

/// A node together with its mining schedule.
pub struct NodeContainer<S: KeyValueStore> {
    node: Arc<Node<S>>,
    solutions: mpsc::UnboundedReceiver<MinedBlock>,
    mining_interval: Duration,
}

impl<S: KeyValueStore + 'static> NodeContainer<S> {
    /// Assemble a node on the Marabu network over `kv`.
    pub fn new(kv: S, config: &NodeConfig, peers: Arc<dyn PeerSet>) -> Result<Self, NodeError> {
        let params = config.consensus_params();
        Self::with_params(kv, config, params, Arc::new(SystemTimeSource), peers)
    }

    /// Assemble a node with explicit consensus parameters and clock.
    pub fn with_params(
        kv: S,
        config: &NodeConfig,
        params: ConsensusParams,
        time: Arc<dyn TimeSource>,
        peers: Arc<dyn PeerSet>,
    ) -> Result<Self, NodeError> {
        let store = Arc::new(ObjectStore::new(kv));
        let mempool_config = config.mempool_config(&params);
        let gate = MiningGate {
            enabled: config.mining.enabled,
            activation_height: config.mining.activation_height,
        };

        let (node, solutions) = Node::new(store, params, time, mempool_config, gate, peers)?;
        Ok(Self {
            node: Arc::new(node),
            solutions,
            mining_interval: config.mining.interval,
        })
    }

    /// Shared handle to the node, for inbound peer connections.
    pub fn node(&self) -> Arc<Node<S>> {
        Arc::clone(&self.node)
    }

    /// Drive mining until `shutdown` completes, then stop the workers.
    pub async fn run(mut self, shutdown: impl Future<Output = ()>) {
        let mut ticker = tokio::time::interval(self.mining_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!("[node] Running, mining every {:?}", self.mining_interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.node.mine_tick().await {
                        error!("[node] Mining tick failed: {}", e);
                    }
                }
                Some(mined) = self.solutions.recv() => {
                    // Rejections are logged inside the node.
                    let _ = self.node.on_mined(mined).await;
                }
                _ = &mut shutdown => {
                    info!("[node] Shutdown requested");
                    break;
                }
            }
        }

        self.node.shutdown().await;
    }
}
