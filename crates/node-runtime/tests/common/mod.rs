//! Shared harness for node integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use mb_01_object_store::{InMemoryKVStore, ObjectStore};
use mb_03_chain::{ConsensusParams, FixedTimeSource, TimeSource};
use mb_05_mining::MinedBlock;
use node_runtime::{MiningGate, Node, NodeConfig, PeerError, PeerHandle, PeerSet};
use shared_types::test_utils::{coinbase_to, test_block, test_keypair};
use shared_types::{Block, NetworkObject, ObjectId, Transaction};
use tokio::sync::mpsc;

pub const T0: u64 = 1_671_062_400;
pub const NOW: u64 = T0 + 1_000_000;
pub const REWARD: u64 = 50_000_000_000_000;

pub type TestNode = Node<InMemoryKVStore>;

/// What a peer was sent, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Object(ObjectId),
    Tip(ObjectId),
}

/// Peer that records every message.
#[derive(Default)]
pub struct RecordingPeer {
    sent: Mutex<Vec<Sent>>,
}

impl RecordingPeer {
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl PeerHandle for RecordingPeer {
    fn address(&self) -> String {
        "recording".into()
    }

    async fn send_object(&self, object: &NetworkObject) -> Result<(), PeerError> {
        self.sent.lock().unwrap().push(Sent::Object(object.id()));
        Ok(())
    }

    async fn send_chain_tip(&self, tip: ObjectId) -> Result<(), PeerError> {
        self.sent.lock().unwrap().push(Sent::Tip(tip));
        Ok(())
    }
}

/// Peer set holding one [`RecordingPeer`].
#[derive(Default)]
pub struct RecordingPeers {
    pub peer: Arc<RecordingPeer>,
}

#[async_trait]
impl PeerSet for RecordingPeers {
    async fn peers(&self) -> Vec<Arc<dyn PeerHandle>> {
        vec![self.peer.clone() as Arc<dyn PeerHandle>]
    }
}

pub fn test_config(mining: bool) -> NodeConfig {
    let mut config = NodeConfig::default();
    config.mining.enabled = mining;
    config.mining.workers = 2;
    config.mining.batch_size = 1_000;
    config.mining.interval = Duration::from_secs(1);
    config
}

pub fn time() -> Arc<dyn TimeSource> {
    Arc::new(FixedTimeSource::new(NOW))
}

pub fn node_with(
    config: &NodeConfig,
    peers: Arc<dyn PeerSet>,
) -> (Arc<TestNode>, mpsc::UnboundedReceiver<MinedBlock>) {
    let store = Arc::new(ObjectStore::new(InMemoryKVStore::new()));
    node_on_store(store, config, peers)
}

/// Node restoring its state from `store`.
pub fn node_on_store(
    store: Arc<ObjectStore<InMemoryKVStore>>,
    config: &NodeConfig,
    peers: Arc<dyn PeerSet>,
) -> (Arc<TestNode>, mpsc::UnboundedReceiver<MinedBlock>) {
    node_at(store, config, peers, time())
}

/// Node on `store` reading the clock from `time`.
pub fn node_at(
    store: Arc<ObjectStore<InMemoryKVStore>>,
    config: &NodeConfig,
    peers: Arc<dyn PeerSet>,
    time: Arc<dyn TimeSource>,
) -> (Arc<TestNode>, mpsc::UnboundedReceiver<MinedBlock>) {
    let params = ConsensusParams::testing();
    let gate = MiningGate {
        enabled: config.mining.enabled,
        activation_height: config.mining.activation_height,
    };
    let (node, solutions) = Node::new(
        store,
        params.clone(),
        time,
        config.mempool_config(&params),
        gate,
        peers,
    )
    .unwrap();
    (Arc::new(node), solutions)
}

/// Node without mining or peers.
pub fn quiet_node() -> Arc<TestNode> {
    node_with(&test_config(false), Arc::new(RecordingPeers::default())).0
}

/// Build a block on `parent` (at `parent_height`) whose coinbase pays key 1.
///
/// The coinbase is delivered through `on_object`; the other transactions go
/// straight into the store. `salt` tells sibling blocks apart.
pub async fn block_on(
    node: &TestNode,
    parent: ObjectId,
    parent_height: u64,
    salt: u64,
    txs: &[Transaction],
) -> (Block, Transaction) {
    let height = parent_height + 1;
    let coinbase = coinbase_to(&test_keypair(1), height, REWARD - salt);
    node.on_object(coinbase.to_network_object()).await.unwrap();

    let mut txids = vec![coinbase.id()];
    for tx in txs {
        txids.push(node.store().put_transaction(tx).unwrap());
    }
    (test_block(Some(parent), txids, T0 + height * 10 + salt), coinbase)
}

/// Extend the best tip by one block and return it with its coinbase.
pub async fn extend(node: &TestNode, salt: u64, txs: &[Transaction]) -> (Block, Transaction) {
    let tip = node.tip().await;
    let (block, coinbase) = block_on(node, tip.tip, tip.height, salt, txs).await;
    node.on_object(block.to_network_object()).await.unwrap();
    (block, coinbase)
}
