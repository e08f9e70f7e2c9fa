//! # Mining Flow Tests
//!
//! Template dispatch, acceptance of mined blocks, announcement to peers and
//! the container event loop.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use mb_01_object_store::{InMemoryKVStore, ObjectStore};
use mb_03_chain::{BlockOutcome, ConsensusParams, FixedTimeSource};
use mb_05_mining::MinedBlock;
use node_runtime::{NodeContainer, PeerSet};
use shared_types::test_utils::{signed_transaction, test_keypair};
use tokio::sync::oneshot;
use tokio::time::timeout;

/// Mining on the interval tick only, never on a tip change.
fn tick_only() -> node_runtime::NodeConfig {
    let mut config = test_config(true);
    config.mining.activation_height = u64::MAX;
    config
}

#[tokio::test]
async fn test_mined_block_is_accepted_and_announced() {
    // Arrange
    let peers = Arc::new(RecordingPeers::default());
    let (node, mut solutions) = node_with(&tick_only(), peers.clone());
    let (_, cb1) = extend(&node, 0, &[]).await;
    let tx = signed_transaction(&test_keypair(1), &[(cb1.id(), 0)], 100);
    node.on_object(tx.to_network_object()).await.unwrap();

    // Act
    let job = node.mine_tick().await.unwrap().expect("mining is enabled");
    let mined = timeout(Duration::from_secs(5), solutions.recv())
        .await
        .unwrap()
        .unwrap();
    let block_id = mined.block.id();
    let coinbase_id = mined.coinbase.id();
    let outcome = node.on_mined(mined).await.unwrap();

    // Assert
    assert_eq!(job.template.txids, vec![coinbase_id, tx.id()]);
    assert!(matches!(outcome, BlockOutcome::Added { height: 2, .. }));
    assert_eq!(node.tip().await.tip, block_id);
    assert!(node.store().exists(&coinbase_id).unwrap());
    assert!(node.get_tx_ids().await.is_empty());
    assert_eq!(
        peers.peer.sent(),
        vec![
            Sent::Object(coinbase_id),
            Sent::Object(block_id),
            Sent::Tip(block_id),
        ]
    );
    node.shutdown().await;
}

/// Next solution extending `parent`, skipping leftovers of earlier jobs.
async fn solution_on(
    solutions: &mut tokio::sync::mpsc::UnboundedReceiver<MinedBlock>,
    parent: shared_types::ObjectId,
) -> MinedBlock {
    timeout(Duration::from_secs(5), async {
        loop {
            let mined = solutions.recv().await.unwrap();
            if mined.block.previd == Some(parent) {
                return mined;
            }
        }
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn test_consecutive_blocks_mined_within_one_second() {
    // Arrange: the clock stands still while two blocks are mined.
    let clock = Arc::new(FixedTimeSource::new(NOW));
    let store = Arc::new(ObjectStore::new(InMemoryKVStore::new()));
    let peers = Arc::new(RecordingPeers::default());
    let (node, mut solutions) = node_at(store, &tick_only(), peers, clock.clone());
    let genesis = node.tip().await.tip;

    node.mine_tick().await.unwrap();
    let first = solution_on(&mut solutions, genesis).await;
    let first_id = first.block.id();
    assert!(matches!(
        node.on_mined(first).await.unwrap(),
        BlockOutcome::Added { height: 1, .. }
    ));

    // Act
    let job = node.mine_tick().await.unwrap().expect("mining is enabled");
    let second = solution_on(&mut solutions, first_id).await;
    clock.set(NOW + 1);
    let outcome = node.on_mined(second).await.unwrap();

    // Assert
    assert_eq!(job.template.created, NOW + 1);
    assert!(matches!(outcome, BlockOutcome::Added { height: 2, .. }));
    node.shutdown().await;
}

#[tokio::test]
async fn test_disabled_mining_skips_tick() {
    let node = quiet_node();
    assert!(node.mine_tick().await.unwrap().is_none());
}

#[tokio::test]
async fn test_stale_solution_is_kept_off_the_tip() {
    // Arrange: a solution for genesis arrives after the tip has moved on.
    let peers = Arc::new(RecordingPeers::default());
    let (node, mut solutions) = node_with(&tick_only(), peers.clone());
    node.mine_tick().await.unwrap();
    let mined = timeout(Duration::from_secs(5), solutions.recv())
        .await
        .unwrap()
        .unwrap();
    node.shutdown().await;
    extend(&node, 7, &[]).await;
    extend(&node, 7, &[]).await;
    let tip = node.tip().await;

    // Act
    let outcome = node.on_mined(mined).await.unwrap();

    // Assert
    assert!(matches!(
        outcome,
        BlockOutcome::Added { height: 1, tip_change: None, .. }
    ));
    assert_eq!(node.tip().await, tip);
    node.shutdown().await;
}

#[tokio::test]
async fn test_tip_change_below_activation_height_does_not_mine() {
    let mut config = test_config(true);
    config.mining.activation_height = 2;
    let (node, mut solutions) = node_with(&config, Arc::new(RecordingPeers::default()));

    extend(&node, 0, &[]).await;
    assert!(solutions.try_recv().is_err());

    extend(&node, 0, &[]).await;
    let mined = timeout(Duration::from_secs(5), solutions.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(mined.block.previd, Some(node.tip().await.tip));
    node.shutdown().await;
}

#[tokio::test]
async fn test_container_mines_until_shutdown() {
    // Arrange
    let peers = Arc::new(RecordingPeers::default());
    let container = NodeContainer::with_params(
        InMemoryKVStore::new(),
        &test_config(true),
        ConsensusParams::testing(),
        time(),
        peers.clone() as Arc<dyn PeerSet>,
    )
    .unwrap();
    let node = container.node();
    let (stop, stopped) = oneshot::channel::<()>();

    // Act
    let running = tokio::spawn(container.run(async move {
        let _ = stopped.await;
    }));
    timeout(Duration::from_secs(10), async {
        while node.tip().await.height == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
    stop.send(()).unwrap();
    timeout(Duration::from_secs(10), running).await.unwrap().unwrap();

    // Assert
    assert!(node.tip().await.height >= 1);
    assert!(!peers.peer.sent().is_empty());
}
