//! # Peer Port
//!
//! Outbound connection to the gossip network. Sends are fire-and-forget: the
//! node logs a failed send and moves on to the next peer.

use async_trait::async_trait;
use shared_types::{NetworkObject, ObjectId};
use std::sync::Arc;
use thiserror::Error;

/// Failure to deliver a message to one peer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeerError {
    /// The connection is gone.
    #[error("Peer {0} disconnected")]
    Disconnected(String),
    /// Writing to the connection failed.
    #[error("Sending to peer {peer} failed: {message}")]
    Send {
        /// Peer address
        peer: String,
        /// Transport error
        message: String,
    },
}

/// One connected peer.
#[async_trait]
pub trait PeerHandle: Send + Sync {
    /// Address used in log lines.
    fn address(&self) -> String;

    /// Send an object.
    async fn send_object(&self, object: &NetworkObject) -> Result<(), PeerError>;

    /// Announce our best tip.
    async fn send_chain_tip(&self, tip: ObjectId) -> Result<(), PeerError>;
}

/// The currently connected peers.
#[async_trait]
pub trait PeerSet: Send + Sync {
    /// Snapshot of the connected peers.
    async fn peers(&self) -> Vec<Arc<dyn PeerHandle>>;
}

/// Peer set of a node without networking.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPeers;

#[async_trait]
impl PeerSet for NoPeers {
    async fn peers(&self) -> Vec<Arc<dyn PeerHandle>> {
        Vec::new()
    }
}
