//! Ports of the node runtime.

pub mod peers;

pub use peers::{NoPeers, PeerError, PeerHandle, PeerSet};
