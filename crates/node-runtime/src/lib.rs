//! # Node Runtime Library
//!
//! This library exposes the internal modules of the node runtime for testing.
//! The main entry point is the `main.rs` binary.
//!
//! ## Structure
//!
//! - `container/` - Configuration and node assembly
//! - `node.rs` - The single mutator over chain and mempool
//! - `ports/` - Peer port
//! - `adapters/` - Storage backends

pub mod adapters;
pub mod container;
pub mod error;
pub mod node;
pub mod ports;

pub use container::{ConfigError, NodeConfig, NodeContainer};
pub use error::NodeError;
pub use node::{MiningGate, Node, ObjectOutcome};
pub use ports::{NoPeers, PeerError, PeerHandle, PeerSet};
