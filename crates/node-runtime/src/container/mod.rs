//! # Node Container
//!
//! Wires storage, consensus parameters, the mempool configuration and the
//! peer port into a [`Node`](crate::node::Node), and runs its event loop.

pub mod config;
pub mod subsystems;

pub use config::{ConfigError, NodeConfig};
pub use subsystems::NodeContainer;
