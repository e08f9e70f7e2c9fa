//! # Adapters
//!
//! Concrete backends plugged into the subsystem ports.

pub mod storage;

pub use storage::{open_store, NodeStore};
