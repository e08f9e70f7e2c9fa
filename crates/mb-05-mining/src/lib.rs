//! # Mining (mb-05)
//!
//! Parallel proof-of-work search over a fixed block template.
//!
//! ## Worker Model
//!
//! ```text
//! WorkerPool::dispatch(job)
//!   ├─ slot 0: spawn_blocking(search) ──oneshot──→ watcher ─┐
//!   ├─ slot 1: spawn_blocking(search) ──oneshot──→ watcher ─┼─→ solutions channel
//!   └─ slot N: ...                                          ┘
//! ```
//!
//! - Each worker owns its copy of the template and shares nothing mutable
//!   with the pool except its cancel flag.
//! - Each worker reports exactly one terminal `WorkerOutcome`.
//! - Nonce spaces of concurrent workers are disjoint.

pub mod config;
pub mod domain;
pub mod error;
pub mod pool;

pub use config::MinerConfig;
pub use domain::nonce::NonceSpace;
pub use domain::search::NonceSearch;
pub use domain::template::{BlockTemplate, MinedBlock, MiningJob};
pub use error::MiningError;
pub use pool::{WorkerOutcome, WorkerPool};
