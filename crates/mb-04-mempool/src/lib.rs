//! # Mempool (mb-04)
//!
//! Maximal mutually-consistent set of pending transactions valid against the
//! current best tip, plus the block templates mined from it.
//!
//! ## Lifecycle (type-state)
//!
//! ```text
//! Mempool::new ──→ [Uninitialized] ──load(tip_state)──→ [Loaded]
//! ```
//!
//! Persisting, admitting, reorganising and mining exist only on the loaded
//! type, so saving a mempool that was never loaded does not compile.
//!
//! ## Invariant
//!
//! Every pending transaction was applied to `state` in list order, and
//! `state` reflects no transaction outside the list.

pub mod config;
pub mod domain;
pub mod service;

pub use config::MempoolConfig;
pub use domain::errors::MempoolError;
pub use domain::report::ReorgReport;
pub use domain::typestate::{Loaded, Uninitialized};
pub use service::{Mempool, MEMPOOL_STATE_KEY, MEMPOOL_TXIDS_KEY};
