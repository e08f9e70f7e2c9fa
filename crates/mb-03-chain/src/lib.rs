//! # Chain Manager (mb-03)
//!
//! Holds every validated block together with the UTXO state after it,
//! selects the best tip by the longest-chain rule, and reports every tip
//! change as a [`TipChange`] so dependent state can be reconciled.
//!
//! ## Block Validation Pipeline
//!
//! ```text
//! on_block(B)
//!   │
//!   ├─ known?  ──────────────────────────────→ AlreadyKnown
//!   │
//!   ├─ resolve ancestors (store, oldest first) ─→ UnknownParent / GenesisMismatch
//!   │
//!   ├─ for each unvalidated block, oldest first:
//!   │     target → PoW → timestamps → txids → coinbase → fees → state
//!   │
//!   ├─ commit all or nothing
//!   │
//!   └─ fork choice: height > tip height ───────→ Added { tip_change }
//! ```
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Consensus parameters, chain state, block validation, errors
//! - `ports/` - Time source
//! - `service.rs` - `ChainManager`

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::chain::{Chain, ChainEntry, ChainState, TipChange};
pub use domain::error::{ChainError, ChainResult};
pub use domain::params::{ConsensusParams, MARABU_TARGET_HEX};
pub use ports::outbound::{SystemTimeSource, TimeSource};
pub use service::{BlockOutcome, ChainManager, TipRecord, TIP_RECORD_KEY};

#[cfg(any(test, feature = "test-utils"))]
pub use ports::outbound::FixedTimeSource;
