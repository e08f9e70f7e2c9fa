//! # Object Store (mb-01)
//!
//! Content-addressed persistence for network objects, plus small keyed
//! records used by other subsystems to snapshot their state.
//!
//! ## Invariants
//!
//! | Invariant | Description |
//! |-----------|-------------|
//! | Content addressing | An object is stored under the id of its canonical bytes |
//! | Idempotent put | Re-putting a stored object performs no write |
//! | Validated contents | Apart from genesis, only validated objects are stored |
//! | Atomic batches | Record batches are written all or nothing |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Errors and key layout
//! - `ports/` - `KeyValueStore` port
//! - `adapters/` - In-memory and file-backed key-value stores
//! - `service.rs` - `ObjectStore` service
//! - `validation.rs` - Transaction object validation against stored outputs

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;
pub mod validation;

pub use adapters::{FileBackedKVStore, InMemoryKVStore};
pub use domain::errors::{KVStoreError, StoreError, ValidationError};
pub use ports::outbound::{BatchOperation, KeyValueStore};
pub use service::{ObjectStore, RecordBatch};
pub use validation::ObjectValidator;
