//! # Shared Types Crate
//!
//! Domain objects exchanged between peers and between the node's subsystems.
//!
//! ## Design Principles
//!
//! - **Content addressing**: an object's id is the BLAKE2s-256 digest of its
//!   canonical encoding. Ids are always computed, never stored in the object.
//! - **One encoding**: the same canonical bytes are used for hashing, for
//!   storage and for transmission.
//! - **Tagged union**: [`NetworkObject`] is either a [`Transaction`] or a
//!   [`Block`], discriminated by the `"type"` key.

pub mod canonical;
pub mod entities;
pub mod errors;
pub mod hex_types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use canonical::{canonical_bytes, object_id};
pub use entities::*;
pub use errors::*;
pub use hex_types::{Nonce, ObjectId, PublicKey, Signature, Target};
