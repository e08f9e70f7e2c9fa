//! # Shared Crypto - Consensus Cryptographic Primitives
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | BLAKE2s-256 | Object identifiers, proof-of-work |
//! | `signatures` | Ed25519 | Transaction input signatures |
//!
//! Both algorithms are consensus-critical: every node must derive the same
//! object id from the same canonical bytes, and must accept exactly the same
//! set of signatures.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod hashing;
pub mod signatures;

// Re-exports
pub use errors::CryptoError;
pub use hashing::{blake2s_256, Blake2sHasher, Hash};
pub use signatures::{verify_raw, Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
