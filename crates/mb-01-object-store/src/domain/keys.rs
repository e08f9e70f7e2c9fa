//! Key layout of the backing key-value store.

use shared_types::ObjectId;

/// Prefix of every stored network object.
pub const OBJECT_PREFIX: &[u8] = b"object:";

/// Key of the object with `id`.
pub fn object_key(id: &ObjectId) -> Vec<u8> {
    let mut key = Vec::with_capacity(OBJECT_PREFIX.len() + 64);
    key.extend_from_slice(OBJECT_PREFIX);
    key.extend_from_slice(id.to_hex().as_bytes());
    key
}

/// Key of a named record. Record names never start with the object prefix.
pub fn record_key(name: &str) -> Vec<u8> {
    name.as_bytes().to_vec()
}
