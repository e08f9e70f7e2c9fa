//! Domain layer of the object store.

pub mod errors;
pub mod keys;
