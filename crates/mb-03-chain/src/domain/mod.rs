//! Domain layer of the chain manager.

pub mod block_validation;
pub mod chain;
pub mod error;
pub mod params;
