//! Domain layer of the mempool.

pub mod errors;
pub mod report;
pub mod typestate;
