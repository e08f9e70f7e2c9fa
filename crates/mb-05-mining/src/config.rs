//! Configuration types for the miner workers

use std::time::Duration;

/// Worker pool configuration
#[derive(Clone, Debug)]
pub struct MinerConfig {
    /// Number of worker slots (default: num_cpus)
    pub workers: usize,

    /// Nonces tried between two checks of the cancel flag
    pub batch_size: u64,

    /// How long replacing a worker waits for the old one to stop
    pub cancel_timeout: Duration,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get().max(1),
            batch_size: 100_000,
            cancel_timeout: Duration::from_secs(5),
        }
    }
}
