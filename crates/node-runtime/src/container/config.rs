//! # Node Configuration
//!
//! Unified configuration for all subsystems and runtime parameters.
//!
//! Every section has a `Default`; [`NodeConfig::apply_env`] overrides single
//! values from `MB_*` environment variables.

use mb_03_chain::ConsensusParams;
use mb_05_mining::MinerConfig;
use shared_types::PublicKey;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Complete node configuration.
#[derive(Debug, Clone, Default)]
pub struct NodeConfig {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Consensus configuration.
    pub consensus: ConsensusConfig,
    /// Mempool configuration.
    pub mempool: MempoolConfig,
    /// Mining configuration.
    pub mining: MiningConfig,
}

impl NodeConfig {
    /// Defaults overridden from the process environment.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env(|name| std::env::var(name).ok());
        config
    }

    /// Override values from `lookup`. Unparseable values are ignored with a
    /// warning.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup("MB_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(dir);
        }
        override_parsed(&lookup, "MB_MINING_ENABLED", &mut self.mining.enabled);
        override_parsed(&lookup, "MB_MINER_WORKERS", &mut self.mining.workers);
        override_parsed(
            &lookup,
            "MB_MINING_ACTIVATION_HEIGHT",
            &mut self.mining.activation_height,
        );

        let mut interval_secs = self.mining.interval.as_secs();
        override_parsed(&lookup, "MB_MINING_INTERVAL_SECS", &mut interval_secs);
        self.mining.interval = Duration::from_secs(interval_secs);

        if let Some(hex) = lookup("MB_MINER_PUBKEY") {
            match PublicKey::from_hex(&hex) {
                Ok(key) => self.mempool.coinbase_recipient = key,
                Err(e) => warn!("Ignoring MB_MINER_PUBKEY: {}", e),
            }
        }
    }

    /// Reject settings the node cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mining.enabled && self.mining.workers == 0 {
            return Err(ConfigError::NoMiningWorkers);
        }
        if self.mining.interval.is_zero() {
            return Err(ConfigError::ZeroMiningInterval);
        }
        if self.mining.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        Ok(())
    }

    /// Consensus parameters of the configured network.
    pub fn consensus_params(&self) -> ConsensusParams {
        ConsensusParams {
            max_ancestry_depth: self.consensus.max_ancestry_depth,
            ..ConsensusParams::marabu()
        }
    }

    /// Configuration of the mempool and its worker pool.
    pub fn mempool_config(&self, params: &ConsensusParams) -> mb_04_mempool::MempoolConfig {
        mb_04_mempool::MempoolConfig {
            coinbase_recipient: self.mempool.coinbase_recipient,
            block_reward: params.block_reward,
            miner_name: self.mempool.miner_name.clone(),
            note: self.mempool.note.clone(),
            student_ids: self.mempool.student_ids.clone(),
            miner: MinerConfig {
                workers: self.mining.workers,
                batch_size: self.mining.batch_size,
                cancel_timeout: self.mining.cancel_timeout,
            },
        }
    }
}

fn override_parsed<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    target: &mut T,
) {
    let Some(raw) = lookup(name) else {
        return;
    };
    match raw.trim().parse() {
        Ok(value) => *target = value,
        Err(_) => warn!("Ignoring {}: cannot parse {:?}", name, raw),
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Mining enabled without workers.
    #[error("Mining is enabled but MB_MINER_WORKERS is 0")]
    NoMiningWorkers,
    /// Mining interval of zero.
    #[error("Mining interval must be at least one second")]
    ZeroMiningInterval,
    /// Nonce batch of zero.
    #[error("Mining batch size must be positive")]
    ZeroBatchSize,
}

/// Storage configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Data directory of the object store.
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
        }
    }
}

/// Consensus configuration.
#[derive(Debug, Clone)]
pub struct ConsensusConfig {
    /// Maximum number of unvalidated ancestors resolved for one block.
    pub max_ancestry_depth: usize,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            max_ancestry_depth: ConsensusParams::marabu().max_ancestry_depth,
        }
    }
}

/// Mempool configuration: who mined blocks pay and how they are labelled.
#[derive(Debug, Clone)]
pub struct MempoolConfig {
    /// Recipient of the coinbase of mined blocks.
    pub coinbase_recipient: PublicKey,
    /// `miner` field of mined blocks.
    pub miner_name: Option<String>,
    /// `note` field of mined blocks.
    pub note: Option<String>,
    /// `studentids` field of mined blocks.
    pub student_ids: Option<Vec<String>>,
}

impl Default for MempoolConfig {
    fn default() -> Self {
        let defaults = mb_04_mempool::MempoolConfig::default();
        Self {
            coinbase_recipient: defaults.coinbase_recipient,
            miner_name: defaults.miner_name,
            note: defaults.note,
            student_ids: defaults.student_ids,
        }
    }
}

/// Mining configuration.
#[derive(Debug, Clone)]
pub struct MiningConfig {
    /// Enable periodic mining.
    pub enabled: bool,
    /// Number of worker threads.
    pub workers: usize,
    /// Period of the mining tick.
    pub interval: Duration,
    /// Lowest best height at which a tip change immediately restarts mining.
    pub activation_height: u64,
    /// How long replacing a worker waits for the old one to stop.
    pub cancel_timeout: Duration,
    /// Nonces tried between two checks of the cancel flag.
    pub batch_size: u64,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            workers: num_cpus::get().max(1),
            interval: Duration::from_secs(60),
            activation_height: 0,
            cancel_timeout: Duration::from_secs(5),
            batch_size: 100_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = NodeConfig::default();
        assert_eq!(config.storage.data_dir, PathBuf::from("./data"));
        assert_eq!(config.mining.interval, Duration::from_secs(60));
        assert_eq!(config.mining.activation_height, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let key = "11".repeat(32);
        let mut config = NodeConfig::default();
        config.apply_env(env(&[
            ("MB_DATA_DIR", "/var/lib/marabu"),
            ("MB_MINING_ENABLED", "false"),
            ("MB_MINER_WORKERS", "3"),
            ("MB_MINING_INTERVAL_SECS", "15"),
            ("MB_MINING_ACTIVATION_HEIGHT", "1690"),
            ("MB_MINER_PUBKEY", key.as_str()),
        ]));

        assert_eq!(config.storage.data_dir, PathBuf::from("/var/lib/marabu"));
        assert!(!config.mining.enabled);
        assert_eq!(config.mining.workers, 3);
        assert_eq!(config.mining.interval, Duration::from_secs(15));
        assert_eq!(config.mining.activation_height, 1690);
        assert_eq!(config.mempool.coinbase_recipient, PublicKey::from_bytes([0x11; 32]));
    }

    #[test]
    fn test_unparseable_values_ignored() {
        let mut config = NodeConfig::default();
        let workers = config.mining.workers;
        config.apply_env(env(&[
            ("MB_MINER_WORKERS", "many"),
            ("MB_MINER_PUBKEY", "ABCD"),
        ]));

        assert_eq!(config.mining.workers, workers);
        assert_eq!(
            config.mempool.coinbase_recipient,
            NodeConfig::default().mempool.coinbase_recipient
        );
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let mut config = NodeConfig::default();
        config.mining.workers = 0;
        assert_eq!(config.validate(), Err(ConfigError::NoMiningWorkers));

        config.mining.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_mempool_config_combines_sections() {
        let mut config = NodeConfig::default();
        config.mining.workers = 2;
        let params = config.consensus_params();

        let mempool = config.mempool_config(&params);
        assert_eq!(mempool.block_reward, params.block_reward);
        assert_eq!(mempool.miner.workers, 2);
        assert_eq!(mempool.coinbase_recipient, config.mempool.coinbase_recipient);
    }
}
