//! Mempool configuration.

use mb_05_mining::MinerConfig;
use shared_types::PublicKey;

const DEFAULT_RECIPIENT: PublicKey = PublicKey::from_bytes([
    0xf3, 0xba, 0x5a, 0xf0, 0xa2, 0x4a, 0x60, 0x6d, 0x93, 0xf9, 0xbf, 0xe4, 0xc8, 0x55, 0x34, 0x64,
    0x15, 0xb8, 0x42, 0x63, 0x45, 0x7f, 0x51, 0x8a, 0x6b, 0x24, 0x58, 0x8b, 0xc0, 0xd5, 0x26, 0x92,
]);

/// Mempool and block template configuration.
#[derive(Clone, Debug)]
pub struct MempoolConfig {
    /// Public key the coinbase of mined blocks pays.
    pub coinbase_recipient: PublicKey,
    /// Value of the coinbase output.
    pub block_reward: u64,
    /// `miner` field of mined blocks.
    pub miner_name: Option<String>,
    /// `note` field of mined blocks.
    pub note: Option<String>,
    /// `studentids` field of mined blocks.
    pub student_ids: Option<Vec<String>>,
    /// Worker pool settings.
    pub miner: MinerConfig,
}

impl Default for MempoolConfig {
    fn default() -> Self {
        Self {
            coinbase_recipient: DEFAULT_RECIPIENT,
            block_reward: 50_000_000_000_000,
            miner_name: Some("marabu-node".into()),
            note: None,
            student_ids: None,
            miner: MinerConfig::default(),
        }
    }
}
