//! Consensus parameters.
//!
//! Every node must agree on these values; a mismatch in any of them splits
//! the network.

use shared_types::{Block, Nonce, ObjectId, Target};

/// Marabu proof-of-work target, constant for every height.
pub const MARABU_TARGET_HEX: &str =
    "00000000abc00000000000000000000000000000000000000000000000000000";

const MARABU_TARGET: Target = Target::from_bytes([
    0x00, 0x00, 0x00, 0x00, 0xab, 0xc0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
]);

const GENESIS_NONCE: Nonce = Nonce::from_bytes([
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02, 0x1b, 0xea, 0x03, 0xed,
]);

const GENESIS_CREATED: u64 = 1_671_062_400;

/// Block reward minted by each coinbase, in base units.
pub const BLOCK_REWARD: u64 = 50_000_000_000_000;

/// Consensus parameters of a network.
#[derive(Debug, Clone)]
pub struct ConsensusParams {
    /// Target required at every height.
    pub target: Target,
    /// Maximum value a coinbase may mint on top of the block's fees.
    pub block_reward: u64,
    /// The genesis block. Trusted as given, not proof-of-work checked.
    pub genesis: Block,
    /// Maximum number of unvalidated ancestors resolved for one block.
    pub max_ancestry_depth: usize,
}

impl ConsensusParams {
    /// Parameters of the Marabu network.
    pub fn marabu() -> Self {
        Self {
            target: MARABU_TARGET,
            block_reward: BLOCK_REWARD,
            genesis: Block {
                txids: vec![],
                nonce: GENESIS_NONCE,
                previd: None,
                created: GENESIS_CREATED,
                target: MARABU_TARGET,
                miner: Some("Marabu".into()),
                note: Some(
                    "The New York Times 2022-12-13: Scientists Achieve Nuclear Fusion Breakthrough With Blast of 192 Lasers"
                        .into(),
                ),
                studentids: None,
            },
            max_ancestry_depth: 10_000,
        }
    }

    /// Parameters for tests: every block id satisfies the target.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn testing() -> Self {
        Self {
            target: shared_types::test_utils::TEST_TARGET,
            block_reward: BLOCK_REWARD,
            genesis: shared_types::test_utils::test_block(None, vec![], GENESIS_CREATED),
            max_ancestry_depth: 100,
        }
    }

    /// Target required for a block at `height`.
    ///
    /// The schedule is constant: there is no retargeting.
    pub fn target_at(&self, _height: u64) -> Target {
        self.target
    }

    /// Id of the genesis block.
    pub fn genesis_id(&self) -> ObjectId {
        self.genesis.id()
    }
}

impl Default for ConsensusParams {
    fn default() -> Self {
        Self::marabu()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_constant_matches_hex() {
        assert_eq!(MARABU_TARGET.to_hex(), MARABU_TARGET_HEX);
        let params = ConsensusParams::marabu();
        assert_eq!(params.target_at(0), params.target_at(1_000_000));
    }

    #[test]
    fn test_genesis_encoding() {
        let genesis = ConsensusParams::marabu().genesis;
        let text = String::from_utf8(genesis.canonical_bytes()).unwrap();
        assert_eq!(
            text,
            concat!(
                "{\"T\":\"00000000abc00000000000000000000000000000000000000000000000000000\",",
                "\"created\":1671062400,\"miner\":\"Marabu\",",
                "\"nonce\":\"000000000000000000000000000000000000000000000000000000021bea03ed\",",
                "\"note\":\"The New York Times 2022-12-13: Scientists Achieve Nuclear Fusion Breakthrough With Blast of 192 Lasers\",",
                "\"previd\":null,\"txids\":[],\"type\":\"block\"}"
            )
        );
    }
}
