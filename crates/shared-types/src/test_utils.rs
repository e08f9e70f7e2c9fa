//! Deterministic fixtures for tests across the workspace.
//!
//! Enabled with the `test-utils` feature. Blocks built here use
//! [`TEST_TARGET`], under which every block id satisfies proof-of-work.

use crate::entities::{Block, Input, Outpoint, Output, Transaction};
use crate::hex_types::{Nonce, ObjectId, PublicKey, Target};
use shared_crypto::Ed25519KeyPair;

/// Target that every id meets.
pub const TEST_TARGET: Target = Target::from_bytes([0xff; 32]);

/// Keypair derived from a one-byte seed.
pub fn test_keypair(seed: u8) -> Ed25519KeyPair {
    Ed25519KeyPair::from_seed([seed; 32])
}

/// Public key of [`test_keypair`].
pub fn test_pubkey(seed: u8) -> PublicKey {
    test_keypair(seed).public_key().into()
}

/// Coinbase paying `value` to `owner` at `height`.
pub fn coinbase_to(owner: &Ed25519KeyPair, height: u64, value: u64) -> Transaction {
    Transaction::coinbase(
        height,
        vec![Output {
            pubkey: owner.public_key().into(),
            value,
        }],
    )
}

/// Sign every input of `tx` with `owner`.
pub fn sign_all(tx: &mut Transaction, owner: &Ed25519KeyPair) {
    let message = tx.signing_message();
    let sig = owner.sign(&message).into();
    for input in &mut tx.inputs {
        input.sig = Some(sig);
    }
}

/// Transaction spending `spends` (all owned by `owner`) into a single output
/// of `value` paid back to `owner`.
pub fn signed_transaction(
    owner: &Ed25519KeyPair,
    spends: &[(ObjectId, u32)],
    value: u64,
) -> Transaction {
    let mut tx = Transaction {
        inputs: spends
            .iter()
            .map(|&(txid, index)| Input::unsigned(Outpoint::new(txid, index)))
            .collect(),
        outputs: vec![Output {
            pubkey: owner.public_key().into(),
            value,
        }],
        height: None,
    };
    sign_all(&mut tx, owner);
    tx
}

/// Block under [`TEST_TARGET`].
pub fn test_block(previd: Option<ObjectId>, txids: Vec<ObjectId>, created: u64) -> Block {
    Block {
        txids,
        nonce: Nonce::from_bytes([0; 32]),
        previd,
        created,
        target: TEST_TARGET,
        miner: Some("test".into()),
        note: None,
        studentids: None,
    }
}
