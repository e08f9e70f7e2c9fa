//! # UTXO Set

use super::errors::UtxoError;
use serde::{Deserialize, Serialize};
use shared_types::{ObjectId, Outpoint, Transaction};
use std::collections::BTreeSet;

/// Set of unspent outpoints.
///
/// Every operation validates first and mutates second, so a failed call
/// leaves the set exactly as it was.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoSet {
    outpoints: BTreeSet<Outpoint>,
}

impl UtxoSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set containing exactly `outpoints`.
    pub fn from_outpoints(outpoints: impl IntoIterator<Item = Outpoint>) -> Self {
        Self {
            outpoints: outpoints.into_iter().collect(),
        }
    }

    /// Number of unspent outpoints.
    pub fn len(&self) -> usize {
        self.outpoints.len()
    }

    /// Returns true if nothing is unspent.
    pub fn is_empty(&self) -> bool {
        self.outpoints.is_empty()
    }

    /// Returns true if `outpoint` is unspent.
    pub fn contains(&self, outpoint: &Outpoint) -> bool {
        self.outpoints.contains(outpoint)
    }

    /// Unspent outpoints in order.
    pub fn iter(&self) -> impl Iterator<Item = &Outpoint> {
        self.outpoints.iter()
    }

    /// Snapshot as an ordered list.
    pub fn to_vec(&self) -> Vec<Outpoint> {
        self.outpoints.iter().copied().collect()
    }

    /// Apply `tx` (whose id is `txid`): spend its inputs, add its outputs.
    ///
    /// A coinbase spends nothing.
    pub fn apply(&mut self, txid: &ObjectId, tx: &Transaction) -> Result<(), UtxoError> {
        let mut spent = BTreeSet::new();
        for input in &tx.inputs {
            if !spent.insert(input.outpoint) {
                return Err(UtxoError::DuplicateInput(input.outpoint));
            }
            if !self.outpoints.contains(&input.outpoint) {
                return Err(UtxoError::MissingOutpoint(input.outpoint));
            }
        }

        let created = created_outpoints(txid, tx);
        if let Some(existing) = created.iter().find(|o| self.outpoints.contains(o)) {
            return Err(UtxoError::OutputExists(*existing));
        }

        for outpoint in &spent {
            self.outpoints.remove(outpoint);
        }
        self.outpoints.extend(created);
        Ok(())
    }

    /// Undo a successful [`apply`](Self::apply) of `tx`.
    pub fn revert(&mut self, txid: &ObjectId, tx: &Transaction) -> Result<(), UtxoError> {
        let created = created_outpoints(txid, tx);
        if let Some(missing) = created.iter().find(|o| !self.outpoints.contains(o)) {
            return Err(UtxoError::MissingOutpoint(*missing));
        }

        let mut restored = BTreeSet::new();
        for input in &tx.inputs {
            if !restored.insert(input.outpoint) {
                return Err(UtxoError::DuplicateInput(input.outpoint));
            }
            if self.outpoints.contains(&input.outpoint) {
                return Err(UtxoError::OutputExists(input.outpoint));
            }
        }

        for outpoint in &created {
            self.outpoints.remove(outpoint);
        }
        self.outpoints.extend(restored);
        Ok(())
    }
}

fn created_outpoints(txid: &ObjectId, tx: &Transaction) -> Vec<Outpoint> {
    (0..tx.outputs.len())
        .map(|index| Outpoint::new(*txid, index as u32))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::test_utils::{coinbase_to, signed_transaction, test_keypair};
    use shared_types::{Output, PublicKey};

    fn funded() -> (UtxoSet, ObjectId) {
        let coinbase = coinbase_to(&test_keypair(1), 1, 100);
        let txid = coinbase.id();
        let mut set = UtxoSet::new();
        set.apply(&txid, &coinbase).unwrap();
        (set, txid)
    }

    #[test]
    fn test_coinbase_adds_outputs_only() {
        let (set, txid) = funded();
        assert_eq!(set.to_vec(), vec![Outpoint::new(txid, 0)]);
    }

    #[test]
    fn test_spend_replaces_input_with_outputs() {
        let (mut set, funding) = funded();
        let mut tx = signed_transaction(&test_keypair(1), &[(funding, 0)], 40);
        tx.outputs.push(Output {
            pubkey: PublicKey::from_bytes([2; 32]),
            value: 60,
        });
        let txid = tx.id();

        set.apply(&txid, &tx).unwrap();

        assert!(!set.contains(&Outpoint::new(funding, 0)));
        assert!(set.contains(&Outpoint::new(txid, 0)));
        assert!(set.contains(&Outpoint::new(txid, 1)));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_second_apply_is_a_conflict() {
        let (mut set, funding) = funded();
        let tx = signed_transaction(&test_keypair(1), &[(funding, 0)], 40);
        let txid = tx.id();

        set.apply(&txid, &tx).unwrap();
        let before = set.clone();

        assert_eq!(
            set.apply(&txid, &tx),
            Err(UtxoError::MissingOutpoint(Outpoint::new(funding, 0)))
        );
        assert_eq!(set, before);
    }

    #[test]
    fn test_failed_apply_leaves_set_unchanged() {
        let (mut set, funding) = funded();
        let unknown = ObjectId::from_bytes([7; 32]);
        let tx = signed_transaction(&test_keypair(1), &[(funding, 0), (unknown, 0)], 40);
        let before = set.clone();

        assert_eq!(
            set.apply(&tx.id(), &tx),
            Err(UtxoError::MissingOutpoint(Outpoint::new(unknown, 0)))
        );
        assert_eq!(set, before);
    }

    #[test]
    fn test_duplicate_input_rejected() {
        let (mut set, funding) = funded();
        let tx = signed_transaction(&test_keypair(1), &[(funding, 0), (funding, 0)], 40);
        assert_eq!(
            set.apply(&tx.id(), &tx),
            Err(UtxoError::DuplicateInput(Outpoint::new(funding, 0)))
        );
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_reapplying_coinbase_is_output_exists() {
        let (mut set, funding) = funded();
        let coinbase = coinbase_to(&test_keypair(1), 1, 100);
        assert_eq!(
            set.apply(&funding, &coinbase),
            Err(UtxoError::OutputExists(Outpoint::new(funding, 0)))
        );
    }

    #[test]
    fn test_revert_is_inverse_of_apply() {
        let (mut set, funding) = funded();
        let original = set.clone();
        let tx = signed_transaction(&test_keypair(1), &[(funding, 0)], 40);
        let txid = tx.id();

        set.apply(&txid, &tx).unwrap();
        set.revert(&txid, &tx).unwrap();
        assert_eq!(set, original);

        assert_eq!(
            set.revert(&txid, &tx),
            Err(UtxoError::MissingOutpoint(Outpoint::new(txid, 0)))
        );
        assert_eq!(set, original);
    }

    #[test]
    fn test_size_tracks_outputs_minus_inputs() {
        let owner = test_keypair(1);
        let mut set = UtxoSet::new();
        let mut created = 0usize;
        let mut consumed = 0usize;

        let a = coinbase_to(&owner, 1, 50);
        let b = coinbase_to(&owner, 2, 50);
        set.apply(&a.id(), &a).unwrap();
        set.apply(&b.id(), &b).unwrap();
        created += 2;

        let merge = signed_transaction(&owner, &[(a.id(), 0), (b.id(), 0)], 100);
        set.apply(&merge.id(), &merge).unwrap();
        created += 1;
        consumed += 2;

        assert_eq!(set.len(), created - consumed);
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let (set, _) = funded();
        let bytes = bincode::serialize(&set.to_vec()).unwrap();
        let restored = UtxoSet::from_outpoints(bincode::deserialize::<Vec<Outpoint>>(&bytes).unwrap());
        assert_eq!(restored, set);
    }
}
