//! # Core Domain Entities
//!
//! Transactions, blocks and the [`NetworkObject`] union that carries them.
//!
//! Each type has an explicit `to_json_value` that produces the exact shape
//! that is hashed. The serde derives produce the same shape and are used for
//! decoding objects received from peers or read back from storage.

use crate::canonical::{canonical_bytes, object_id};
use crate::errors::ObjectError;
use crate::hex_types::{Nonce, ObjectId, PublicKey, Signature, Target};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

// =============================================================================
// TRANSACTIONS
// =============================================================================

/// Reference to one output of one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Outpoint {
    /// Transaction that created the output.
    pub txid: ObjectId,
    /// Position in that transaction's output list.
    pub index: u32,
}

impl Outpoint {
    /// Create an outpoint.
    pub fn new(txid: ObjectId, index: u32) -> Self {
        Self { txid, index }
    }

    fn to_json_value(self) -> Value {
        let mut map = Map::new();
        map.insert("txid".into(), Value::String(self.txid.to_hex()));
        map.insert("index".into(), Value::from(self.index));
        Value::Object(map)
    }
}

impl fmt::Display for Outpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.txid, self.index)
    }
}

/// An amount paid to a public key. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    /// Owner of the funds.
    pub pubkey: PublicKey,
    /// Amount in base units.
    pub value: u64,
}

impl Output {
    fn to_json_value(self) -> Value {
        let mut map = Map::new();
        map.insert("pubkey".into(), Value::String(self.pubkey.to_hex()));
        map.insert("value".into(), Value::from(self.value));
        Value::Object(map)
    }
}

/// A spent outpoint plus the owner's signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Input {
    /// Output being spent.
    pub outpoint: Outpoint,
    /// Signature over the signing message; `null` while the transaction is
    /// being signed.
    pub sig: Option<Signature>,
}

impl Input {
    /// Unsigned input spending `outpoint`.
    pub fn unsigned(outpoint: Outpoint) -> Self {
        Self {
            outpoint,
            sig: None,
        }
    }

    fn to_json_value(self) -> Value {
        let mut map = Map::new();
        map.insert("outpoint".into(), self.outpoint.to_json_value());
        map.insert(
            "sig".into(),
            self.sig
                .map(|s| Value::String(s.to_hex()))
                .unwrap_or(Value::Null),
        );
        Value::Object(map)
    }
}

/// A value transfer. A transaction with no inputs is a coinbase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Spent outputs, empty for a coinbase.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<Input>,
    /// Created outputs, indexed from zero.
    pub outputs: Vec<Output>,
    /// Block height a coinbase is bound to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u64>,
}

impl Transaction {
    /// Coinbase minting `outputs` at `height`.
    pub fn coinbase(height: u64, outputs: Vec<Output>) -> Self {
        Self {
            inputs: Vec::new(),
            outputs,
            height: Some(height),
        }
    }

    /// A transaction is a coinbase iff it has no inputs.
    pub fn is_coinbase(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Transaction id, recomputed from the current contents.
    pub fn id(&self) -> ObjectId {
        object_id(&self.to_json_value())
    }

    /// Canonical encoding, including the `"type"` tag.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        canonical_bytes(&self.to_json_value())
    }

    /// Bytes signed by every input: the canonical encoding with all `sig`
    /// fields set to `null`.
    pub fn signing_message(&self) -> Vec<u8> {
        let mut unsigned = self.clone();
        for input in &mut unsigned.inputs {
            input.sig = None;
        }
        unsigned.canonical_bytes()
    }

    /// Outpoints created by this transaction, in output order.
    pub fn outpoints(&self) -> impl Iterator<Item = Outpoint> + '_ {
        let txid = self.id();
        (0..self.outputs.len()).map(move |i| Outpoint::new(txid, i as u32))
    }

    /// Sum of output values, `None` on overflow.
    pub fn output_sum(&self) -> Option<u64> {
        self.outputs
            .iter()
            .try_fold(0u64, |acc, o| acc.checked_add(o.value))
    }

    /// Wrap in the network union.
    pub fn to_network_object(&self) -> NetworkObject {
        NetworkObject::Transaction(self.clone())
    }

    /// Unwrap from the network union.
    pub fn from_network_object(object: NetworkObject) -> Result<Self, ObjectError> {
        match object {
            NetworkObject::Transaction(tx) => Ok(tx),
            NetworkObject::Block(_) => Err(ObjectError::KindMismatch {
                expected: ObjectKind::Transaction,
                found: ObjectKind::Block,
            }),
        }
    }

    /// JSON shape of the object, tagged with `"type"`.
    pub fn to_json_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("type".into(), Value::String("transaction".into()));
        if !self.inputs.is_empty() {
            map.insert(
                "inputs".into(),
                Value::Array(self.inputs.iter().map(|i| i.to_json_value()).collect()),
            );
        }
        map.insert(
            "outputs".into(),
            Value::Array(self.outputs.iter().map(|o| o.to_json_value()).collect()),
        );
        if let Some(height) = self.height {
            map.insert("height".into(), Value::from(height));
        }
        Value::Object(map)
    }
}

// =============================================================================
// BLOCKS
// =============================================================================

/// A proof-of-work block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Ids of the block's transactions; a coinbase, if any, comes first.
    pub txids: Vec<ObjectId>,
    /// Proof-of-work nonce.
    pub nonce: Nonce,
    /// Parent block, `None` only for the genesis block.
    pub previd: Option<ObjectId>,
    /// Unix timestamp in seconds.
    pub created: u64,
    /// Declared proof-of-work target.
    #[serde(rename = "T")]
    pub target: Target,
    /// Free-form miner name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub miner: Option<String>,
    /// Free-form note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Study-group identifiers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub studentids: Option<Vec<String>>,
}

impl Block {
    /// Block id, recomputed from the current contents.
    pub fn id(&self) -> ObjectId {
        object_id(&self.to_json_value())
    }

    /// Canonical encoding, including the `"type"` tag.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        canonical_bytes(&self.to_json_value())
    }

    /// Returns true if the block id satisfies its declared target.
    pub fn has_valid_pow(&self) -> bool {
        self.id().meets(&self.target)
    }

    /// Wrap in the network union.
    pub fn to_network_object(&self) -> NetworkObject {
        NetworkObject::Block(self.clone())
    }

    /// Unwrap from the network union.
    pub fn from_network_object(object: NetworkObject) -> Result<Self, ObjectError> {
        match object {
            NetworkObject::Block(block) => Ok(block),
            NetworkObject::Transaction(_) => Err(ObjectError::KindMismatch {
                expected: ObjectKind::Block,
                found: ObjectKind::Transaction,
            }),
        }
    }

    /// JSON shape of the object, tagged with `"type"`.
    pub fn to_json_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("type".into(), Value::String("block".into()));
        map.insert(
            "txids".into(),
            Value::Array(
                self.txids
                    .iter()
                    .map(|id| Value::String(id.to_hex()))
                    .collect(),
            ),
        );
        map.insert("nonce".into(), Value::String(self.nonce.to_hex()));
        map.insert(
            "previd".into(),
            self.previd
                .map(|id| Value::String(id.to_hex()))
                .unwrap_or(Value::Null),
        );
        map.insert("created".into(), Value::from(self.created));
        map.insert("T".into(), Value::String(self.target.to_hex()));
        if let Some(miner) = &self.miner {
            map.insert("miner".into(), Value::String(miner.clone()));
        }
        if let Some(note) = &self.note {
            map.insert("note".into(), Value::String(note.clone()));
        }
        if let Some(ids) = &self.studentids {
            map.insert(
                "studentids".into(),
                Value::Array(ids.iter().cloned().map(Value::String).collect()),
            );
        }
        Value::Object(map)
    }
}

// =============================================================================
// NETWORK OBJECTS
// =============================================================================

/// Variant tag of a [`NetworkObject`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// A transaction.
    Transaction,
    /// A block.
    Block,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectKind::Transaction => f.write_str("transaction"),
            ObjectKind::Block => f.write_str("block"),
        }
    }
}

/// Any object exchanged between peers, tagged by its `"type"` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NetworkObject {
    /// `{"type":"transaction",...}`
    Transaction(Transaction),
    /// `{"type":"block",...}`
    Block(Block),
}

impl NetworkObject {
    /// Decode from JSON bytes in any key order.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ObjectError> {
        serde_json::from_slice(bytes).map_err(|e| ObjectError::Malformed(e.to_string()))
    }

    /// Variant of this object.
    pub fn kind(&self) -> ObjectKind {
        match self {
            NetworkObject::Transaction(_) => ObjectKind::Transaction,
            NetworkObject::Block(_) => ObjectKind::Block,
        }
    }

    /// Object id.
    pub fn id(&self) -> ObjectId {
        object_id(&self.to_json_value())
    }

    /// Canonical encoding, used for hashing, storage and transmission.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        canonical_bytes(&self.to_json_value())
    }

    /// JSON shape of the wrapped object.
    pub fn to_json_value(&self) -> Value {
        match self {
            NetworkObject::Transaction(tx) => tx.to_json_value(),
            NetworkObject::Block(block) => block.to_json_value(),
        }
    }
}

impl From<Transaction> for NetworkObject {
    fn from(tx: Transaction) -> Self {
        NetworkObject::Transaction(tx)
    }
}

impl From<Block> for NetworkObject {
    fn from(block: Block) -> Self {
        NetworkObject::Block(block)
    }
}
