//! # Object Store Service
//!
//! Shared, read-mostly infrastructure. Every component references objects by
//! id and materialises them through this service.

use crate::domain::errors::StoreError;
use crate::domain::keys::{object_key, record_key, OBJECT_PREFIX};
use crate::ports::outbound::{BatchOperation, KeyValueStore};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_types::{Block, NetworkObject, ObjectId, Outpoint, Output, Transaction};
use tracing::debug;

/// Content-addressed store of network objects.
pub struct ObjectStore<S: KeyValueStore> {
    kv: RwLock<S>,
}

impl<S: KeyValueStore> ObjectStore<S> {
    /// Wrap a key-value backend.
    pub fn new(kv: S) -> Self {
        Self { kv: RwLock::new(kv) }
    }

    /// Deterministic id of an object. Pure, performs no I/O.
    pub fn id(object: &NetworkObject) -> ObjectId {
        object.id()
    }

    /// Persist an object under its id.
    ///
    /// Idempotent: an object that is already stored is not written again.
    pub fn put(&self, object: &NetworkObject) -> Result<ObjectId, StoreError> {
        let bytes = object.canonical_bytes();
        let id = ObjectId::from_bytes(shared_crypto::blake2s_256(&bytes));
        let key = object_key(&id);

        let mut kv = self.kv.write();
        if kv.exists(&key)? {
            return Ok(id);
        }
        kv.put(&key, &bytes)?;
        debug!("[mb-01] Stored {} {}", object.kind(), id);
        Ok(id)
    }

    /// Persist a transaction.
    pub fn put_transaction(&self, tx: &Transaction) -> Result<ObjectId, StoreError> {
        self.put(&tx.to_network_object())
    }

    /// Persist a block.
    pub fn put_block(&self, block: &Block) -> Result<ObjectId, StoreError> {
        self.put(&block.to_network_object())
    }

    /// Returns true if an object with `id` is stored.
    pub fn exists(&self, id: &ObjectId) -> Result<bool, StoreError> {
        Ok(self.kv.read().exists(&object_key(id))?)
    }

    /// Fetch an object.
    pub fn get(&self, id: &ObjectId) -> Result<NetworkObject, StoreError> {
        let bytes = self
            .kv
            .read()
            .get(&object_key(id))?
            .ok_or(StoreError::NotFound(*id))?;

        NetworkObject::from_json(&bytes).map_err(|e| StoreError::Corrupt {
            key: id.to_hex(),
            message: e.to_string(),
        })
    }

    /// Fetch a transaction. Fails if the object is a block.
    pub fn get_transaction(&self, id: &ObjectId) -> Result<Transaction, StoreError> {
        Transaction::from_network_object(self.get(id)?).map_err(|e| StoreError::mismatch(*id, e))
    }

    /// Fetch a block. Fails if the object is a transaction.
    pub fn get_block(&self, id: &ObjectId) -> Result<Block, StoreError> {
        Block::from_network_object(self.get(id)?).map_err(|e| StoreError::mismatch(*id, e))
    }

    /// Materialise the output an outpoint refers to.
    pub fn output(&self, outpoint: &Outpoint) -> Result<Output, StoreError> {
        let tx = self.get_transaction(&outpoint.txid)?;
        tx.outputs
            .get(outpoint.index as usize)
            .copied()
            .ok_or(StoreError::InvalidOutpoint {
                outpoint: *outpoint,
                outputs: tx.outputs.len(),
            })
    }

    /// Ids of every stored object, in key order.
    pub fn object_ids(&self) -> Result<Vec<ObjectId>, StoreError> {
        let entries = self.kv.read().prefix_scan(OBJECT_PREFIX)?;
        entries
            .into_iter()
            .map(|(key, _)| {
                let hex = String::from_utf8_lossy(&key[OBJECT_PREFIX.len()..]).into_owned();
                ObjectId::from_hex(&hex).map_err(|e| StoreError::Corrupt {
                    key: hex,
                    message: e.to_string(),
                })
            })
            .collect()
    }

    /// Write a single named record.
    pub fn put_record<T: Serialize>(&self, name: &str, value: &T) -> Result<(), StoreError> {
        let mut batch = RecordBatch::new();
        batch.put(name, value)?;
        self.write_records(batch)
    }

    /// Read a named record, `None` if it was never written.
    pub fn get_record<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, StoreError> {
        let Some(bytes) = self.kv.read().get(&record_key(name))? else {
            return Ok(None);
        };
        bincode::deserialize(&bytes)
            .map(Some)
            .map_err(|e| StoreError::Corrupt {
                key: name.to_string(),
                message: e.to_string(),
            })
    }

    /// Write every record of `batch` atomically.
    pub fn write_records(&self, batch: RecordBatch) -> Result<(), StoreError> {
        if batch.operations.is_empty() {
            return Ok(());
        }
        self.kv.write().atomic_batch_write(batch.operations)?;
        Ok(())
    }
}

/// Named records written together in one atomic batch.
#[derive(Debug, Default)]
pub struct RecordBatch {
    operations: Vec<BatchOperation>,
}

impl RecordBatch {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a bincode-encoded record.
    pub fn put<T: Serialize>(&mut self, name: &str, value: &T) -> Result<&mut Self, StoreError> {
        let bytes = bincode::serialize(value).map_err(|e| StoreError::Encoding {
            key: name.to_string(),
            message: e.to_string(),
        })?;
        self.operations
            .push(BatchOperation::put(record_key(name), bytes));
        Ok(self)
    }

    /// Number of records in the batch.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Returns true if the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryKVStore;
    use crate::domain::errors::KVStoreError;
    use shared_types::test_utils::{coinbase_to, test_block, test_keypair};
    use shared_types::ObjectKind;

    fn store() -> ObjectStore<InMemoryKVStore> {
        ObjectStore::new(InMemoryKVStore::new())
    }

    #[test]
    fn test_put_returns_content_id() {
        let store = store();
        let tx = coinbase_to(&test_keypair(1), 1, 50);

        let id = store.put_transaction(&tx).unwrap();
        assert_eq!(id, tx.id());
        assert_eq!(id, ObjectStore::<InMemoryKVStore>::id(&tx.to_network_object()));
        assert_eq!(store.get_transaction(&id).unwrap(), tx);
    }

    #[test]
    fn test_get_unknown_is_not_found() {
        let id = ObjectId::from_bytes([9; 32]);
        assert_eq!(store().get(&id), Err(StoreError::NotFound(id)));
    }

    #[test]
    fn test_typed_accessors_reject_other_kind() {
        let store = store();
        let block = test_block(None, vec![], 1);
        let id = store.put_block(&block).unwrap();

        assert_eq!(
            store.get_transaction(&id),
            Err(StoreError::KindMismatch {
                id,
                expected: ObjectKind::Transaction,
                found: ObjectKind::Block
            })
        );
        assert_eq!(store.get_block(&id).unwrap(), block);
    }

    /// Backend that counts writes, to observe idempotent puts.
    #[derive(Default)]
    struct CountingStore {
        inner: InMemoryKVStore,
        writes: usize,
    }

    impl KeyValueStore for CountingStore {
        fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
            self.inner.get(key)
        }
        fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KVStoreError> {
            self.writes += 1;
            self.inner.put(key, value)
        }
        fn delete(&mut self, key: &[u8]) -> Result<(), KVStoreError> {
            self.writes += 1;
            self.inner.delete(key)
        }
        fn atomic_batch_write(&mut self, ops: Vec<BatchOperation>) -> Result<(), KVStoreError> {
            self.writes += 1;
            self.inner.atomic_batch_write(ops)
        }
        fn exists(&self, key: &[u8]) -> Result<bool, KVStoreError> {
            self.inner.exists(key)
        }
        fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, KVStoreError> {
            self.inner.prefix_scan(prefix)
        }
    }

    #[test]
    fn test_put_is_idempotent() {
        let store = ObjectStore::new(CountingStore::default());
        let tx = coinbase_to(&test_keypair(1), 3, 50);

        let first = store.put_transaction(&tx).unwrap();
        let second = store.put_transaction(&tx).unwrap();

        assert_eq!(first, second);
        assert_eq!(store.kv.read().writes, 1);
    }

    #[test]
    fn test_output_resolution() {
        let store = store();
        let tx = coinbase_to(&test_keypair(1), 1, 50);
        let txid = store.put_transaction(&tx).unwrap();

        assert_eq!(store.output(&Outpoint::new(txid, 0)).unwrap().value, 50);
        assert_eq!(
            store.output(&Outpoint::new(txid, 1)),
            Err(StoreError::InvalidOutpoint {
                outpoint: Outpoint::new(txid, 1),
                outputs: 1
            })
        );

        let unknown = ObjectId::from_bytes([3; 32]);
        assert_eq!(
            store.output(&Outpoint::new(unknown, 0)),
            Err(StoreError::NotFound(unknown))
        );
    }

    #[test]
    fn test_records_roundtrip() {
        let store = store();
        assert_eq!(store.get_record::<Vec<u32>>("mempool:txids").unwrap(), None);

        let mut batch = RecordBatch::new();
        batch
            .put("mempool:txids", &vec![1u32, 2])
            .unwrap()
            .put("mempool:state", &vec![Outpoint::new(ObjectId::from_bytes([1; 32]), 0)])
            .unwrap();
        assert_eq!(batch.len(), 2);
        store.write_records(batch).unwrap();

        assert_eq!(
            store.get_record::<Vec<u32>>("mempool:txids").unwrap(),
            Some(vec![1, 2])
        );
        assert_eq!(
            store
                .get_record::<Vec<Outpoint>>("mempool:state")
                .unwrap()
                .map(|v| v.len()),
            Some(1)
        );
    }

    #[test]
    fn test_object_ids_lists_only_objects() {
        let store = store();
        let tx = coinbase_to(&test_keypair(1), 1, 50);
        store.put_transaction(&tx).unwrap();
        store.put_record("chain:tip", &7u64).unwrap();

        assert_eq!(store.object_ids().unwrap(), vec![tx.id()]);
    }
}
