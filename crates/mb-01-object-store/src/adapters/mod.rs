//! Key-value store adapters.
//!
//! Both adapters keep the full map in memory in key order; the file-backed
//! one additionally rewrites its file after every mutation.

mod file;
mod memory;

pub use file::FileBackedKVStore;
pub use memory::InMemoryKVStore;

use crate::ports::outbound::BatchOperation;
use std::collections::BTreeMap;

pub(crate) type Entries = BTreeMap<Vec<u8>, Vec<u8>>;

pub(crate) fn apply_batch(data: &mut Entries, operations: Vec<BatchOperation>) {
    for op in operations {
        match op {
            BatchOperation::Put { key, value } => {
                data.insert(key, value);
            }
            BatchOperation::Delete { key } => {
                data.remove(&key);
            }
        }
    }
}

pub(crate) fn scan(data: &Entries, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
    data.range(prefix.to_vec()..)
        .take_while(|(k, _)| k.starts_with(prefix))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}
