//! # Storage Backends
//!
//! The object store runs on the file-backed store by default. Enable the
//! `rocksdb` feature to use RocksDB instead:
//!
//! ```toml
//! node-runtime = { path = "...", features = ["rocksdb"] }
//! ```

#[cfg(feature = "rocksdb")]
pub mod rocksdb_adapter;

#[cfg(feature = "rocksdb")]
pub use rocksdb_adapter::{RocksDbConfig, RocksDbStore};

use crate::container::config::StorageConfig;
use mb_01_object_store::KVStoreError;

/// Key-value backend selected at build time.
#[cfg(feature = "rocksdb")]
pub type NodeStore = RocksDbStore;

/// Key-value backend selected at build time.
#[cfg(not(feature = "rocksdb"))]
pub type NodeStore = mb_01_object_store::FileBackedKVStore;

/// Open the configured backend under the data directory.
pub fn open_store(config: &StorageConfig) -> Result<NodeStore, KVStoreError> {
    std::fs::create_dir_all(&config.data_dir)?;

    #[cfg(feature = "rocksdb")]
    {
        RocksDbStore::open(RocksDbConfig::new(config.data_dir.join("rocksdb")))
    }

    #[cfg(not(feature = "rocksdb"))]
    {
        mb_01_object_store::FileBackedKVStore::open(config.data_dir.join("objects.db"))
    }
}
