//! # Storage Backends
//!
//! Selects the `QuestStore` implementation named by the configuration.

#[cfg(feature = "rocksdb")]
pub mod rocksdb_store;

use std::sync::Arc;

use ql_01_progression::{InMemoryQuestStore, QuestStore, StoreError};
use tracing::info;

use crate::container::config::{StorageBackend, StorageConfig};

#[cfg(feature = "rocksdb")]
pub use rocksdb_store::{RocksDbConfig, RocksDbQuestStore};

/// Open the configured store.
pub fn open_store(config: &StorageConfig) -> Result<Arc<dyn QuestStore>, StoreError> {
    match config.backend {
        StorageBackend::Memory => {
            info!("[ql-rt] Using in-memory quest store (state is lost on exit)");
            Ok(Arc::new(InMemoryQuestStore::new()))
        }
        #[cfg(feature = "rocksdb")]
        StorageBackend::Rocksdb => {
            let store = RocksDbQuestStore::open(RocksDbConfig {
                path: config.data_dir.clone(),
                sync_writes: config.sync_writes,
                ..RocksDbConfig::default()
            })?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "rocksdb"))]
        StorageBackend::Rocksdb => Err(StoreError::Backend(
            "RocksDB support not compiled in (enable the `rocksdb` feature)".into(),
        )),
    }
}
