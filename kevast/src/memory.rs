//! In-memory storages
//!
//! Insertion-ordered maps, useful for testing and single-process use.
//! Clones share the same contents, so a caller can keep a handle to a storage
//! after giving one to a facade and inspect it directly.

use async_trait::async_trait;
use linked_hash_map::LinkedHashMap;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::error::StorageError;
use crate::storage::{AsyncStorage, SyncStorage};

type Map = Arc<Mutex<LinkedHashMap<String, String>>>;

fn put(map: &Map, key: &str, value: &str) {
    let mut map = map.lock();
    // Overwrite in place so the key keeps its original position
    if let Some(slot) = map.get_mut(key) {
        value.clone_into(slot);
    } else {
        map.insert(key.to_string(), value.to_string());
    }
}

fn snapshot(map: &Map) -> Vec<(String, String)> {
    map.lock()
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Immediate in-memory storage
#[derive(Clone, Default)]
pub struct MemoryStorage {
    map: Map,
}

impl MemoryStorage {
    /// Create a new empty storage
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current contents, in insertion order
    #[must_use]
    pub fn snapshot(&self) -> Vec<(String, String)> {
        snapshot(&self.map)
    }
}

impl SyncStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.map.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        put(&self.map, key, value);
        Ok(())
    }

    fn has(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.map.lock().contains_key(key))
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.map.lock().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.map.lock().clear();
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.map.lock().keys().cloned().collect())
    }

    fn values(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.map.lock().values().cloned().collect())
    }

    fn entries(&self) -> Result<Vec<(String, String)>, StorageError> {
        Ok(snapshot(&self.map))
    }

    fn size(&self) -> Result<usize, StorageError> {
        Ok(self.map.lock().len())
    }
}

/// Deferred in-memory storage
///
/// Every operation yields to the scheduler once before touching the map,
/// so callers really observe a suspension point.
#[derive(Clone, Default)]
pub struct DeferredMemoryStorage {
    map: Map,
}

impl DeferredMemoryStorage {
    /// Create a new empty storage
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current contents, in insertion order
    #[must_use]
    pub fn snapshot(&self) -> Vec<(String, String)> {
        snapshot(&self.map)
    }
}

#[async_trait]
impl AsyncStorage for DeferredMemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        tokio::task::yield_now().await;
        Ok(self.map.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        tokio::task::yield_now().await;
        put(&self.map, key, value);
        Ok(())
    }

    async fn has(&self, key: &str) -> Result<bool, StorageError> {
        tokio::task::yield_now().await;
        Ok(self.map.lock().contains_key(key))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        tokio::task::yield_now().await;
        self.map.lock().remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        tokio::task::yield_now().await;
        self.map.lock().clear();
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        tokio::task::yield_now().await;
        Ok(self.map.lock().keys().cloned().collect())
    }

    async fn values(&self) -> Result<Vec<String>, StorageError> {
        tokio::task::yield_now().await;
        Ok(self.map.lock().values().cloned().collect())
    }

    async fn entries(&self) -> Result<Vec<(String, String)>, StorageError> {
        tokio::task::yield_now().await;
        Ok(snapshot(&self.map))
    }

    async fn size(&self) -> Result<usize, StorageError> {
        tokio::task::yield_now().await;
        Ok(self.map.lock().len())
    }
}
