//! Storage capability contract
//!
//! Every backend exposes the same nine operations. A backend is either
//! immediate (`SyncStorage`, every call returns its result directly) or
//! deferred (`AsyncStorage`, every call returns a future). The `Storage`
//! enum tags which one a backend is, once, at construction.
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │  Kevast / KevastSync (facades)      │
//! │  - middleware chain on get/set      │
//! │  - fan-out of set/delete/clear      │
//! └─────────────────────────────────────┘
//!          ▲
//!          │ Storage (tagged capability)
//!          ▼
//!    Immediate            Deferred
//!    (SyncStorage)        (AsyncStorage)
//!      ▲      ▲              ▲
//!      │      │              │
//!  MemoryStorage  SqliteStorage  DeferredMemoryStorage
//! ```

use async_trait::async_trait;

use crate::error::{KevastError, StorageError};

/// Backend that completes every operation before returning
pub trait SyncStorage: Send + Sync {
    /// Value stored under `key`, or `None` if absent
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, overwriting any previous value
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn has(&self, key: &str) -> Result<bool, StorageError>;

    /// Remove `key`. Removing an absent key is not an error.
    fn delete(&self, key: &str) -> Result<(), StorageError>;

    fn clear(&self) -> Result<(), StorageError>;

    /// Keys in the backend's iteration order
    fn keys(&self) -> Result<Vec<String>, StorageError>;

    /// Values in the backend's iteration order
    fn values(&self) -> Result<Vec<String>, StorageError>;

    /// Key/value pairs in the backend's iteration order
    fn entries(&self) -> Result<Vec<(String, String)>, StorageError>;

    fn size(&self) -> Result<usize, StorageError>;
}

/// Backend whose operations may suspend before completing
///
/// Same contract as [`SyncStorage`], every method is awaited.
#[async_trait]
pub trait AsyncStorage: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    async fn has(&self, key: &str) -> Result<bool, StorageError>;

    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    async fn clear(&self) -> Result<(), StorageError>;

    async fn keys(&self) -> Result<Vec<String>, StorageError>;

    async fn values(&self) -> Result<Vec<String>, StorageError>;

    async fn entries(&self) -> Result<Vec<(String, String)>, StorageError>;

    async fn size(&self) -> Result<usize, StorageError>;
}

/// A backend tagged with its completion category
///
/// The async methods normalize both categories: an immediate backend's
/// result is handed back as an already-resolved future, a deferred backend's
/// future is awaited.
pub enum Storage {
    Immediate(Box<dyn SyncStorage>),
    Deferred(Box<dyn AsyncStorage>),
}

impl Storage {
    /// Wrap an immediate backend
    pub fn immediate(storage: impl SyncStorage + 'static) -> Self {
        Self::Immediate(Box::new(storage))
    }

    /// Wrap a deferred backend
    pub fn deferred(storage: impl AsyncStorage + 'static) -> Self {
        Self::Deferred(Box::new(storage))
    }

    /// Whether this backend may return before its operations complete
    #[must_use]
    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }

    /// Unwrap an immediate backend
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` if the backend is deferred.
    pub fn into_immediate(self) -> Result<Box<dyn SyncStorage>, KevastError> {
        match self {
            Self::Immediate(storage) => Ok(storage),
            Self::Deferred(_) => Err(KevastError::TypeMismatch(
                "KevastSync only accepts immediate storages".to_string(),
            )),
        }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self {
            Self::Immediate(storage) => storage.get(key),
            Self::Deferred(storage) => storage.get(key).await,
        }
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        match self {
            Self::Immediate(storage) => storage.set(key, value),
            Self::Deferred(storage) => storage.set(key, value).await,
        }
    }

    pub async fn has(&self, key: &str) -> Result<bool, StorageError> {
        match self {
            Self::Immediate(storage) => storage.has(key),
            Self::Deferred(storage) => storage.has(key).await,
        }
    }

    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        match self {
            Self::Immediate(storage) => storage.delete(key),
            Self::Deferred(storage) => storage.delete(key).await,
        }
    }

    pub async fn clear(&self) -> Result<(), StorageError> {
        match self {
            Self::Immediate(storage) => storage.clear(),
            Self::Deferred(storage) => storage.clear().await,
        }
    }

    pub async fn keys(&self) -> Result<Vec<String>, StorageError> {
        match self {
            Self::Immediate(storage) => storage.keys(),
            Self::Deferred(storage) => storage.keys().await,
        }
    }

    pub async fn values(&self) -> Result<Vec<String>, StorageError> {
        match self {
            Self::Immediate(storage) => storage.values(),
            Self::Deferred(storage) => storage.values().await,
        }
    }

    pub async fn entries(&self) -> Result<Vec<(String, String)>, StorageError> {
        match self {
            Self::Immediate(storage) => storage.entries(),
            Self::Deferred(storage) => storage.entries().await,
        }
    }

    pub async fn size(&self) -> Result<usize, StorageError> {
        match self {
            Self::Immediate(storage) => storage.size(),
            Self::Deferred(storage) => storage.size().await,
        }
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Immediate(_) => f.write_str("Storage::Immediate"),
            Self::Deferred(_) => f.write_str("Storage::Deferred"),
        }
    }
}
