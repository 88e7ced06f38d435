//! Key-value facade over heterogeneous storages
//!
//! One master storage serves reads; any number of redundancies mirror every
//! write. Reads and writes pass through an onion of interceptors that can
//! observe or rewrite the key/value pair.
//!
//! - [`Kevast`] accepts immediate and deferred storages and exposes futures
//! - [`KevastSync`] accepts immediate storages only and never awaits
//!
//! ```
//! use kevast::{KevastSync, MemoryStorage, Storage};
//!
//! let master = MemoryStorage::new();
//! let mirror = MemoryStorage::new();
//! let kevast = KevastSync::new(
//!     Storage::immediate(master.clone()),
//!     [Storage::immediate(mirror.clone())],
//! )
//! .unwrap();
//!
//! kevast.set("key", "value").unwrap();
//! assert_eq!(kevast.get("key").unwrap().as_deref(), Some("value"));
//! assert_eq!(master.snapshot(), mirror.snapshot());
//! ```

pub mod dispatch;
pub mod error;
pub mod kevast;
pub mod kevast_sync;
pub mod memory;
pub mod middleware;
pub mod pair;
pub mod storage;

// Re-export the facades for convenience
pub use kevast::Kevast;
pub use kevast_sync::KevastSync;

// Re-export chain and interceptor types
pub use dispatch::{Direction, Next, NextSync};
pub use middleware::{Middleware, MiddlewareSync, OnGet, OnGetSync, OnSet, OnSetSync};
pub use pair::{NullablePair, Pair};

// Re-export storage types
pub use error::{KevastError, Result, StorageError};
pub use memory::{DeferredMemoryStorage, MemoryStorage};
pub use storage::{AsyncStorage, Storage, SyncStorage};
