//! Immediate facade
//!
//! Same surface as [`Kevast`](crate::Kevast), for callers whose storages all
//! complete immediately. Nothing is awaited: writes go to the master, then to
//! each redundancy in order.

use std::sync::Arc;

use tracing::debug;

use crate::dispatch::{ChainSync, NextSync};
use crate::error::Result;
use crate::middleware::{MiddlewareSync, OnGetSync, OnSetSync};
use crate::pair::{NullablePair, Pair};
use crate::storage::{Storage, SyncStorage};

/// Synchronous key-value facade over one master and any number of
/// redundancies
pub struct KevastSync {
    master: Box<dyn SyncStorage>,
    redundancies: Vec<Box<dyn SyncStorage>>,
    middlewares: Vec<Arc<dyn MiddlewareSync>>,
}

impl KevastSync {
    /// Create a facade over immediate storages
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` if any of the storages is deferred. The check
    /// runs before anything else, so no facade is created.
    pub fn new(master: Storage, redundancies: impl IntoIterator<Item = Storage>) -> Result<Self> {
        let master = master.into_immediate()?;
        let redundancies = redundancies
            .into_iter()
            .map(Storage::into_immediate)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            master,
            redundancies,
            middlewares: Vec::new(),
        })
    }

    /// Append an interceptor. It becomes the outermost layer for writes and
    /// the innermost for reads.
    pub fn use_middleware(&mut self, middleware: impl MiddlewareSync + 'static) {
        self.middlewares.push(Arc::new(middleware));
    }

    /// Register a read-only interceptor
    pub fn on_get<F>(&mut self, handler: F)
    where
        F: Fn(&mut NullablePair, &mut NextSync<'_, NullablePair>) -> Result<()>
            + Send
            + Sync
            + 'static,
    {
        self.use_middleware(OnGetSync(handler));
    }

    /// Register a write-only interceptor
    pub fn on_set<F>(&mut self, handler: F)
    where
        F: Fn(&mut Pair, &mut NextSync<'_, Pair>) -> Result<()> + Send + Sync + 'static,
    {
        self.use_middleware(OnSetSync(handler));
    }

    fn storages(&self) -> impl Iterator<Item = &(dyn SyncStorage + 'static)> {
        std::iter::once(&*self.master).chain(self.redundancies.iter().map(|storage| &**storage))
    }

    /// Read `key` from the master through the interceptor chain
    ///
    /// # Errors
    ///
    /// Fails if an interceptor or the master storage fails, or if an
    /// interceptor runs its continuation twice.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let master = &*self.master;
        let mut pair = NullablePair::new(key);
        ChainSync::new(&self.middlewares, |pair: &mut NullablePair| -> Result<()> {
            pair.value = master.get(&pair.key)?;
            Ok(())
        })
        .run(&mut pair)?;
        Ok(pair.value)
    }

    /// Like [`get`](Self::get), with `default` standing in for a missing value
    pub fn get_or(&self, key: &str, default: &str) -> Result<String> {
        Ok(self.get(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// Write `value` under `key` to every storage through the interceptor
    /// chain
    ///
    /// The first storage failure stops the sequence; storages already
    /// written keep the new value.
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut pair = Pair::new(key, value);
        ChainSync::new(&self.middlewares, |pair: &mut Pair| -> Result<()> {
            for storage in self.storages() {
                storage.set(&pair.key, &pair.value)?;
            }
            debug!(operation = "set", storages = self.redundancies.len() + 1, "write completed");
            Ok(())
        })
        .run(&mut pair)?;
        Ok(())
    }

    pub fn has(&self, key: &str) -> Result<bool> {
        Ok(self.master.has(key)?)
    }

    /// Remove `key` from every storage
    pub fn delete(&self, key: &str) -> Result<()> {
        for storage in self.storages() {
            storage.delete(key)?;
        }
        Ok(())
    }

    /// Remove everything from every storage
    pub fn clear(&self) -> Result<()> {
        for storage in self.storages() {
            storage.clear()?;
        }
        Ok(())
    }

    /// Snapshot of the master's keys
    pub fn keys(&self) -> Result<std::vec::IntoIter<String>> {
        Ok(self.master.keys()?.into_iter())
    }

    /// Snapshot of the master's values
    pub fn values(&self) -> Result<std::vec::IntoIter<String>> {
        Ok(self.master.values()?.into_iter())
    }

    /// Snapshot of the master's entries
    pub fn entries(&self) -> Result<std::vec::IntoIter<(String, String)>> {
        Ok(self.master.entries()?.into_iter())
    }

    pub fn size(&self) -> Result<usize> {
        Ok(self.master.size()?)
    }
}
