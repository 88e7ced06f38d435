//! Deferred facade
//!
//! `Kevast` accepts any mix of immediate and deferred storages and exposes
//! every operation as a future. Reads and structural queries go to the
//! master only. `set`, `delete` and `clear` fan out to the master and every
//! redundancy concurrently.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{join_all, BoxFuture};
use tracing::{debug, warn};

use crate::dispatch::{Chain, Next, Terminal};
use crate::error::{Result, StorageError};
use crate::middleware::{Middleware, OnGet, OnSet};
use crate::pair::{NullablePair, Pair};
use crate::storage::Storage;

/// Key-value facade over one master and any number of redundancies
pub struct Kevast {
    master: Storage,
    redundancies: Vec<Storage>,
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl Kevast {
    /// Create a facade reading from `master` and replicating writes to
    /// `redundancies`, in the given order
    pub fn new(master: Storage, redundancies: impl IntoIterator<Item = Storage>) -> Self {
        Self {
            master,
            redundancies: redundancies.into_iter().collect(),
            middlewares: Vec::new(),
        }
    }

    /// Append an interceptor. It becomes the outermost layer for writes and
    /// the innermost for reads.
    pub fn use_middleware(&mut self, middleware: impl Middleware + 'static) {
        self.middlewares.push(Arc::new(middleware));
    }

    /// Register a read-only interceptor
    ///
    /// ```
    /// use kevast::{Kevast, MemoryStorage, Storage};
    ///
    /// let mut kevast = Kevast::new(Storage::immediate(MemoryStorage::new()), []);
    /// kevast.on_get(|pair, next| {
    ///     Box::pin(async move {
    ///         let result = next.run(pair).await;
    ///         pair.value.get_or_insert_with(|| "fallback".to_string());
    ///         result
    ///     })
    /// });
    /// ```
    pub fn on_get<F>(&mut self, handler: F)
    where
        F: for<'c> Fn(&'c mut NullablePair, &'c mut Next<'_, NullablePair>) -> BoxFuture<'c, Result<()>>
            + Send
            + Sync
            + 'static,
    {
        self.use_middleware(OnGet(handler));
    }

    /// Register a write-only interceptor
    pub fn on_set<F>(&mut self, handler: F)
    where
        F: for<'c> Fn(&'c mut Pair, &'c mut Next<'_, Pair>) -> BoxFuture<'c, Result<()>>
            + Send
            + Sync
            + 'static,
    {
        self.use_middleware(OnSet(handler));
    }

    #[must_use]
    pub fn master(&self) -> &Storage {
        &self.master
    }

    #[must_use]
    pub fn redundancies(&self) -> &[Storage] {
        &self.redundancies
    }

    fn storages(&self) -> impl Iterator<Item = &Storage> {
        std::iter::once(&self.master).chain(self.redundancies.iter())
    }

    /// Read `key` from the master through the interceptor chain
    ///
    /// # Errors
    ///
    /// Fails if an interceptor or the master storage fails, or if an
    /// interceptor runs its continuation twice.
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut pair = NullablePair::new(key);
        Chain::new(&self.middlewares, ReadMaster(&self.master))
            .run(&mut pair)
            .await?;
        Ok(pair.value)
    }

    /// Like [`get`](Self::get), with `default` standing in for a missing value
    pub async fn get_or(&self, key: &str, default: &str) -> Result<String> {
        Ok(self
            .get(key)
            .await?
            .unwrap_or_else(|| default.to_string()))
    }

    /// Write `value` under `key` to every storage through the interceptor
    /// chain
    ///
    /// Completes once every storage has completed.
    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut pair = Pair::new(key, value);
        Chain::new(&self.middlewares, WriteAll(self))
            .run(&mut pair)
            .await?;
        Ok(())
    }

    pub async fn has(&self, key: &str) -> Result<bool> {
        Ok(self.master.has(key).await?)
    }

    /// Remove `key` from every storage
    pub async fn delete(&self, key: &str) -> Result<()> {
        fan_out("delete", self.storages().map(|storage| storage.delete(key))).await
    }

    /// Remove everything from every storage
    pub async fn clear(&self) -> Result<()> {
        fan_out("clear", self.storages().map(Storage::clear)).await
    }

    /// Snapshot of the master's keys
    pub async fn keys(&self) -> Result<std::vec::IntoIter<String>> {
        Ok(self.master.keys().await?.into_iter())
    }

    /// Snapshot of the master's values
    pub async fn values(&self) -> Result<std::vec::IntoIter<String>> {
        Ok(self.master.values().await?.into_iter())
    }

    /// Snapshot of the master's entries
    pub async fn entries(&self) -> Result<std::vec::IntoIter<(String, String)>> {
        Ok(self.master.entries().await?.into_iter())
    }

    pub async fn size(&self) -> Result<usize> {
        Ok(self.master.size().await?)
    }
}

/// Start `operations` together and wait for all of them
///
/// Nothing is cancelled when one storage fails: every operation runs to
/// completion, then the first failure in storage order is reported.
async fn fan_out<F>(operation: &str, operations: impl Iterator<Item = F>) -> Result<()>
where
    F: Future<Output = Result<(), StorageError>>,
{
    let results = join_all(operations).await;
    debug!(operation, storages = results.len(), "fan-out completed");

    let mut first_error = None;
    for (index, result) in results.into_iter().enumerate() {
        if let Err(e) = result {
            warn!(operation, storage = index, error = %e, "storage operation failed");
            if first_error.is_none() {
                first_error = Some(e);
            }
        }
    }
    match first_error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

struct ReadMaster<'k>(&'k Storage);

#[async_trait]
impl Terminal<NullablePair> for ReadMaster<'_> {
    async fn run(&self, pair: &mut NullablePair) -> Result<()> {
        pair.value = self.0.get(&pair.key).await?;
        Ok(())
    }
}

struct WriteAll<'k>(&'k Kevast);

#[async_trait]
impl Terminal<Pair> for WriteAll<'_> {
    async fn run(&self, pair: &mut Pair) -> Result<()> {
        let (key, value) = (pair.key.as_str(), pair.value.as_str());
        fan_out("set", self.0.storages().map(|storage| storage.set(key, value))).await
    }
}
