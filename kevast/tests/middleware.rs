use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use kevast::{
    DeferredMemoryStorage, Kevast, KevastError, MemoryStorage, Middleware, Next, NullablePair,
    Pair, Result, Storage, StorageError, SyncStorage,
};
use parking_lot::Mutex;

type Log = Arc<Mutex<Vec<String>>>;

/// Records entry into each hook, then continues
struct Tag {
    name: &'static str,
    log: Log,
}

#[async_trait]
impl Middleware for Tag {
    async fn on_get(&self, pair: &mut NullablePair, next: &mut Next<'_, NullablePair>) -> Result<()> {
        self.log.lock().push(format!("{}:get", self.name));
        next.run(pair).await
    }

    async fn on_set(&self, pair: &mut Pair, next: &mut Next<'_, Pair>) -> Result<()> {
        self.log.lock().push(format!("{}:set", self.name));
        next.run(pair).await
    }
}

fn tagged(kevast: &mut Kevast, log: &Log) {
    for name in ["A", "B", "C"] {
        kevast.use_middleware(Tag {
            name,
            log: Arc::clone(log),
        });
    }
}

/// Memory storage counting the writes that reach it
#[derive(Clone, Default)]
struct Counting {
    inner: MemoryStorage,
    sets: Arc<AtomicUsize>,
}

impl SyncStorage for Counting {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value)
    }

    fn has(&self, key: &str) -> Result<bool, StorageError> {
        self.inner.has(key)
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.inner.delete(key)
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.inner.clear()
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        self.inner.keys()
    }

    fn values(&self) -> Result<Vec<String>, StorageError> {
        self.inner.values()
    }

    fn entries(&self) -> Result<Vec<(String, String)>, StorageError> {
        self.inner.entries()
    }

    fn size(&self) -> Result<usize, StorageError> {
        self.inner.size()
    }
}

#[tokio::test]
async fn test_write_runs_interceptors_in_registration_order() {
    let log: Log = Arc::default();
    let mut kevast = Kevast::new(Storage::immediate(MemoryStorage::new()), []);
    tagged(&mut kevast, &log);

    kevast.set("k", "v").await.unwrap();

    assert_eq!(*log.lock(), vec!["A:set", "B:set", "C:set"]);
}

#[tokio::test]
async fn test_read_runs_interceptors_in_reverse_order() {
    let log: Log = Arc::default();
    let mut kevast = Kevast::new(Storage::deferred(DeferredMemoryStorage::new()), []);
    tagged(&mut kevast, &log);

    kevast.get("k").await.unwrap();

    assert_eq!(*log.lock(), vec!["C:get", "B:get", "A:get"]);
}

#[tokio::test]
async fn test_set_interceptor_rewrites_value() {
    let master = MemoryStorage::new();
    let mirror = DeferredMemoryStorage::new();
    let mut kevast = Kevast::new(
        Storage::immediate(master.clone()),
        [Storage::deferred(mirror.clone())],
    );
    kevast.on_set(|pair, next| {
        Box::pin(async move {
            pair.value = pair.value.to_uppercase();
            next.run(pair).await
        })
    });

    kevast.set("k", "value").await.unwrap();

    assert_eq!(master.get("k").unwrap().as_deref(), Some("VALUE"));
    assert_eq!(mirror.snapshot(), master.snapshot());
}

#[tokio::test]
async fn test_get_interceptor_sees_value_after_continuation() {
    let mut kevast = Kevast::new(Storage::immediate(MemoryStorage::new()), []);
    kevast.on_get(|pair, next| {
        Box::pin(async move {
            let result = next.run(pair).await;
            if let Some(value) = pair.value.as_mut() {
                value.push_str("!");
            }
            result
        })
    });

    kevast.set("k", "hello").await.unwrap();

    assert_eq!(kevast.get("k").await.unwrap().as_deref(), Some("hello!"));
    assert_eq!(kevast.get("missing").await.unwrap(), None);
}

#[tokio::test]
async fn test_get_interceptor_redirects_key() {
    let mut kevast = Kevast::new(Storage::immediate(MemoryStorage::new()), []);
    kevast.on_get(|pair, next| {
        Box::pin(async move {
            pair.key = format!("ns:{}", pair.key);
            next.run(pair).await
        })
    });

    kevast.set("ns:k", "scoped").await.unwrap();

    assert_eq!(kevast.get("k").await.unwrap().as_deref(), Some("scoped"));
}

#[tokio::test]
async fn test_interceptor_without_continuation_still_reaches_storage() {
    let log: Log = Arc::default();
    let master = MemoryStorage::new();
    let mut kevast = Kevast::new(Storage::immediate(master.clone()), []);
    kevast.on_set(|_pair, _next| Box::pin(async { Ok::<_, KevastError>(()) }));
    tagged(&mut kevast, &log);

    kevast.set("k", "v").await.unwrap();

    assert_eq!(*log.lock(), vec!["A:set", "B:set", "C:set"]);
    assert_eq!(master.get("k").unwrap().as_deref(), Some("v"));
}

#[tokio::test]
async fn test_continuation_run_twice_fails() {
    let counting = Counting::default();
    let mut kevast = Kevast::new(Storage::immediate(counting.clone()), []);
    kevast.on_set(|pair, next| {
        Box::pin(async move {
            let first = next.run(pair).await;
            assert!(first.is_ok());
            next.run(pair).await
        })
    });

    let result = kevast.set("k", "v").await;

    assert!(matches!(result, Err(KevastError::InvalidContinuation)));
    assert_eq!(counting.sets.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_interceptor_error_aborts_operation() {
    let counting = Counting::default();
    let mut kevast = Kevast::new(Storage::immediate(counting.clone()), []);
    kevast.on_set(|pair, _next| {
        let rejected = pair.key.starts_with('_');
        Box::pin(async move {
            if rejected {
                return Err(KevastError::Interceptor("reserved key".to_string()));
            }
            Ok(())
        })
    });

    let result = kevast.set("_private", "v").await;
    assert!(matches!(result, Err(KevastError::Interceptor(_))));
    assert_eq!(counting.sets.load(Ordering::SeqCst), 0);

    kevast.set("public", "v").await.unwrap();
    assert_eq!(counting.sets.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_interceptor_may_suspend() {
    let log: Log = Arc::default();
    let hook_log = Arc::clone(&log);
    let mut kevast = Kevast::new(Storage::deferred(DeferredMemoryStorage::new()), []);
    kevast.on_set(move |pair, next| {
        let log = Arc::clone(&hook_log);
        Box::pin(async move {
            tokio::task::yield_now().await;
            log.lock().push(format!("before {}", pair.key));
            let result = next.run(pair).await;
            log.lock().push(format!("after {}", pair.key));
            result
        })
    });

    kevast.set("k", "v").await.unwrap();

    assert_eq!(*log.lock(), vec!["before k", "after k"]);
    assert_eq!(kevast.get("k").await.unwrap().as_deref(), Some("v"));
}

#[tokio::test]
async fn test_direction_specific_hooks_ignore_the_other_direction() {
    let reads = Arc::new(AtomicUsize::new(0));
    let writes = Arc::new(AtomicUsize::new(0));
    let mut kevast = Kevast::new(Storage::immediate(MemoryStorage::new()), []);
    {
        let reads = Arc::clone(&reads);
        kevast.on_get(move |pair, next| {
            reads.fetch_add(1, Ordering::SeqCst);
            next.run(pair)
        });
    }
    {
        let writes = Arc::clone(&writes);
        kevast.on_set(move |pair, next| {
            writes.fetch_add(1, Ordering::SeqCst);
            next.run(pair)
        });
    }

    kevast.set("k", "v").await.unwrap();
    kevast.set("k", "w").await.unwrap();
    kevast.get("k").await.unwrap();

    assert_eq!(reads.load(Ordering::SeqCst), 1);
    assert_eq!(writes.load(Ordering::SeqCst), 2);
}
