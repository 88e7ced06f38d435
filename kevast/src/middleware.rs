//! Interceptors around reads and writes
//!
//! An interceptor has one hook per direction. Each hook gets the pair and a
//! continuation for the rest of the chain, and may:
//!
//! - inspect or rewrite the pair before running the continuation
//! - inspect or rewrite the pair after the continuation returns
//! - skip the continuation, in which case the chain runs it once the hook
//!   returns
//! - fail the whole operation by returning an error
//!
//! Both hooks default to continuing immediately, so an interceptor only
//! implements the direction it cares about.

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::dispatch::{Next, NextSync};
use crate::error::Result;
use crate::pair::{NullablePair, Pair};

/// Interceptor for [`Kevast`](crate::Kevast)
///
/// # Example
///
/// ```
/// use async_trait::async_trait;
/// use kevast::{Middleware, Next, Pair, Result};
///
/// struct Upper;
///
/// #[async_trait]
/// impl Middleware for Upper {
///     async fn on_set(&self, pair: &mut Pair, next: &mut Next<'_, Pair>) -> Result<()> {
///         pair.value = pair.value.to_uppercase();
///         next.run(pair).await
///     }
/// }
/// ```
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn on_get(&self, pair: &mut NullablePair, next: &mut Next<'_, NullablePair>) -> Result<()> {
        next.run(pair).await
    }

    async fn on_set(&self, pair: &mut Pair, next: &mut Next<'_, Pair>) -> Result<()> {
        next.run(pair).await
    }
}

/// Interceptor for [`KevastSync`](crate::KevastSync)
pub trait MiddlewareSync: Send + Sync {
    fn on_get(&self, pair: &mut NullablePair, next: &mut NextSync<'_, NullablePair>) -> Result<()> {
        next.run(pair)
    }

    fn on_set(&self, pair: &mut Pair, next: &mut NextSync<'_, Pair>) -> Result<()> {
        next.run(pair)
    }
}

/// Read-only interceptor built from a closure
pub struct OnGet<F>(pub F);

#[async_trait]
impl<F> Middleware for OnGet<F>
where
    F: for<'c> Fn(&'c mut NullablePair, &'c mut Next<'_, NullablePair>) -> BoxFuture<'c, Result<()>>
        + Send
        + Sync,
{
    async fn on_get(&self, pair: &mut NullablePair, next: &mut Next<'_, NullablePair>) -> Result<()> {
        (self.0)(pair, next).await
    }
}

/// Write-only interceptor built from a closure
pub struct OnSet<F>(pub F);

#[async_trait]
impl<F> Middleware for OnSet<F>
where
    F: for<'c> Fn(&'c mut Pair, &'c mut Next<'_, Pair>) -> BoxFuture<'c, Result<()>> + Send + Sync,
{
    async fn on_set(&self, pair: &mut Pair, next: &mut Next<'_, Pair>) -> Result<()> {
        (self.0)(pair, next).await
    }
}

/// Read-only immediate interceptor built from a closure
pub struct OnGetSync<F>(pub F);

impl<F> MiddlewareSync for OnGetSync<F>
where
    F: Fn(&mut NullablePair, &mut NextSync<'_, NullablePair>) -> Result<()> + Send + Sync,
{
    fn on_get(&self, pair: &mut NullablePair, next: &mut NextSync<'_, NullablePair>) -> Result<()> {
        (self.0)(pair, next)
    }
}

/// Write-only immediate interceptor built from a closure
pub struct OnSetSync<F>(pub F);

impl<F> MiddlewareSync for OnSetSync<F>
where
    F: Fn(&mut Pair, &mut NextSync<'_, Pair>) -> Result<()> + Send + Sync,
{
    fn on_set(&self, pair: &mut Pair, next: &mut NextSync<'_, Pair>) -> Result<()> {
        (self.0)(pair, next)
    }
}
