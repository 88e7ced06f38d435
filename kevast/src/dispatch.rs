//! Middleware chain composition
//!
//! A chain wraps an ordered list of interceptors around one terminal
//! operation. Writes visit interceptors in registration order, reads visit
//! them in reverse, so the first-registered interceptor is the outermost
//! layer of a write and the innermost layer of a read:
//!
//! ```text
//!   set:  A ─▶ B ─▶ C ─▶ storages
//!   get:  C ─▶ B ─▶ A ─▶ master
//! ```
//!
//! Each interceptor receives a continuation (`Next` / `NextSync`) for the
//! rest of the chain. The chain keeps a cursor with the highest position
//! entered so far:
//!
//! - running a continuation whose position is not past the cursor fails
//!   with `InvalidContinuation`
//! - if an interceptor returns without running its continuation, the chain
//!   runs it on the interceptor's behalf
//!
//! So every interceptor runs once and the terminal runs once, whether or not
//! the interceptors call `next` themselves.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tracing::trace;

use crate::error::{KevastError, Result};
use crate::middleware::{Middleware, MiddlewareSync};
use crate::pair::{NullablePair, Pair};

/// Which way an operation flows through the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
}

impl Direction {
    /// Registration index of the interceptor that runs at `position`
    ///
    /// `position` must be less than `len`.
    #[must_use]
    pub fn slot(self, position: usize, len: usize) -> usize {
        match self {
            Self::Write => position,
            Self::Read => len - 1 - position,
        }
    }
}

/// Carrier types know their direction and which hook to call
pub(crate) trait Directed: Send + Sized {
    const DIRECTION: Direction;

    fn intercept<'c>(
        middleware: &'c dyn Middleware,
        pair: &'c mut Self,
        next: &'c mut Next<'_, Self>,
    ) -> BoxFuture<'c, Result<()>>;

    fn intercept_sync(
        middleware: &dyn MiddlewareSync,
        pair: &mut Self,
        next: &mut NextSync<'_, Self>,
    ) -> Result<()>;
}

impl Directed for NullablePair {
    const DIRECTION: Direction = Direction::Read;

    fn intercept<'c>(
        middleware: &'c dyn Middleware,
        pair: &'c mut Self,
        next: &'c mut Next<'_, Self>,
    ) -> BoxFuture<'c, Result<()>> {
        middleware.on_get(pair, next)
    }

    fn intercept_sync(
        middleware: &dyn MiddlewareSync,
        pair: &mut Self,
        next: &mut NextSync<'_, Self>,
    ) -> Result<()> {
        middleware.on_get(pair, next)
    }
}

impl Directed for Pair {
    const DIRECTION: Direction = Direction::Write;

    fn intercept<'c>(
        middleware: &'c dyn Middleware,
        pair: &'c mut Self,
        next: &'c mut Next<'_, Self>,
    ) -> BoxFuture<'c, Result<()>> {
        middleware.on_set(pair, next)
    }

    fn intercept_sync(
        middleware: &dyn MiddlewareSync,
        pair: &mut Self,
        next: &mut NextSync<'_, Self>,
    ) -> Result<()> {
        middleware.on_set(pair, next)
    }
}

/// Per-invocation chain state: the highest position entered so far
#[derive(Debug, Default)]
pub(crate) struct Cursor {
    last: Option<usize>,
}

impl Cursor {
    /// Move the cursor to `position`, which must be past every position
    /// entered before.
    fn enter(&mut self, position: usize) -> Result<()> {
        if self.last.is_some_and(|last| position <= last) {
            return Err(KevastError::InvalidContinuation);
        }
        self.last = Some(position);
        Ok(())
    }

    /// True if nothing past `position` has been entered
    fn is_at(&self, position: usize) -> bool {
        self.last == Some(position)
    }
}

// ============================================================================
// Deferred chain
// ============================================================================

/// The storage access at the center of a deferred chain
#[async_trait]
pub(crate) trait Terminal<P: Send>: Send + Sync {
    async fn run(&self, pair: &mut P) -> Result<()>;
}

pub(crate) trait Dispatch<P>: Send {
    fn dispatch<'s>(&'s mut self, position: usize, pair: &'s mut P) -> BoxFuture<'s, Result<()>>;
}

/// Continuation handed to a [`Middleware`] hook
///
/// `run` drives the rest of the chain. It may be run at most once; a second
/// run fails with `InvalidContinuation`.
pub struct Next<'a, P> {
    chain: &'a mut dyn Dispatch<P>,
    position: usize,
}

impl<P> Next<'_, P> {
    /// Run the remaining interceptors and the terminal operation
    pub fn run<'s>(&'s mut self, pair: &'s mut P) -> BoxFuture<'s, Result<()>> {
        self.chain.dispatch(self.position, pair)
    }
}

pub(crate) struct Chain<'m, T> {
    middlewares: &'m [Arc<dyn Middleware>],
    terminal: T,
    cursor: Cursor,
}

impl<'m, T> Chain<'m, T> {
    pub(crate) fn new(middlewares: &'m [Arc<dyn Middleware>], terminal: T) -> Self {
        Self {
            middlewares,
            terminal,
            cursor: Cursor::default(),
        }
    }

    pub(crate) fn run<'s, P>(&'s mut self, pair: &'s mut P) -> BoxFuture<'s, Result<()>>
    where
        P: Directed,
        T: Terminal<P>,
    {
        self.dispatch(0, pair)
    }
}

impl<P, T> Dispatch<P> for Chain<'_, T>
where
    P: Directed,
    T: Terminal<P>,
{
    fn dispatch<'s>(&'s mut self, position: usize, pair: &'s mut P) -> BoxFuture<'s, Result<()>> {
        Box::pin(async move {
            self.cursor.enter(position)?;

            let middlewares = self.middlewares;
            if position == middlewares.len() {
                trace!(direction = ?P::DIRECTION, "terminal");
                return self.terminal.run(pair).await;
            }

            let slot = P::DIRECTION.slot(position, middlewares.len());
            trace!(direction = ?P::DIRECTION, position, slot, "interceptor");
            {
                let mut next: Next<'_, P> = Next {
                    chain: &mut *self,
                    position: position + 1,
                };
                P::intercept(middlewares[slot].as_ref(), &mut *pair, &mut next).await?;
            }

            if self.cursor.is_at(position) {
                trace!(direction = ?P::DIRECTION, position, "auto-continue");
                self.dispatch(position + 1, pair).await?;
            }
            Ok(())
        })
    }
}

// ============================================================================
// Immediate chain
// ============================================================================

pub(crate) trait DispatchSync<P> {
    fn dispatch(&mut self, position: usize, pair: &mut P) -> Result<()>;
}

/// Continuation handed to a [`MiddlewareSync`] hook
pub struct NextSync<'a, P> {
    chain: &'a mut dyn DispatchSync<P>,
    position: usize,
}

impl<P> NextSync<'_, P> {
    /// Run the remaining interceptors and the terminal operation
    ///
    /// # Errors
    ///
    /// `InvalidContinuation` if this continuation already ran, or any error
    /// from further down the chain.
    pub fn run(&mut self, pair: &mut P) -> Result<()> {
        self.chain.dispatch(self.position, pair)
    }
}

pub(crate) struct ChainSync<'m, F> {
    middlewares: &'m [Arc<dyn MiddlewareSync>],
    terminal: F,
    cursor: Cursor,
}

impl<'m, F> ChainSync<'m, F> {
    pub(crate) fn new(middlewares: &'m [Arc<dyn MiddlewareSync>], terminal: F) -> Self {
        Self {
            middlewares,
            terminal,
            cursor: Cursor::default(),
        }
    }

    pub(crate) fn run<P>(&mut self, pair: &mut P) -> Result<()>
    where
        P: Directed,
        F: FnMut(&mut P) -> Result<()>,
    {
        self.dispatch(0, pair)
    }
}

impl<P, F> DispatchSync<P> for ChainSync<'_, F>
where
    P: Directed,
    F: FnMut(&mut P) -> Result<()>,
{
    fn dispatch(&mut self, position: usize, pair: &mut P) -> Result<()> {
        self.cursor.enter(position)?;

        let middlewares = self.middlewares;
        if position == middlewares.len() {
            trace!(direction = ?P::DIRECTION, "terminal");
            return (self.terminal)(pair);
        }

        let slot = P::DIRECTION.slot(position, middlewares.len());
        trace!(direction = ?P::DIRECTION, position, slot, "interceptor");
        {
            let mut next: NextSync<'_, P> = NextSync {
                chain: &mut *self,
                position: position + 1,
            };
            P::intercept_sync(middlewares[slot].as_ref(), pair, &mut next)?;
        }

        if self.cursor.is_at(position) {
            trace!(direction = ?P::DIRECTION, position, "auto-continue");
            self.dispatch(position + 1, pair)?;
        }
        Ok(())
    }
}
