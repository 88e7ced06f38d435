use async_trait::async_trait;
use kevast::{Middleware, Next, NullablePair, Pair, Result};
use tracing::debug;

/// Logs every read and write passing through the facade
#[derive(Debug, Default, Clone, Copy)]
pub struct AccessLog;

#[async_trait]
impl Middleware for AccessLog {
    async fn on_get(&self, pair: &mut NullablePair, next: &mut Next<'_, NullablePair>) -> Result<()> {
        next.run(pair).await?;
        debug!(key = %pair.key, found = pair.value.is_some(), "get");
        Ok(())
    }

    async fn on_set(&self, pair: &mut Pair, next: &mut Next<'_, Pair>) -> Result<()> {
        debug!(key = %pair.key, len = pair.value.len(), "set");
        next.run(pair).await
    }
}
