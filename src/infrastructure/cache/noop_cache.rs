use crate::domain::{CountCache, CountCachePtr};
use anyhow::Result;
use std::sync::Arc;
use uuid::Uuid;

/// Creates a count cache that never holds anything.
///
/// Every count lookup goes straight to the repository. Used when no Redis
/// URL is configured.
pub fn create() -> CountCachePtr {
    Arc::new(NoopCountCache)
}

/// No-op count cache.
pub struct NoopCountCache;

#[async_trait::async_trait]
impl CountCache for NoopCountCache {
    // ---
    async fn get_count(&self, _: Uuid) -> Result<Option<i64>> {
        Ok(None)
    }
    async fn generation(&self, _: Uuid) -> Result<u64> {
        Ok(0)
    }
    async fn set_count_if_current(&self, _: Uuid, _: i64, _: u64) -> Result<bool> {
        Ok(false)
    }
    async fn invalidate(&self, _: Uuid) -> Result<()> {
        Ok(())
    }
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
