//! Redis-backed attending-count cache.
//!
//! Counts live under `rsvp:count:{event_id}` with a TTL, so even a missed
//! invalidation only serves a stale count until the entry expires.
//! Generations live under `rsvp:count-gen:{event_id}` without a TTL; an
//! absent key is generation 0.

use crate::config::RedisConfig;
use crate::domain::{CountCache, CountCachePtr};
use anyhow::{Context, Result};
use redis::aio::MultiplexedConnection;
use once_cell::sync::Lazy;
use redis::{AsyncCommands, Client, Script};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Creates a Redis count cache from configuration.
///
/// The client is created eagerly but connects lazily, per operation.
pub fn create(config: &RedisConfig) -> Result<CountCachePtr> {
    // ---
    tracing::info!("Using Redis count cache (ttl {:?})", config.count_ttl);
    let client = Client::open(config.url.clone()).context("invalid Redis URL")?;

    Ok(Arc::new(RedisCountCache {
        client,
        ttl: config.count_ttl,
    }))
}

pub struct RedisCountCache {
    // ---
    client: Client,
    ttl: Duration,
}

fn count_key(event_id: Uuid) -> String {
    format!("rsvp:count:{event_id}")
}

fn generation_key(event_id: Uuid) -> String {
    format!("rsvp:count-gen:{event_id}")
}

/// KEYS: generation, count. ARGV: expected generation, count, ttl seconds.
static SET_IF_CURRENT: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r"
        local current = redis.call('GET', KEYS[1]) or '0'
        if current ~= ARGV[1] then
            return 0
        end
        redis.call('SET', KEYS[2], ARGV[2], 'EX', ARGV[3])
        return 1
        ",
    )
});

impl RedisCountCache {
    // ---
    async fn get_conn(&self) -> Result<MultiplexedConnection> {
        // ---
        self.client
            .get_multiplexed_async_connection()
            .await
            .context("Failed to connect to Redis")
    }
}

#[async_trait::async_trait]
impl CountCache for RedisCountCache {
    // ---
    async fn get_count(&self, event_id: Uuid) -> Result<Option<i64>> {
        // ---
        let mut conn = self.get_conn().await?;
        let count: Option<i64> = conn.get(count_key(event_id)).await?;
        Ok(count)
    }

    async fn generation(&self, event_id: Uuid) -> Result<u64> {
        // ---
        let mut conn = self.get_conn().await?;
        let generation: Option<u64> = conn.get(generation_key(event_id)).await?;
        Ok(generation.unwrap_or(0))
    }

    async fn set_count_if_current(
        &self,
        event_id: Uuid,
        count: i64,
        generation: u64,
    ) -> Result<bool> {
        // ---
        let mut conn = self.get_conn().await?;
        let stored: i64 = SET_IF_CURRENT
            .key(generation_key(event_id))
            .key(count_key(event_id))
            .arg(generation)
            .arg(count)
            .arg(self.ttl.as_secs().max(1))
            .invoke_async(&mut conn)
            .await?;
        Ok(stored == 1)
    }

    async fn invalidate(&self, event_id: Uuid) -> Result<()> {
        // ---
        let mut conn = self.get_conn().await?;
        let _: () = redis::pipe()
            .atomic()
            .incr(generation_key(event_id), 1)
            .ignore()
            .del(count_key(event_id))
            .ignore()
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        // ---
        let mut conn = self.get_conn().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
