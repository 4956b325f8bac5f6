mod noop_cache;
mod redis_cache;

pub use noop_cache::create as create_noop_count_cache;
pub use redis_cache::create as create_redis_count_cache;
