mod cache;
mod database;
pub mod metrics;

// Re-export the factory functions for easy access
pub use cache::{create_noop_count_cache, create_redis_count_cache};
pub use database::{create_memory_repository, create_postgres_repository, init_database_with_retry};
pub use metrics::{create_noop_metrics, create_prom_metrics};
