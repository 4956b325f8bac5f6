mod memory_repository;
mod postgres_repository;

#[cfg(test)]
mod tests;

pub use memory_repository::create_memory_repository;
pub use postgres_repository::{create_postgres_repository, init_database_with_retry};
