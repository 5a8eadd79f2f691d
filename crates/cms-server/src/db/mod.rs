//! Database connectivity, row models and queries for the `cms` schema.

pub mod models;
pub mod pool;
pub mod queries;

pub use pool::{create_pool, run_migrations, DbPool};
