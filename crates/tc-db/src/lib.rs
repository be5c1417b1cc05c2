//! tc-db: SQLite catalog adapter.
//!
//! Connection pooling, embedded migrations, the `assets` table, and
//! [`SqliteCatalog`], which implements [`tc_core::Catalog`] over the pool.

pub mod catalog;
pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;

pub use catalog::SqliteCatalog;
pub use pool::{get_conn, init_memory_pool, init_pool, DbPool};
