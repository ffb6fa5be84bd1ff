//! Database layer - connection pool, schema, repositories
//!
//! # Design Principles
//!
//! - Connection pool shared by every handler - no Arc<Mutex<Connection>>
//! - Related rows are loaded with `= ANY($1)` batches - no N+1 queries
//! - Rely on DB constraints, handle conflicts - no check-then-insert
//! - Transactions for multi-step operations

pub mod error;
pub mod filter;
pub mod migrations;
pub mod pagination;
pub mod pool;
pub mod repos;
pub mod transaction;

pub use error::DbError;
pub use pagination::{fetch_page, PageSource};
pub use pool::{create_pool, create_pool_with_options};
pub use repos::*;
pub use transaction::TxOptions;
