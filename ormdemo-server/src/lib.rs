//! ormdemo-server: relational query patterns behind a JSON API
//!
//! Demonstrates CRUD, filtering, relation loading, raw SQL, batch and
//! interactive transactions, and offset/limit pagination over PostgreSQL.

pub mod db;
pub mod file_url;
pub mod http;
pub mod models;

pub use db::{fetch_page, PageSource};
pub use file_url::compute_url;
pub use http::{build_router, run_server, AppState, ServerConfig};
