//! Route handlers organized by resource

pub mod articles;
pub mod companies;
pub mod files;
pub mod health;
pub mod shops;
pub mod transactions;
pub mod users;

use serde::Serialize;

/// Body for bulk writes: number of affected rows
#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: u64,
}

impl From<u64> for CountResponse {
    fn from(count: u64) -> Self {
        Self { count }
    }
}
