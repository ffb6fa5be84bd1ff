//! Command implementations for the ormdemo CLI

pub mod demo;
pub mod migrate;
pub mod serve;

pub use demo::run_demo;
pub use migrate::run_migrate;
pub use serve::run_serve;

use anyhow::{Context, Result};
use clap::Args;
use sqlx::PgPool;

use ormdemo_server::db::create_pool_with_options;

/// Database connection arguments shared by every command
#[derive(Args, Debug)]
pub struct DbArgs {
    /// PostgreSQL connection URL
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Maximum pooled connections
    #[arg(long, env = "ORMDEMO_MAX_CONNECTIONS", default_value_t = 5)]
    pub max_connections: u32,
}

impl DbArgs {
    pub async fn connect(&self) -> Result<PgPool> {
        let url = self
            .database_url
            .as_deref()
            .context("DATABASE_URL not set. Set via --database-url, DATABASE_URL env, or .env")?;

        create_pool_with_options(url, self.max_connections)
            .await
            .context("Failed to create database pool")
    }
}
