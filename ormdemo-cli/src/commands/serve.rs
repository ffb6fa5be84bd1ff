//! HTTP server command
//!
//! Ensures the schema exists, then serves the API until Ctrl+C/SIGTERM.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;

use ormdemo_server::db::{migrations, TxOptions};
use ormdemo_server::http::{run_server, ServerConfig};

use super::DbArgs;

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to
    #[arg(long, short = 'b', env = "ORMDEMO_BIND", default_value = "127.0.0.1:4000")]
    pub bind: SocketAddr,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Time allowed to start an interactive transaction, in milliseconds
    #[arg(long, env = "ORMDEMO_TX_MAX_WAIT_MS", default_value_t = 2000)]
    pub tx_max_wait_ms: u64,

    /// Time an interactive transaction may run, in milliseconds
    #[arg(long, env = "ORMDEMO_TX_TIMEOUT_MS", default_value_t = 5000)]
    pub tx_timeout_ms: u64,

    #[command(flatten)]
    pub db: DbArgs,
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let pool = args.db.connect().await?;
    migrations::run(&pool).await.context("Migrations failed")?;

    let config = ServerConfig {
        bind_addr: args.bind,
        cors_permissive: args.cors_permissive,
        tx_options: TxOptions::from_millis(args.tx_max_wait_ms, args.tx_timeout_ms),
    };

    tracing::info!("Starting ormdemo server on {}", config.bind_addr);
    run_server(pool, config).await.context("Server error")?;

    Ok(())
}
