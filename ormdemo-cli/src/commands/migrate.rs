//! Create the demo schema and exit

use anyhow::{Context, Result};
use clap::Parser;

use ormdemo_server::db::migrations;

use super::DbArgs;

#[derive(Parser, Debug)]
pub struct MigrateArgs {
    #[command(flatten)]
    pub db: DbArgs,
}

pub async fn run_migrate(args: MigrateArgs) -> Result<()> {
    let pool = args.db.connect().await?;
    migrations::run(&pool).await.context("Migrations failed")?;
    pool.close().await;
    Ok(())
}
