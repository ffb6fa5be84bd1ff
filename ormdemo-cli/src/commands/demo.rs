//! Print one page of stored files, each with its computed URL

use anyhow::{Context, Result};
use clap::Parser;

use ormdemo_server::db::{migrations, FileFilter, FileRepo};
use ormdemo_server::models::PaginationParams;

use super::DbArgs;

#[derive(Parser, Debug)]
pub struct DemoArgs {
    /// Page number (1-indexed)
    #[arg(long, default_value_t = 1)]
    pub page: i64,

    /// Items per page (capped at 100)
    #[arg(long, default_value_t = 10)]
    pub page_size: u32,

    #[command(flatten)]
    pub db: DbArgs,
}

pub async fn run_demo(args: DemoArgs) -> Result<()> {
    let pool = args.db.connect().await?;
    migrations::run(&pool).await.context("Migrations failed")?;

    let query = PaginationParams {
        page: Some(args.page),
        page_size: Some(args.page_size),
    }
    .into_query(FileFilter::default());

    let page = FileRepo::new(&pool)
        .find_and_count(&query)
        .await
        .context("Failed to list files")?;
    tracing::info!(
        total = page.total_count,
        pages = page.total_pages,
        has_prev = page.has_prev(),
        has_next = page.has_next(),
        "files listed"
    );

    println!("{}", serde_json::to_string_pretty(&page)?);
    pool.close().await;
    Ok(())
}
