//! Connection pool shared by every handler

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Longest a query waits for a free connection before failing
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Open a pool with the default connection limit.
///
/// ```ignore
/// let pool = create_pool("postgres://localhost/ormdemo").await?;
/// ```
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    create_pool_with_options(database_url, DEFAULT_MAX_CONNECTIONS).await
}

/// Open a pool holding at most `max_connections` (at least one).
pub async fn create_pool_with_options(
    database_url: &str,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    tracing::debug!(max_connections, "opening connection pool");
    PgPoolOptions::new()
        .max_connections(max_connections.max(1))
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(database_url)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    // Run with: DATABASE_URL=postgres://... cargo test -p ormdemo-server -- --ignored

    #[tokio::test]
    #[ignore = "requires database"]
    async fn zero_connection_limit_still_serves_queries() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = create_pool_with_options(&url, 0)
            .await
            .expect("pool creation failed");

        assert_eq!(pool.options().get_max_connections(), 1);
        assert_eq!(pool.options().get_acquire_timeout(), ACQUIRE_TIMEOUT);

        let one: i32 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&pool)
            .await
            .expect("query failed");
        assert_eq!(one, 1);
    }
}
