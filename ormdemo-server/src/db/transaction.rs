//! Transactions
//!
//! - Batch: independent writes that commit or roll back together.
//! - Interactive: later steps use results of earlier ones. Bounded by
//!   `max_wait` (time to obtain a transaction) and `timeout` (time the
//!   steps may run). A transaction that is dropped before commit rolls back.

use std::future::Future;
use std::time::Duration;

use futures::future::BoxFuture;
use sqlx::{PgPool, Postgres, Transaction};

use super::repos::{Article, ArticleRepo, File, FileRepo, User, UserRepo};
use super::DbError;
use crate::models::{NewArticle, NewFile, NewUser};

/// Default time to wait for a transaction to start
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_millis(2000);

/// Default time an interactive transaction may run
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Limits for interactive transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxOptions {
    pub max_wait: Duration,
    pub timeout: Duration,
}

impl TxOptions {
    pub fn from_millis(max_wait_ms: u64, timeout_ms: u64) -> Self {
        Self {
            max_wait: Duration::from_millis(max_wait_ms),
            timeout: Duration::from_millis(timeout_ms),
        }
    }
}

impl Default for TxOptions {
    fn default() -> Self {
        Self {
            max_wait: DEFAULT_MAX_WAIT,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Run `f` inside a transaction and commit its result.
///
/// If `f` fails or exceeds `opts.timeout`, the transaction is rolled back.
///
/// # Example
///
/// ```ignore
/// let user = interactive(&pool, TxOptions::default(), |tx| {
///     Box::pin(async move { UserRepo::insert_with(&mut **tx, &new_user).await })
/// })
/// .await?;
/// ```
pub async fn interactive<T, F>(pool: &PgPool, opts: TxOptions, f: F) -> Result<T, DbError>
where
    F: for<'c> FnOnce(&'c mut Transaction<'static, Postgres>) -> BoxFuture<'c, Result<T, DbError>>,
{
    let mut tx = bounded(opts.max_wait, "waiting for a connection", pool.begin()).await??;

    let outcome = bounded(opts.timeout, "running", f(&mut tx)).await;
    let value = match outcome {
        Ok(result) => result?,
        Err(timeout) => {
            tracing::warn!(error = %timeout, "rolling back interactive transaction");
            return Err(timeout);
        }
    };

    tx.commit().await?;
    Ok(value)
}

async fn bounded<T>(
    limit: Duration,
    stage: &'static str,
    fut: impl Future<Output = T>,
) -> Result<T, DbError> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| DbError::Timeout {
            stage,
            limit_ms: limit.as_millis() as u64,
        })
}

/// Create a user and an article atomically (batch transaction).
pub async fn create_user_and_article(
    pool: &PgPool,
    user: &NewUser,
    article: &NewArticle,
) -> Result<(User, Article), DbError> {
    let mut tx = pool.begin().await?;

    let user = UserRepo::insert_with(&mut *tx, user).await?;
    let article = ArticleRepo::insert_with(&mut *tx, article).await?;

    tx.commit().await?;
    tracing::info!(user_id = user.id, article_id = article.id, "batch transaction committed");
    Ok((user, article))
}

/// Create a file, then a user whose head picture is that file
/// (interactive transaction: the second insert needs the first one's id).
pub async fn create_file_then_user(
    pool: &PgPool,
    opts: TxOptions,
    file: NewFile,
    user: NewUser,
) -> Result<(File, User), DbError> {
    interactive(pool, opts, move |tx| {
        Box::pin(async move {
            let file = FileRepo::insert_with(&mut **tx, &file).await?;
            let user = NewUser {
                head_id: Some(file.id),
                ..user
            };
            let user = UserRepo::insert_with(&mut **tx, &user).await?;
            Ok((file, user))
        })
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_limits() {
        let opts = TxOptions::default();
        assert_eq!(opts.max_wait, Duration::from_millis(2000));
        assert_eq!(opts.timeout, Duration::from_millis(5000));
        assert_eq!(TxOptions::from_millis(5000, 10000).timeout, Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_reports_stage_on_timeout() {
        let err = bounded(Duration::from_millis(50), "running", async {
            tokio::time::sleep(Duration::from_secs(1)).await;
        })
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            DbError::Timeout {
                stage: "running",
                limit_ms: 50
            }
        ));
    }

    #[tokio::test]
    async fn bounded_passes_through_fast_futures() {
        let value = bounded(Duration::from_secs(1), "running", async { 7 })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    async fn test_pool() -> PgPool {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = crate::db::create_pool(&url).await.expect("pool creation failed");
        crate::db::migrations::run(&pool).await.expect("migrations failed");
        pool
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn interactive_links_file_to_user() {
        let pool = test_pool().await;
        let (file, user) = create_file_then_user(
            &pool,
            TxOptions::from_millis(5000, 10000),
            NewFile::new("123.png", "123.png", 200).unwrap(),
            NewUser::new("11", 20, None).unwrap(),
        )
        .await
        .unwrap();

        assert_eq!(user.head_id, Some(file.id));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn interactive_rolls_back_on_timeout() {
        let pool = test_pool().await;
        let marker = format!("timeout-{}", std::process::id());
        let new_user = NewUser::new(&marker, 30, None).unwrap();

        let err = interactive(&pool, TxOptions::from_millis(2000, 50), move |tx| {
            Box::pin(async move {
                UserRepo::insert_with(&mut **tx, &new_user).await?;
                tokio::time::sleep(Duration::from_millis(500)).await;
                Ok(())
            })
        })
        .await
        .unwrap_err();
        assert!(matches!(err, DbError::Timeout { .. }));

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE name = $1")
            .bind(&marker)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count.0, 0);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn batch_rolls_back_when_one_write_fails() {
        let pool = test_pool().await;
        let marker = format!("batch-{}", std::process::id());
        // head_id points at a file that does not exist: the user insert fails
        let user = NewUser::new(&marker, 20, Some(i32::MAX)).unwrap();
        let article = NewArticle::new("11").unwrap();

        let err = create_user_and_article(&pool, &user, &article).await.unwrap_err();
        assert!(err.is_foreign_key_violation());

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE name = $1")
            .bind(&marker)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count.0, 0);
    }
}
