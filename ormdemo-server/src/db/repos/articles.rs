//! Article and collection repositories
//!
//! A collection links a user to an article they saved.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::postgres::PgExecutor;
use sqlx::{FromRow, PgPool, Row};

use crate::db::DbError;
use crate::models::NewArticle;

/// Article record from database
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Article {
    pub id: i32,
    pub name: String,
    pub created_time: DateTime<Utc>,
}

/// Collection record from database
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Collection {
    pub id: i32,
    pub user_id: i32,
    pub article_id: i32,
    pub created_time: DateTime<Utc>,
}

/// Collection with its article loaded
#[derive(Debug, Clone, Serialize)]
pub struct CollectionWithArticle {
    pub id: i32,
    pub user_id: i32,
    pub created_time: DateTime<Utc>,
    pub article: Article,
}

/// Article repository
pub struct ArticleRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> ArticleRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub(crate) async fn insert_with<'e, E>(
        executor: E,
        article: &NewArticle,
    ) -> Result<Article, DbError>
    where
        E: PgExecutor<'e>,
    {
        let article = sqlx::query_as::<_, Article>(
            r#"
            INSERT INTO articles (name)
            VALUES ($1)
            RETURNING id, name, created_time
            "#,
        )
        .bind(article.name())
        .fetch_one(executor)
        .await?;

        Ok(article)
    }

    pub async fn create(&self, article: &NewArticle) -> Result<Article, DbError> {
        Self::insert_with(self.pool, article).await
    }
}

/// Collection repository
pub struct CollectionRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> CollectionRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Save an article for a user. Saving the same pair twice is a conflict.
    pub async fn add(&self, user_id: i32, article_id: i32) -> Result<Collection, DbError> {
        let collection = sqlx::query_as::<_, Collection>(
            r#"
            INSERT INTO collections (user_id, article_id)
            VALUES ($1, $2)
            RETURNING id, user_id, article_id, created_time
            "#,
        )
        .bind(user_id)
        .bind(article_id)
        .fetch_one(self.pool)
        .await?;

        Ok(collection)
    }

    /// Collections of several users with their articles (single JOIN query).
    pub async fn for_users(&self, user_ids: &[i32]) -> Result<Vec<CollectionWithArticle>, DbError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            r#"
            SELECT
                c.id,
                c.user_id,
                c.created_time,
                a.id AS article_id,
                a.name AS article_name,
                a.created_time AS article_created_time
            FROM collections c
            JOIN articles a ON a.id = c.article_id
            WHERE c.user_id = ANY($1)
            ORDER BY c.id ASC
            "#,
        )
        .bind(user_ids)
        .fetch_all(self.pool)
        .await?;

        let collections = rows
            .into_iter()
            .map(|r| {
                Ok(CollectionWithArticle {
                    id: r.try_get("id")?,
                    user_id: r.try_get("user_id")?,
                    created_time: r.try_get("created_time")?,
                    article: Article {
                        id: r.try_get("article_id")?,
                        name: r.try_get("article_name")?,
                        created_time: r.try_get("article_created_time")?,
                    },
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        Ok(collections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "requires database"]
    async fn duplicate_collection_is_unique_violation() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = crate::db::create_pool(&url).await.expect("pool creation failed");
        crate::db::migrations::run(&pool).await.expect("migrations failed");

        let user = crate::db::UserRepo::new(&pool)
            .create(&crate::models::NewUser::new("collector", 20, None).unwrap())
            .await
            .unwrap();
        let article = ArticleRepo::new(&pool)
            .create(&NewArticle::new("11").unwrap())
            .await
            .unwrap();

        let repo = CollectionRepo::new(&pool);
        repo.add(user.id, article.id).await.unwrap();
        let err = repo.add(user.id, article.id).await.unwrap_err();
        assert!(err.is_unique_violation());

        let loaded = repo.for_users(&[user.id]).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].article.name, "11");
    }
}
