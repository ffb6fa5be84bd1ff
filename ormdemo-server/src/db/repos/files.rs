//! File repository
//!
//! Every file leaving this repository carries its computed `url`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::postgres::PgExecutor;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use crate::db::filter::escape_like;
use crate::db::{fetch_page, DbError, PageSource};
use crate::file_url::FileWithUrl;
use crate::models::{Filename, NewFile, Page, PageQuery, Window};

/// File record from database
#[derive(Debug, Clone, FromRow)]
pub struct File {
    pub id: i32,
    pub originname: String,
    pub filename: String,
    pub size: i32,
    pub created_time: DateTime<Utc>,
    pub updated_time: DateTime<Utc>,
}

/// Filter for file listings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileFilter {
    pub id: Option<i32>,
    pub filename_contains: Option<String>,
}

/// File repository
pub struct FileRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> FileRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub(crate) async fn insert_with<'e, E>(executor: E, file: &NewFile) -> Result<File, DbError>
    where
        E: PgExecutor<'e>,
    {
        let file = sqlx::query_as::<_, File>(
            r#"
            INSERT INTO files (originname, filename, size)
            VALUES ($1, $2, $3)
            RETURNING id, originname, filename, size, created_time, updated_time
            "#,
        )
        .bind(&file.originname)
        .bind(file.filename.as_str())
        .bind(file.size)
        .fetch_one(executor)
        .await?;

        Ok(file)
    }

    pub(crate) async fn get_with<'e, E>(executor: E, id: i32) -> Result<File, DbError>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, File>(
            r#"
            SELECT id, originname, filename, size, created_time, updated_time
            FROM files
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| DbError::not_found("file", id))
    }

    pub(crate) async fn rename_with<'e, E>(
        executor: E,
        id: i32,
        filename: &Filename,
    ) -> Result<File, DbError>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, File>(
            r#"
            UPDATE files SET filename = $1, updated_time = NOW()
            WHERE id = $2
            RETURNING id, originname, filename, size, created_time, updated_time
            "#,
        )
        .bind(filename.as_str())
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| DbError::not_found("file", id))
    }

    /// Delete a file. Users pointing at it lose their head picture
    /// (`ON DELETE SET NULL`).
    pub(crate) async fn delete_with<'e, E>(executor: E, id: i32) -> Result<(), DbError>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM files WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("file", id));
        }
        Ok(())
    }

    /// Load files by id; missing ids are skipped.
    pub async fn find_by_ids(&self, ids: &[i32]) -> Result<Vec<File>, DbError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let files = sqlx::query_as::<_, File>(
            r#"
            SELECT id, originname, filename, size, created_time, updated_time
            FROM files
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(self.pool)
        .await?;

        Ok(files)
    }

    pub async fn create(&self, file: &NewFile) -> Result<FileWithUrl, DbError> {
        let file = Self::insert_with(self.pool, file).await?;
        tracing::debug!(file_id = file.id, "file created");
        Ok(file.into())
    }

    pub async fn get(&self, id: i32) -> Result<FileWithUrl, DbError> {
        Self::get_with(self.pool, id).await.map(FileWithUrl::from)
    }

    /// One page of files plus the total count for the filter.
    pub async fn find_and_count(
        &self,
        query: &PageQuery<FileFilter>,
    ) -> Result<Page<FileWithUrl>, DbError> {
        fetch_page(self, query).await
    }
}

fn push_where(qb: &mut QueryBuilder<'_, Postgres>, filter: &FileFilter) {
    qb.push(" WHERE TRUE");
    if let Some(id) = filter.id {
        qb.push(" AND id = ").push_bind(id);
    }
    if let Some(fragment) = &filter.filename_contains {
        qb.push(" AND filename LIKE ")
            .push_bind(format!("%{}%", escape_like(fragment)));
    }
}

#[async_trait]
impl PageSource for FileRepo<'_> {
    type Item = FileWithUrl;
    type Filter = FileFilter;
    type Cursor = i32;

    async fn fetch_slice(
        &self,
        filter: &FileFilter,
        window: Window,
        cursor: Option<&i32>,
    ) -> Result<Vec<FileWithUrl>, DbError> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT id, originname, filename, size, created_time, updated_time FROM files",
        );
        push_where(&mut qb, filter);
        if let Some(cursor) = cursor {
            qb.push(" AND id >= ").push_bind(*cursor);
        }
        qb.push(" ORDER BY id ASC LIMIT ")
            .push_bind(window.limit)
            .push(" OFFSET ")
            .push_bind(window.offset);

        let files = qb.build_query_as::<File>().fetch_all(self.pool).await?;
        Ok(files.into_iter().map(FileWithUrl::from).collect())
    }

    async fn count(&self, filter: &FileFilter) -> Result<i64, DbError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM files");
        push_where(&mut qb, filter);

        let total = qb.build_query_scalar::<i64>().fetch_one(self.pool).await?;
        Ok(total)
    }
}
