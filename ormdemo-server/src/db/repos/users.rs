//! User repository
//!
//! Covers the whole query surface of the demo:
//! - create: single, multi-row, with a new head file (transaction)
//! - update: single, bulk, atomic increment, with head file changes
//! - upsert, find (unique / first / many / relations / projection)
//! - delete, raw aggregate SQL, offset and cursor pagination

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use sqlx::postgres::{PgExecutor, PgRow};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Row};

use super::{CollectionRepo, CollectionWithArticle, File, FileRepo};
use crate::db::filter::push_where;
use crate::db::{fetch_page, DbError, PageSource};
use crate::file_url::FileWithUrl;
use crate::models::{
    Age, AgeStep, Filename, NewFile, NewUser, Page, PageQuery, UserChanges, UserFilter, UserName,
    UserOrder,
    Window,
};

const USER_COLUMNS: &str = "id, name, age, head_id, created_time, updated_time";

/// Rows per INSERT statement in `create_many` (3 binds per row)
const INSERT_CHUNK: usize = 1_000;

/// User record from database
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub age: i32,
    pub head_id: Option<i32>,
    pub created_time: DateTime<Utc>,
    pub updated_time: DateTime<Utc>,
}

/// User with head picture loaded
#[derive(Debug, Clone, Serialize)]
pub struct UserWithHead {
    #[serde(flatten)]
    pub user: User,
    pub head: Option<FileWithUrl>,
}

/// User with head picture and saved articles loaded
#[derive(Debug, Clone, Serialize)]
pub struct UserWithRelations {
    #[serde(flatten)]
    pub user: User,
    pub head: Option<FileWithUrl>,
    pub collections: Vec<CollectionWithArticle>,
}

/// Projection: only the columns a listing needs
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: i32,
    pub name: String,
    pub head: Option<FileWithUrl>,
}

/// Users per name, from raw SQL
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NameCount {
    pub name: String,
    /// BIGINT aggregate; serialized as a string so JSON clients keep precision
    #[serde(serialize_with = "count_as_string")]
    pub count: i64,
}

fn count_as_string<S: Serializer>(count: &i64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(count)
}

/// Change applied to a user's head file together with the user update
#[derive(Debug, Clone)]
pub enum HeadChange {
    /// Store a new file and link it as the head
    Create(NewFile),
    /// Rename the current head file
    Rename(Filename),
    /// Delete the current head file
    Remove,
}

/// User repository
pub struct UserRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // --- create ---

    pub(crate) async fn insert_with<'e, E>(executor: E, user: &NewUser) -> Result<User, DbError>
    where
        E: PgExecutor<'e>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, age, head_id)
            VALUES ($1, $2, $3)
            RETURNING id, name, age, head_id, created_time, updated_time
            "#,
        )
        .bind(user.name.as_str())
        .bind(user.age.get())
        .bind(user.head_id)
        .fetch_one(executor)
        .await?;

        Ok(user)
    }

    pub async fn create(&self, user: &NewUser) -> Result<User, DbError> {
        let user = Self::insert_with(self.pool, user).await?;
        tracing::debug!(user_id = user.id, "user created");
        Ok(user)
    }

    /// Insert many users with multi-row INSERTs in one transaction.
    ///
    /// Returns the number of rows inserted.
    pub async fn create_many(&self, users: &[NewUser]) -> Result<u64, DbError> {
        if users.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;

        for chunk in users.chunks(INSERT_CHUNK) {
            let mut qb = QueryBuilder::<Postgres>::new("INSERT INTO users (name, age, head_id) ");
            qb.push_values(chunk, |mut row, user| {
                row.push_bind(user.name.as_str().to_owned())
                    .push_bind(user.age.get())
                    .push_bind(user.head_id);
            });
            inserted += qb.build().execute(&mut *tx).await?.rows_affected();
        }

        tx.commit().await?;
        Ok(inserted)
    }

    /// Create a head file and a user linked to it. Both or neither.
    pub async fn create_with_head(
        &self,
        user: &NewUser,
        head: &NewFile,
    ) -> Result<UserWithHead, DbError> {
        let mut tx = self.pool.begin().await?;

        let file = FileRepo::insert_with(&mut *tx, head).await?;
        let user = NewUser {
            head_id: Some(file.id),
            ..user.clone()
        };
        let user = Self::insert_with(&mut *tx, &user).await?;

        tx.commit().await?;
        Ok(UserWithHead {
            user,
            head: Some(file.into()),
        })
    }

    // --- update ---

    async fn update_with<'e, E>(
        executor: E,
        id: i32,
        changes: &UserChanges,
    ) -> Result<User, DbError>
    where
        E: PgExecutor<'e>,
    {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE users SET updated_time = NOW()");
        if let Some(name) = &changes.name {
            qb.push(", name = ").push_bind(name.as_str().to_owned());
        }
        if let Some(age) = changes.age {
            qb.push(", age = ").push_bind(age.get());
        }
        qb.push(" WHERE id = ").push_bind(id);
        qb.push(" RETURNING ").push(USER_COLUMNS);

        qb.build_query_as::<User>()
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| DbError::not_found("user", id))
    }

    /// Update one user by id.
    pub async fn update(&self, id: i32, changes: &UserChanges) -> Result<User, DbError> {
        Self::update_with(self.pool, id, changes).await
    }

    /// Set `age = to` on every user whose age is `from`.
    /// All matched rows receive the same value.
    pub async fn update_many_age(&self, from: Age, to: Age) -> Result<u64, DbError> {
        let result = sqlx::query(
            "UPDATE users SET age = $1, updated_time = NOW() WHERE age = $2",
        )
        .bind(to.get())
        .bind(from.get())
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Atomically add `by` (may be negative) to the age of every user
    /// younger than `below`. The arithmetic happens in the database, so
    /// concurrent increments are not lost.
    ///
    /// If any resulting age leaves the accepted range, the `users_age_range`
    /// CHECK rejects the whole statement and no row changes.
    pub async fn increment_age_below(&self, below: i32, by: AgeStep) -> Result<u64, DbError> {
        let result = sqlx::query(
            "UPDATE users SET age = age + $1, updated_time = NOW() WHERE age < $2",
        )
        .bind(by.get())
        .bind(below)
        .execute(self.pool)
        .await?;

        tracing::debug!(below, by = by.get(), rows = result.rows_affected(), "ages incremented");
        Ok(result.rows_affected())
    }

    /// Update a user and their head file in one transaction.
    pub async fn update_with_head(
        &self,
        id: i32,
        name: Option<UserName>,
        head: Option<HeadChange>,
    ) -> Result<UserWithHead, DbError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, age, head_id, created_time, updated_time
            FROM users
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("user", id))?;

        let mut user = match name {
            Some(name) => {
                let changes = UserChanges {
                    name: Some(name),
                    age: None,
                };
                Self::update_with(&mut *tx, id, &changes).await?
            }
            None => current,
        };

        match head {
            None => {}
            Some(HeadChange::Create(file)) => {
                let file = FileRepo::insert_with(&mut *tx, &file).await?;
                user = sqlx::query_as::<_, User>(
                    r#"
                    UPDATE users SET head_id = $1, updated_time = NOW()
                    WHERE id = $2
                    RETURNING id, name, age, head_id, created_time, updated_time
                    "#,
                )
                .bind(file.id)
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
            }
            Some(HeadChange::Rename(filename)) => {
                let head_id = user
                    .head_id
                    .ok_or_else(|| DbError::not_found("head file of user", id))?;
                FileRepo::rename_with(&mut *tx, head_id, &filename).await?;
            }
            Some(HeadChange::Remove) => {
                let head_id = user
                    .head_id
                    .ok_or_else(|| DbError::not_found("head file of user", id))?;
                FileRepo::delete_with(&mut *tx, head_id).await?;
                user.head_id = None;
            }
        }

        let head = match user.head_id {
            Some(head_id) => Some(FileRepo::get_with(&mut *tx, head_id).await?.into()),
            None => None,
        };

        tx.commit().await?;
        Ok(UserWithHead { user, head })
    }

    // --- upsert ---

    /// Update user `id` if it exists, otherwise create it with that id.
    pub async fn upsert(
        &self,
        id: i32,
        create: &NewUser,
        update: &UserChanges,
    ) -> Result<User, DbError> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, age, head_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET
                name = COALESCE($5, users.name),
                age = COALESCE($6, users.age),
                updated_time = NOW()
            RETURNING id, name, age, head_id, created_time, updated_time
            "#,
        )
        .bind(id)
        .bind(create.name.as_str())
        .bind(create.age.get())
        .bind(create.head_id)
        .bind(update.name.as_ref().map(UserName::as_str))
        .bind(update.age.map(Age::get))
        .fetch_one(&mut *tx)
        .await?;

        // An explicit id bypasses the sequence; move it past the largest id
        sqlx::query(
            "SELECT setval(pg_get_serial_sequence('users', 'id'), (SELECT MAX(id) FROM users))",
        )
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(user)
    }

    // --- find ---

    /// Find by primary key.
    pub async fn find_unique(&self, id: i32) -> Result<Option<User>, DbError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, age, head_id, created_time, updated_time
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// First match in `order`, if any.
    pub async fn find_first(
        &self,
        filter: &UserFilter,
        order: UserOrder,
    ) -> Result<Option<User>, DbError> {
        let mut qb = select_users(filter, order);
        qb.push(" LIMIT 1");

        let user = qb.build_query_as::<User>().fetch_optional(self.pool).await?;
        Ok(user)
    }

    pub async fn find_many(&self, filter: &UserFilter, order: UserOrder) -> Result<Vec<User>, DbError> {
        let mut qb = select_users(filter, order);
        let users = qb.build_query_as::<User>().fetch_all(self.pool).await?;
        Ok(users)
    }

    /// Users with head file and collections.
    ///
    /// Three queries regardless of result size: users, heads, collections.
    pub async fn find_with_relations(
        &self,
        filter: &UserFilter,
        order: UserOrder,
    ) -> Result<Vec<UserWithRelations>, DbError> {
        let users = self.find_many(filter, order).await?;
        if users.is_empty() {
            return Ok(Vec::new());
        }

        let head_ids: Vec<i32> = users.iter().filter_map(|u| u.head_id).collect();
        let user_ids: Vec<i32> = users.iter().map(|u| u.id).collect();

        let mut heads: HashMap<i32, File> = FileRepo::new(self.pool)
            .find_by_ids(&head_ids)
            .await?
            .into_iter()
            .map(|f| (f.id, f))
            .collect();

        let mut collections: HashMap<i32, Vec<CollectionWithArticle>> = HashMap::new();
        for collection in CollectionRepo::new(self.pool).for_users(&user_ids).await? {
            collections
                .entry(collection.user_id)
                .or_default()
                .push(collection);
        }

        Ok(users
            .into_iter()
            .map(|user| UserWithRelations {
                head: user
                    .head_id
                    .and_then(|id| heads.remove(&id))
                    .map(FileWithUrl::from),
                collections: collections.remove(&user.id).unwrap_or_default(),
                user,
            })
            .collect())
    }

    /// Projection with only id, name and head file.
    pub async fn find_summaries(&self, filter: &UserFilter) -> Result<Vec<UserSummary>, DbError> {
        let mut qb = QueryBuilder::<Postgres>::new(
            r#"
            SELECT
                u.id,
                u.name,
                f.id AS file_id,
                f.originname,
                f.filename,
                f.size,
                f.created_time AS file_created_time,
                f.updated_time AS file_updated_time
            FROM (SELECT id, name, head_id, created_time FROM users"#,
        );
        push_where(&mut qb, filter);
        qb.push(") u LEFT JOIN files f ON f.id = u.head_id ORDER BY u.created_time DESC, u.id DESC");

        let rows = qb.build().fetch_all(self.pool).await?;
        let summaries = rows
            .iter()
            .map(summary_from_row)
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        Ok(summaries)
    }

    pub async fn count(&self, filter: &UserFilter) -> Result<i64, DbError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users");
        push_where(&mut qb, filter);

        let total = qb.build_query_scalar::<i64>().fetch_one(self.pool).await?;
        Ok(total)
    }

    // --- delete ---

    /// Delete by primary key, returning the deleted row.
    pub async fn delete(&self, id: i32) -> Result<User, DbError> {
        sqlx::query_as::<_, User>(
            r#"
            DELETE FROM users
            WHERE id = $1
            RETURNING id, name, age, head_id, created_time, updated_time
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("user", id))
    }

    /// Delete every match; returns the number of rows removed.
    pub async fn delete_many(&self, filter: &UserFilter) -> Result<u64, DbError> {
        let mut qb = QueryBuilder::<Postgres>::new("DELETE FROM users");
        push_where(&mut qb, filter);

        if filter.is_empty() {
            tracing::warn!("delete_many without conditions removes every user");
        }

        let result = qb.build().execute(self.pool).await?;
        tracing::info!(rows = result.rows_affected(), "users deleted");
        Ok(result.rows_affected())
    }

    // --- raw SQL ---

    /// Number of users per name among users aged `min_age` or older,
    /// most common names first.
    pub async fn name_counts(&self, min_age: i32) -> Result<Vec<NameCount>, DbError> {
        let counts = sqlx::query_as::<_, NameCount>(
            r#"
            SELECT name, COUNT(name) AS count
            FROM users
            WHERE age >= $1
            GROUP BY name
            ORDER BY count DESC, name ASC
            "#,
        )
        .bind(min_age)
        .fetch_all(self.pool)
        .await?;

        Ok(counts)
    }

    // --- pagination ---

    /// One page of users plus the total count for the filter.
    pub async fn find_and_count(&self, query: &PageQuery<UserFilter>) -> Result<Page<User>, DbError> {
        fetch_page(self, query).await
    }

    /// Up to `take` users starting at id `cursor` (inclusive), by id.
    pub async fn list_after(&self, cursor: i32, take: i64) -> Result<Vec<User>, DbError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, age, head_id, created_time, updated_time
            FROM users
            WHERE id >= $1
            ORDER BY id ASC
            LIMIT $2
            "#,
        )
        .bind(cursor)
        .bind(take)
        .fetch_all(self.pool)
        .await?;

        Ok(users)
    }
}

fn select_users(filter: &UserFilter, order: UserOrder) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
    qb.push(USER_COLUMNS).push(" FROM users");
    push_where(&mut qb, filter);
    qb.push(" ORDER BY ").push(order.as_sql());
    qb
}

fn summary_from_row(row: &PgRow) -> Result<UserSummary, sqlx::Error> {
    let file_id: Option<i32> = row.try_get("file_id")?;
    let head = match file_id {
        Some(id) => Some(FileWithUrl::from(File {
            id,
            originname: row.try_get("originname")?,
            filename: row.try_get("filename")?,
            size: row.try_get("size")?,
            created_time: row.try_get("file_created_time")?,
            updated_time: row.try_get("file_updated_time")?,
        })),
        None => None,
    };

    Ok(UserSummary {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        head,
    })
}

#[async_trait]
impl PageSource for UserRepo<'_> {
    type Item = User;
    type Filter = UserFilter;
    type Cursor = i32;

    async fn fetch_slice(
        &self,
        filter: &UserFilter,
        window: Window,
        cursor: Option<&i32>,
    ) -> Result<Vec<User>, DbError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
        qb.push(USER_COLUMNS).push(" FROM users");
        push_where(&mut qb, filter);
        if let Some(cursor) = cursor {
            qb.push(" AND id >= ").push_bind(*cursor);
        }
        qb.push(" ORDER BY id ASC LIMIT ")
            .push_bind(window.limit)
            .push(" OFFSET ")
            .push_bind(window.offset);

        let users = qb.build_query_as::<User>().fetch_all(self.pool).await?;
        Ok(users)
    }

    async fn count(&self, filter: &UserFilter) -> Result<i64, DbError> {
        UserRepo::count(self, filter).await
    }
}
