//! Company repository
//!
//! Companies and users are linked many-to-many through `company_users`.

use serde::Serialize;
use sqlx::{FromRow, PgPool};

use crate::db::DbError;
use crate::models::Label;

/// Company record from database
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Company {
    pub id: i32,
    pub name: String,
}

/// Company with the ids of its users, ascending
#[derive(Debug, Clone, Serialize)]
pub struct CompanyWithUsers {
    #[serde(flatten)]
    pub company: Company,
    pub user_ids: Vec<i32>,
}

/// Company repository
pub struct CompanyRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> CompanyRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, name: &Label) -> Result<Company, DbError> {
        let company = sqlx::query_as::<_, Company>(
            "INSERT INTO companies (name) VALUES ($1) RETURNING id, name",
        )
        .bind(name.as_str())
        .fetch_one(self.pool)
        .await?;

        Ok(company)
    }

    pub async fn get(&self, id: i32) -> Result<CompanyWithUsers, DbError> {
        let company = sqlx::query_as::<_, Company>("SELECT id, name FROM companies WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("company", id))?;

        let user_ids = sqlx::query_scalar::<_, i32>(
            "SELECT user_id FROM company_users WHERE company_id = $1 ORDER BY user_id",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(CompanyWithUsers { company, user_ids })
    }

    /// Replace the company's users with exactly `user_ids`.
    ///
    /// Duplicates in `user_ids` are ignored. An unknown user id fails the
    /// whole operation and leaves the previous set in place.
    pub async fn set_users(
        &self,
        company_id: i32,
        user_ids: &[i32],
    ) -> Result<CompanyWithUsers, DbError> {
        let mut tx = self.pool.begin().await?;

        let company = sqlx::query_as::<_, Company>(
            "SELECT id, name FROM companies WHERE id = $1 FOR UPDATE",
        )
        .bind(company_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("company", company_id))?;

        sqlx::query("DELETE FROM company_users WHERE company_id = $1")
            .bind(company_id)
            .execute(&mut *tx)
            .await?;

        if !user_ids.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO company_users (company_id, user_id)
                SELECT $1, UNNEST($2::int4[])
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(company_id)
            .bind(user_ids)
            .execute(&mut *tx)
            .await?;
        }

        let user_ids = sqlx::query_scalar::<_, i32>(
            "SELECT user_id FROM company_users WHERE company_id = $1 ORDER BY user_id",
        )
        .bind(company_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::debug!(company_id, users = user_ids.len(), "company users replaced");
        Ok(CompanyWithUsers { company, user_ids })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::UserRepo;
    use crate::models::NewUser;

    #[tokio::test]
    #[ignore = "requires database"]
    async fn set_users_replaces_links() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = crate::db::create_pool(&url).await.expect("pool creation failed");
        crate::db::migrations::run(&pool).await.expect("migrations failed");

        let users = UserRepo::new(&pool);
        let a = users.create(&NewUser::new("a", 20, None).unwrap()).await.unwrap();
        let b = users.create(&NewUser::new("b", 21, None).unwrap()).await.unwrap();

        let repo = CompanyRepo::new(&pool);
        let company = repo.create(&Label::new("name", "acme").unwrap()).await.unwrap();

        let linked = repo.set_users(company.id, &[a.id, a.id]).await.unwrap();
        assert_eq!(linked.user_ids, vec![a.id]);

        let linked = repo.set_users(company.id, &[b.id]).await.unwrap();
        assert_eq!(linked.user_ids, vec![b.id]);

        let err = repo.set_users(company.id, &[i32::MAX]).await.unwrap_err();
        assert!(err.is_foreign_key_violation());
        assert_eq!(repo.get(company.id).await.unwrap().user_ids, vec![b.id]);

        let cleared = repo.set_users(company.id, &[]).await.unwrap();
        assert!(cleared.user_ids.is_empty());

        users.delete(a.id).await.unwrap();
        users.delete(b.id).await.unwrap();
    }
}
