//! Schema setup for the demo tables
//!
//! Every statement is idempotent, so `run` is safe on each startup.

use sqlx::PgPool;

use super::DbError;

/// Name of the CHECK keeping `users.age` inside the accepted range
pub const USER_AGE_CONSTRAINT: &str = "users_age_range";

/// Table definitions in dependency order
const TABLES: &[(&str, &str)] = &[
    (
        "files",
        r#"
        CREATE TABLE IF NOT EXISTS files (
            id SERIAL PRIMARY KEY,
            originname TEXT NOT NULL,
            filename TEXT NOT NULL,
            size INTEGER NOT NULL DEFAULT 0 CHECK (size >= 0),
            created_time TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_time TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "users",
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id SERIAL PRIMARY KEY,
            name TEXT NOT NULL,
            age INTEGER NOT NULL CONSTRAINT users_age_range CHECK (age BETWEEN 0 AND 150),
            head_id INTEGER UNIQUE REFERENCES files(id) ON DELETE SET NULL,
            created_time TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_time TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "articles",
        r#"
        CREATE TABLE IF NOT EXISTS articles (
            id SERIAL PRIMARY KEY,
            name TEXT NOT NULL,
            created_time TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "collections",
        r#"
        CREATE TABLE IF NOT EXISTS collections (
            id SERIAL PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            article_id INTEGER NOT NULL REFERENCES articles(id) ON DELETE CASCADE,
            created_time TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            UNIQUE (user_id, article_id)
        )
        "#,
    ),
    (
        "companies",
        r#"
        CREATE TABLE IF NOT EXISTS companies (
            id SERIAL PRIMARY KEY,
            name TEXT NOT NULL
        )
        "#,
    ),
    (
        "company_users",
        r#"
        CREATE TABLE IF NOT EXISTS company_users (
            company_id INTEGER NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            PRIMARY KEY (company_id, user_id)
        )
        "#,
    ),
    (
        "shops",
        r#"
        CREATE TABLE IF NOT EXISTS shops (
            id SERIAL PRIMARY KEY,
            name TEXT NOT NULL
        )
        "#,
    ),
    (
        "shop_cover_files",
        r#"
        CREATE TABLE IF NOT EXISTS shop_cover_files (
            shop_id INTEGER NOT NULL REFERENCES shops(id) ON DELETE CASCADE,
            file_id INTEGER NOT NULL REFERENCES files(id) ON DELETE CASCADE,
            created_time TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            PRIMARY KEY (shop_id, file_id)
        )
        "#,
    ),
    (
        "new_shops",
        r#"
        CREATE TABLE IF NOT EXISTS new_shops (
            id SERIAL PRIMARY KEY,
            pre TEXT NOT NULL,
            name TEXT NOT NULL,
            UNIQUE (pre, name)
        )
        "#,
    ),
];

/// Constraints added to tables created before the constraint existed.
/// `NOT VALID` leaves old rows alone and checks every later write.
const CONSTRAINTS: &[&str] = &[r#"
    DO $$
    BEGIN
        IF NOT EXISTS (SELECT 1 FROM pg_constraint WHERE conname = 'users_age_range') THEN
            ALTER TABLE users
                ADD CONSTRAINT users_age_range CHECK (age BETWEEN 0 AND 150) NOT VALID;
        END IF;
    END
    $$
    "#];

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_users_name ON users(name)",
    "CREATE INDEX IF NOT EXISTS idx_users_created ON users(created_time DESC)",
    "CREATE INDEX IF NOT EXISTS idx_users_age ON users(age)",
    "CREATE INDEX IF NOT EXISTS idx_collections_user ON collections(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_company_users_user ON company_users(user_id)",
];

/// Create all tables and indexes
pub async fn run(pool: &PgPool) -> Result<(), DbError> {
    tracing::info!("Running migrations...");

    for (table, ddl) in TABLES {
        tracing::debug!(table, "ensuring table");
        sqlx::query(*ddl).execute(pool).await?;
    }

    for ddl in CONSTRAINTS {
        sqlx::query(*ddl).execute(pool).await?;
    }

    for ddl in INDEXES {
        sqlx::query(*ddl).execute(pool).await?;
    }

    tracing::info!(tables = TABLES.len(), "Migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn referenced_tables_are_created_first() {
        let position = |name: &str| {
            TABLES
                .iter()
                .position(|(table, _)| *table == name)
                .unwrap_or_else(|| panic!("missing table {name}"))
        };

        assert!(position("files") < position("users"));
        assert!(position("users") < position("collections"));
        assert!(position("articles") < position("collections"));
        assert!(position("companies") < position("company_users"));
        assert!(position("shops") < position("shop_cover_files"));
    }

    #[test]
    fn statements_are_idempotent() {
        for (_, ddl) in TABLES {
            assert!(ddl.contains("IF NOT EXISTS"));
        }
        for ddl in CONSTRAINTS.iter().chain(INDEXES) {
            assert!(ddl.contains("IF NOT EXISTS"));
        }
    }

    #[test]
    fn age_constraint_name_matches_ddl() {
        let users = TABLES
            .iter()
            .find(|(table, _)| *table == "users")
            .map(|(_, ddl)| *ddl)
            .unwrap();
        assert!(users.contains(&format!("CONSTRAINT {USER_AGE_CONSTRAINT} CHECK (age BETWEEN 0 AND 150)")));
        assert!(CONSTRAINTS[0].contains(USER_AGE_CONSTRAINT));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn migrations_run_twice() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = crate::db::create_pool(&url).await.expect("pool creation failed");

        run(&pool).await.expect("first run");
        run(&pool).await.expect("second run");
    }
}
