//! Shop repositories
//!
//! Two lookup styles on composite keys:
//! - `shop_cover_files` has a composite primary key (shop_id, file_id)
//! - `new_shops` has a surrogate id plus a unique (pre, name) pair

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool, Row};

use super::File;
use crate::db::DbError;
use crate::file_url::FileWithUrl;
use crate::models::Label;

/// Shop record from database
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Shop {
    pub id: i32,
    pub name: String,
}

/// Cover picture of a shop, with the file loaded
#[derive(Debug, Clone, Serialize)]
pub struct ShopCover {
    pub shop_id: i32,
    pub created_time: DateTime<Utc>,
    pub file: FileWithUrl,
}

/// Shop keyed by (pre, name)
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NewShop {
    pub id: i32,
    pub pre: String,
    pub name: String,
}

/// Shop repository
pub struct ShopRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> ShopRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, name: &Label) -> Result<Shop, DbError> {
        let shop =
            sqlx::query_as::<_, Shop>("INSERT INTO shops (name) VALUES ($1) RETURNING id, name")
                .bind(name.as_str())
                .fetch_one(self.pool)
                .await?;

        Ok(shop)
    }

    /// Link an existing file as a cover of the shop.
    pub async fn add_cover(&self, shop_id: i32, file_id: i32) -> Result<(), DbError> {
        sqlx::query("INSERT INTO shop_cover_files (shop_id, file_id) VALUES ($1, $2)")
            .bind(shop_id)
            .bind(file_id)
            .execute(self.pool)
            .await?;

        Ok(())
    }

    /// Look up a cover by its composite key.
    pub async fn find_cover(&self, shop_id: i32, file_id: i32) -> Result<Option<ShopCover>, DbError> {
        let row = sqlx::query(
            r#"
            SELECT
                s.shop_id,
                s.created_time AS cover_created_time,
                f.id,
                f.originname,
                f.filename,
                f.size,
                f.created_time,
                f.updated_time
            FROM shop_cover_files s
            JOIN files f ON f.id = s.file_id
            WHERE s.shop_id = $1 AND s.file_id = $2
            "#,
        )
        .bind(shop_id)
        .bind(file_id)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let file = File::from_row(&row)?;
        Ok(Some(ShopCover {
            shop_id: row.try_get("shop_id")?,
            created_time: row.try_get("cover_created_time")?,
            file: file.into(),
        }))
    }
}

/// Repository for shops keyed by (pre, name)
pub struct NewShopRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> NewShopRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A second shop with the same (pre, name) is a unique violation.
    pub async fn create(&self, pre: &Label, name: &Label) -> Result<NewShop, DbError> {
        let shop = sqlx::query_as::<_, NewShop>(
            "INSERT INTO new_shops (pre, name) VALUES ($1, $2) RETURNING id, pre, name",
        )
        .bind(pre.as_str())
        .bind(name.as_str())
        .fetch_one(self.pool)
        .await?;

        Ok(shop)
    }

    pub async fn find_by_pre_name(&self, pre: &str, name: &str) -> Result<Option<NewShop>, DbError> {
        let shop = sqlx::query_as::<_, NewShop>(
            "SELECT id, pre, name FROM new_shops WHERE pre = $1 AND name = $2",
        )
        .bind(pre)
        .bind(name)
        .fetch_optional(self.pool)
        .await?;

        Ok(shop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::FileRepo;
    use crate::models::NewFile;

    async fn test_pool() -> PgPool {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = crate::db::create_pool(&url).await.expect("pool creation failed");
        crate::db::migrations::run(&pool).await.expect("migrations failed");
        pool
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn finds_cover_by_composite_key() {
        let pool = test_pool().await;
        let shops = ShopRepo::new(&pool);

        let shop = shops.create(&Label::new("name", "corner").unwrap()).await.unwrap();
        let file = FileRepo::new(&pool)
            .create(&NewFile::new("cover", "cover.png", 10).unwrap())
            .await
            .unwrap();
        shops.add_cover(shop.id, file.id).await.unwrap();

        let cover = shops.find_cover(shop.id, file.id).await.unwrap().unwrap();
        assert_eq!(cover.shop_id, shop.id);
        assert_eq!(cover.file.url, "http://www.xxx.com/cover.png");

        assert!(shops.find_cover(shop.id, i32::MAX).await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn pre_name_pair_is_unique() {
        let pool = test_pool().await;
        let repo = NewShopRepo::new(&pool);
        let pre = Label::new("pre", &format!("p{}", std::process::id())).unwrap();
        let name = Label::new("name", &format!("{}", Utc::now().timestamp_micros())).unwrap();

        let shop = repo.create(&pre, &name).await.unwrap();
        let err = repo.create(&pre, &name).await.unwrap_err();
        assert!(err.is_unique_violation());

        let found = repo
            .find_by_pre_name(pre.as_str(), name.as_str())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, shop.id);
    }
}
