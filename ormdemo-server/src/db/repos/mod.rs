//! Repository implementations for database access
//!
//! Each repository follows these patterns:
//! - Borrows the shared pool; executor-generic helpers (`*_with`) also run
//!   inside transactions
//! - Loads related rows in batches (no N+1)
//! - Handles conflicts via constraints (no check-then-insert)

pub mod files;
pub mod users;
pub mod articles;
pub mod companies;
pub mod shops;

pub use files::{File, FileFilter, FileRepo};
pub use users::{HeadChange, NameCount, User, UserRepo, UserSummary, UserWithHead, UserWithRelations};
pub use articles::{Article, ArticleRepo, Collection, CollectionRepo, CollectionWithArticle};
pub use companies::{Company, CompanyRepo, CompanyWithUsers};
pub use shops::{NewShop, NewShopRepo, Shop, ShopCover, ShopRepo};
