//! Domain models with validation at construction
//!
//! Request input is validated when creating these types.
//! Invalid input returns ValidationError, not panic.

pub mod validation;
pub mod user;
pub mod file;
pub mod article;
pub mod label;
pub mod filter;
pub mod pagination;

pub use validation::ValidationError;
pub use user::{Age, AgeStep, NewUser, UserChanges, UserName};
pub use article::NewArticle;
pub use label::Label;
pub use file::{Filename, NewFile};
pub use filter::{IntFilter, StringFilter, UserFilter, UserOrder};
pub use pagination::{Page, PageQuery, PaginationParams, Window};
