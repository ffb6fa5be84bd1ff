//! Transaction endpoints
//!
//! - batch: independent inserts that succeed or fail together
//! - interactive: the second insert depends on the first one's id

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use super::articles::CreateArticleRequest;
use super::files::CreateFileRequest;
use super::users::CreateUserRequest;
use crate::db::transaction::{create_file_then_user, create_user_and_article};
use crate::db::{Article, User};
use crate::file_url::FileWithUrl;
use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::models::{NewArticle, NewFile, NewUser};

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub user: CreateUserRequest,
    pub article: CreateArticleRequest,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub user: User,
    pub article: Article,
}

/// POST /api/transactions/batch
async fn batch(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BatchRequest>,
) -> Result<(StatusCode, Json<BatchResponse>), ApiError> {
    let user = NewUser::try_from(req.user)?;
    let article = NewArticle::new(&req.article.name)?;
    let (user, article) = create_user_and_article(&state.pool, &user, &article).await?;

    Ok((StatusCode::CREATED, Json(BatchResponse { user, article })))
}

#[derive(Debug, Deserialize)]
pub struct InteractiveRequest {
    pub file: CreateFileRequest,
    pub user: CreateUserRequest,
}

#[derive(Debug, Serialize)]
pub struct InteractiveResponse {
    pub file: FileWithUrl,
    pub user: User,
}

/// POST /api/transactions/interactive - bounded by the configured limits
async fn interactive(
    State(state): State<Arc<AppState>>,
    Json(req): Json<InteractiveRequest>,
) -> Result<(StatusCode, Json<InteractiveResponse>), ApiError> {
    let file = NewFile::try_from(req.file)?;
    let user = NewUser::try_from(req.user)?;
    let (file, user) = create_file_then_user(&state.pool, state.tx_options, file, user).await?;

    Ok((
        StatusCode::CREATED,
        Json(InteractiveResponse {
            file: file.into(),
            user,
        }),
    ))
}

/// Transaction routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/transactions/batch", post(batch))
        .route("/api/transactions/interactive", post(interactive))
}
