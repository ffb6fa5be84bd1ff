//! Article and collection endpoints

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::Deserialize;

use crate::db::{Article, ArticleRepo, Collection, CollectionRepo};
use crate::http::error::ApiError;
use crate::http::extractors::ValidId;
use crate::http::server::AppState;
use crate::models::NewArticle;

#[derive(Debug, Deserialize)]
pub struct CreateArticleRequest {
    pub name: String,
}

/// POST /api/articles
async fn create_article(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateArticleRequest>,
) -> Result<(StatusCode, Json<Article>), ApiError> {
    let article = NewArticle::new(&req.name)?;
    let article = ArticleRepo::new(&state.pool).create(&article).await?;

    Ok((StatusCode::CREATED, Json(article)))
}

#[derive(Debug, Deserialize)]
pub struct AddCollectionRequest {
    pub article_id: i32,
}

/// POST /api/users/{id}/collections - save an article for a user
///
/// Unknown user or article is a 400; saving the same article twice is a 409.
async fn add_collection(
    State(state): State<Arc<AppState>>,
    ValidId(user_id): ValidId,
    Json(req): Json<AddCollectionRequest>,
) -> Result<(StatusCode, Json<Collection>), ApiError> {
    let collection = CollectionRepo::new(&state.pool)
        .add(user_id, req.article_id)
        .await?;

    Ok((StatusCode::CREATED, Json(collection)))
}

/// Article routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/articles", post(create_article))
        .route("/api/users/{id}/collections", post(add_collection))
}
