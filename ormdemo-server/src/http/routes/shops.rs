//! Shop endpoints - lookups by composite keys

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::db::{NewShop, NewShopRepo, Shop, ShopCover, ShopRepo};
use crate::http::error::ApiError;
use crate::http::extractors::ValidId;
use crate::http::server::AppState;
use crate::models::Label;

#[derive(Debug, Deserialize)]
pub struct CreateShopRequest {
    pub name: String,
}

/// POST /api/shops
async fn create_shop(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateShopRequest>,
) -> Result<(StatusCode, Json<Shop>), ApiError> {
    let name = Label::new("name", &req.name)?;
    let shop = ShopRepo::new(&state.pool).create(&name).await?;

    Ok((StatusCode::CREATED, Json(shop)))
}

#[derive(Debug, Deserialize)]
pub struct AddCoverRequest {
    pub file_id: i32,
}

/// POST /api/shops/{shop_id}/covers
async fn add_cover(
    State(state): State<Arc<AppState>>,
    ValidId(shop_id): ValidId,
    Json(req): Json<AddCoverRequest>,
) -> Result<StatusCode, ApiError> {
    ShopRepo::new(&state.pool)
        .add_cover(shop_id, req.file_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/shops/{shop_id}/covers/{file_id}
async fn get_cover(
    State(state): State<Arc<AppState>>,
    Path((shop_id, file_id)): Path<(i32, i32)>,
) -> Result<Json<ShopCover>, ApiError> {
    ShopRepo::new(&state.pool)
        .find_cover(shop_id, file_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound {
            resource: "shop cover",
            id: format!("{}/{}", shop_id, file_id),
        })
}

#[derive(Debug, Deserialize)]
pub struct CreateNewShopRequest {
    pub pre: String,
    pub name: String,
}

/// POST /api/new-shops - (pre, name) must be unique
async fn create_new_shop(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateNewShopRequest>,
) -> Result<(StatusCode, Json<NewShop>), ApiError> {
    let pre = Label::new("pre", &req.pre)?;
    let name = Label::new("name", &req.name)?;
    let shop = NewShopRepo::new(&state.pool).create(&pre, &name).await?;

    Ok((StatusCode::CREATED, Json(shop)))
}

/// GET /api/new-shops/{pre}/{name}
async fn get_new_shop(
    State(state): State<Arc<AppState>>,
    Path((pre, name)): Path<(String, String)>,
) -> Result<Json<NewShop>, ApiError> {
    NewShopRepo::new(&state.pool)
        .find_by_pre_name(&pre, &name)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound {
            resource: "shop",
            id: format!("{}/{}", pre, name),
        })
}

/// Shop routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/shops", post(create_shop))
        .route("/api/shops/{shop_id}/covers", post(add_cover))
        .route("/api/shops/{shop_id}/covers/{file_id}", get(get_cover))
        .route("/api/new-shops", post(create_new_shop))
        .route("/api/new-shops/{pre}/{name}", get(get_new_shop))
}
