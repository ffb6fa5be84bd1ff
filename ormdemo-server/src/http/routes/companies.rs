//! Company endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;

use crate::db::{Company, CompanyRepo, CompanyWithUsers};
use crate::http::error::ApiError;
use crate::http::extractors::ValidId;
use crate::http::server::AppState;
use crate::models::Label;

#[derive(Debug, Deserialize)]
pub struct CreateCompanyRequest {
    pub name: String,
}

/// POST /api/companies
async fn create_company(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateCompanyRequest>,
) -> Result<(StatusCode, Json<Company>), ApiError> {
    let name = Label::new("name", &req.name)?;
    let company = CompanyRepo::new(&state.pool).create(&name).await?;

    Ok((StatusCode::CREATED, Json(company)))
}

/// GET /api/companies/{id}
async fn get_company(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
) -> Result<Json<CompanyWithUsers>, ApiError> {
    let company = CompanyRepo::new(&state.pool).get(id).await?;
    Ok(Json(company))
}

#[derive(Debug, Deserialize)]
pub struct SetUsersRequest {
    pub user_ids: Vec<i32>,
}

/// PUT /api/companies/{id}/users - replace the company's users
async fn set_users(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
    Json(req): Json<SetUsersRequest>,
) -> Result<Json<CompanyWithUsers>, ApiError> {
    let company = CompanyRepo::new(&state.pool)
        .set_users(id, &req.user_ids)
        .await?;
    Ok(Json(company))
}

/// Company routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/companies", post(create_company))
        .route("/api/companies/{id}", get(get_company))
        .route("/api/companies/{id}/users", put(set_users))
}
