//! File endpoints
//!
//! Every file in a response carries its computed `url`.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::db::{FileFilter, FileRepo};
use crate::file_url::FileWithUrl;
use crate::http::error::ApiError;
use crate::http::extractors::ValidId;
use crate::http::server::AppState;
use crate::models::{NewFile, Page, PaginationParams, ValidationError};

/// Create file request
#[derive(Debug, Deserialize)]
pub struct CreateFileRequest {
    pub originname: String,
    pub filename: String,
    #[serde(default)]
    pub size: i32,
}

impl TryFrom<CreateFileRequest> for NewFile {
    type Error = ValidationError;

    fn try_from(req: CreateFileRequest) -> Result<Self, Self::Error> {
        NewFile::new(&req.originname, &req.filename, req.size)
    }
}

/// Query string for file listings
#[derive(Debug, Default, Deserialize)]
pub struct ListFilesParams {
    pub page: Option<i64>,
    #[serde(alias = "limit")]
    pub page_size: Option<u32>,
    pub id: Option<i32>,
    pub filename: Option<String>,
    pub cursor: Option<i32>,
}

/// GET /api/files - one page of files with total count
async fn list_files(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListFilesParams>,
) -> Result<Json<Page<FileWithUrl>>, ApiError> {
    let filter = FileFilter {
        id: params.id,
        filename_contains: params.filename,
    };
    let mut query = PaginationParams {
        page: params.page,
        page_size: params.page_size,
    }
    .into_query(filter);
    query.cursor = params.cursor;

    let page = FileRepo::new(&state.pool).find_and_count(&query).await?;
    Ok(Json(page))
}

/// POST /api/files
async fn create_file(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateFileRequest>,
) -> Result<(StatusCode, Json<FileWithUrl>), ApiError> {
    let file = NewFile::try_from(req)?;
    let file = FileRepo::new(&state.pool).create(&file).await?;

    Ok((StatusCode::CREATED, Json(file)))
}

/// GET /api/files/{id}
async fn get_file(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
) -> Result<Json<FileWithUrl>, ApiError> {
    let file = FileRepo::new(&state.pool).get(id).await?;
    Ok(Json(file))
}

/// File routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/files", get(list_files).post(create_file))
        .route("/api/files/{id}", get(get_file))
}
