//! User endpoints

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;

use super::files::CreateFileRequest;
use super::CountResponse;
use crate::db::{HeadChange, NameCount, User, UserRepo, UserSummary, UserWithHead, UserWithRelations};
use crate::http::error::ApiError;
use crate::http::extractors::ValidId;
use crate::http::server::AppState;
use crate::models::pagination::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::models::{
    Age, AgeStep, Filename, NewFile, NewUser, Page, PaginationParams, UserChanges, UserFilter,
    UserName, UserOrder, ValidationError,
};

/// Create user request
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub age: i32,
    #[serde(default)]
    pub head_id: Option<i32>,
}

impl TryFrom<CreateUserRequest> for NewUser {
    type Error = ValidationError;

    fn try_from(req: CreateUserRequest) -> Result<Self, Self::Error> {
        NewUser::new(&req.name, req.age, req.head_id)
    }
}

/// Partial user update; at least one field
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub age: Option<i32>,
}

impl UpdateUserRequest {
    fn into_changes(self) -> Result<UserChanges, ValidationError> {
        UserChanges::new(self.name.as_deref(), self.age)
    }
}

/// Query string for user listings
#[derive(Debug, Default, Deserialize)]
pub struct ListUsersParams {
    pub page: Option<i64>,
    #[serde(alias = "limit")]
    pub page_size: Option<u32>,
    /// Name contains
    pub name: Option<String>,
    pub cursor: Option<i32>,
}

fn name_filter(name: Option<String>) -> UserFilter {
    match name {
        Some(name) if !name.trim().is_empty() => UserFilter::name_contains(name.trim()),
        _ => UserFilter::all(),
    }
}

/// GET /api/users - one page of users with total count
async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListUsersParams>,
) -> Result<Json<Page<User>>, ApiError> {
    let mut query = PaginationParams {
        page: params.page,
        page_size: params.page_size,
    }
    .into_query(name_filter(params.name));
    query.cursor = params.cursor;

    let page = UserRepo::new(&state.pool).find_and_count(&query).await?;
    Ok(Json(page))
}

/// POST /api/users
async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let user = NewUser::try_from(req)?;
    let user = UserRepo::new(&state.pool).create(&user).await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /api/users/batch
async fn create_users(
    State(state): State<Arc<AppState>>,
    Json(req): Json<Vec<CreateUserRequest>>,
) -> Result<(StatusCode, Json<CountResponse>), ApiError> {
    let users = req
        .into_iter()
        .map(NewUser::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    let count = UserRepo::new(&state.pool).create_many(&users).await?;

    Ok((StatusCode::CREATED, Json(count.into())))
}

/// Create a user together with a new head file
#[derive(Debug, Deserialize)]
pub struct CreateWithHeadRequest {
    pub user: CreateUserRequest,
    pub head: CreateFileRequest,
}

/// POST /api/users/with-head
async fn create_with_head(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateWithHeadRequest>,
) -> Result<(StatusCode, Json<UserWithHead>), ApiError> {
    let user = NewUser::try_from(req.user)?;
    let head = NewFile::try_from(req.head)?;
    let created = UserRepo::new(&state.pool).create_with_head(&user, &head).await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// Filtered search body
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchUsersRequest {
    pub filter: UserFilter,
    pub order: UserOrder,
}

/// POST /api/users/search - every match in order
async fn search_users(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SearchUsersRequest>,
) -> Result<Json<Vec<User>>, ApiError> {
    let users = UserRepo::new(&state.pool)
        .find_many(&req.filter, req.order)
        .await?;
    Ok(Json(users))
}

/// POST /api/users/first - first match in order, 404 if none
async fn first_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SearchUsersRequest>,
) -> Result<Json<User>, ApiError> {
    UserRepo::new(&state.pool)
        .find_first(&req.filter, req.order)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound {
            resource: "user",
            id: "matching filter".into(),
        })
}

#[derive(Debug, Default, Deserialize)]
pub struct NameParams {
    pub name: Option<String>,
}

/// GET /api/users/summaries - id, name and head file only
async fn list_summaries(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NameParams>,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    let summaries = UserRepo::new(&state.pool)
        .find_summaries(&name_filter(params.name))
        .await?;
    Ok(Json(summaries))
}

#[derive(Debug, Deserialize)]
pub struct AfterParams {
    pub cursor: i32,
    pub take: Option<u32>,
}

/// GET /api/users/after - cursor pagination by id
async fn list_after(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AfterParams>,
) -> Result<Json<Vec<User>>, ApiError> {
    let take = match params.take {
        None | Some(0) => DEFAULT_PAGE_SIZE,
        Some(take) => take.min(MAX_PAGE_SIZE),
    };
    let users = UserRepo::new(&state.pool)
        .list_after(params.cursor, i64::from(take))
        .await?;
    Ok(Json(users))
}

#[derive(Debug, Deserialize)]
pub struct UpdateManyAgeRequest {
    pub from_age: i32,
    pub to_age: i32,
}

/// PATCH /api/users - set age on every user with `from_age`
async fn update_many_age(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateManyAgeRequest>,
) -> Result<Json<CountResponse>, ApiError> {
    let from = Age::new(req.from_age)?;
    let to = Age::new(req.to_age)?;
    let count = UserRepo::new(&state.pool).update_many_age(from, to).await?;

    Ok(Json(count.into()))
}

#[derive(Debug, Deserialize)]
pub struct DeleteManyParams {
    pub name: String,
}

/// DELETE /api/users?name= - delete every user with exactly this name
async fn delete_many(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DeleteManyParams>,
) -> Result<Json<CountResponse>, ApiError> {
    let name = UserName::new(&params.name)?;
    let count = UserRepo::new(&state.pool)
        .delete_many(&UserFilter::name_equals(name.into_string()))
        .await?;

    Ok(Json(count.into()))
}

fn default_below() -> i32 {
    17
}

fn default_by() -> i32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct IncrementRequest {
    #[serde(default = "default_below")]
    pub below: i32,
    #[serde(default = "default_by")]
    pub by: i32,
}

/// POST /api/users/age/increment - atomic `age + by` where `age < below`
async fn increment_age(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IncrementRequest>,
) -> Result<Json<CountResponse>, ApiError> {
    let by = AgeStep::new(req.by)?;
    let count = UserRepo::new(&state.pool)
        .increment_age_below(req.below, by)
        .await?;
    Ok(Json(count.into()))
}

#[derive(Debug, Default, Deserialize)]
pub struct NameStatsParams {
    #[serde(default)]
    pub min_age: i32,
}

/// GET /api/users/stats/names - users per name (raw SQL)
async fn name_stats(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NameStatsParams>,
) -> Result<Json<Vec<NameCount>>, ApiError> {
    let counts = UserRepo::new(&state.pool).name_counts(params.min_age).await?;
    Ok(Json(counts))
}

/// GET /api/users/{id}
async fn get_user(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
) -> Result<Json<User>, ApiError> {
    UserRepo::new(&state.pool)
        .find_unique(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound {
            resource: "user",
            id: id.to_string(),
        })
}

/// PATCH /api/users/{id}
async fn update_user(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<User>, ApiError> {
    let changes = req.into_changes()?;
    let user = UserRepo::new(&state.pool).update(id, &changes).await?;
    Ok(Json(user))
}

/// Upsert body: the row to create, or the changes to apply if it exists
#[derive(Debug, Deserialize)]
pub struct UpsertUserRequest {
    pub create: CreateUserRequest,
    #[serde(default)]
    pub update: UpdateUserRequest,
}

/// PUT /api/users/{id}
async fn upsert_user(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
    Json(req): Json<UpsertUserRequest>,
) -> Result<Json<User>, ApiError> {
    let create = NewUser::try_from(req.create)?;
    let update = match req.update.into_changes() {
        Err(ValidationError::NothingToUpdate) => UserChanges::default(),
        other => other?,
    };
    let user = UserRepo::new(&state.pool).upsert(id, &create, &update).await?;
    Ok(Json(user))
}

/// DELETE /api/users/{id}
async fn delete_user(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
) -> Result<Json<User>, ApiError> {
    let user = UserRepo::new(&state.pool).delete(id).await?;
    Ok(Json(user))
}

/// GET /api/users/{id}/relations - user with head file and collections
async fn get_relations(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
) -> Result<Json<UserWithRelations>, ApiError> {
    UserRepo::new(&state.pool)
        .find_with_relations(&UserFilter::by_id(id), UserOrder::default())
        .await?
        .into_iter()
        .next()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound {
            resource: "user",
            id: id.to_string(),
        })
}

/// Head file change, tagged by `action`
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum HeadChangeRequest {
    Create(CreateFileRequest),
    Rename { filename: String },
    Remove,
}

impl TryFrom<HeadChangeRequest> for HeadChange {
    type Error = ValidationError;

    fn try_from(req: HeadChangeRequest) -> Result<Self, Self::Error> {
        Ok(match req {
            HeadChangeRequest::Create(file) => HeadChange::Create(NewFile::try_from(file)?),
            HeadChangeRequest::Rename { filename } => HeadChange::Rename(Filename::new(&filename)?),
            HeadChangeRequest::Remove => HeadChange::Remove,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateHeadRequest {
    pub name: Option<String>,
    pub head: Option<HeadChangeRequest>,
}

/// PUT /api/users/{id}/head - update the user and its head file together
async fn update_head(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
    Json(req): Json<UpdateHeadRequest>,
) -> Result<Json<UserWithHead>, ApiError> {
    let name = req.name.as_deref().map(UserName::new).transpose()?;
    let head = req.head.map(HeadChange::try_from).transpose()?;
    if name.is_none() && head.is_none() {
        return Err(ValidationError::NothingToUpdate.into());
    }

    let user = UserRepo::new(&state.pool)
        .update_with_head(id, name, head)
        .await?;
    Ok(Json(user))
}

/// User routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/users",
            get(list_users)
                .post(create_user)
                .patch(update_many_age)
                .delete(delete_many),
        )
        .route("/api/users/batch", post(create_users))
        .route("/api/users/with-head", post(create_with_head))
        .route("/api/users/search", post(search_users))
        .route("/api/users/first", post(first_user))
        .route("/api/users/summaries", get(list_summaries))
        .route("/api/users/after", get(list_after))
        .route("/api/users/age/increment", post(increment_age))
        .route("/api/users/stats/names", get(name_stats))
        .route(
            "/api/users/{id}",
            get(get_user)
                .patch(update_user)
                .put(upsert_user)
                .delete(delete_user),
        )
        .route("/api/users/{id}/relations", get(get_relations))
        .route("/api/users/{id}/head", put(update_head))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_name_means_no_filter() {
        assert!(name_filter(None).is_empty());
        assert!(name_filter(Some("  ".into())).is_empty());
        assert!(!name_filter(Some("大黄".into())).is_empty());
    }

    #[test]
    fn increment_defaults_to_one_below_seventeen() {
        let req: IncrementRequest = serde_json::from_str("{}").unwrap();
        assert_eq!((req.below, req.by), (17, 1));
    }

    #[test]
    fn increment_step_is_bounded() {
        let req: IncrementRequest = serde_json::from_str(r#"{"by": 2147483647}"#).unwrap();
        assert!(matches!(
            AgeStep::new(req.by),
            Err(ValidationError::OutOfRange { field: "by", .. })
        ));
    }

    #[test]
    fn head_change_is_tagged_by_action() {
        let req: HeadChangeRequest =
            serde_json::from_str(r#"{"action": "rename", "filename": "234.png"}"#).unwrap();
        assert!(matches!(
            HeadChange::try_from(req).unwrap(),
            HeadChange::Rename(name) if name.as_str() == "234.png"
        ));

        let req: HeadChangeRequest = serde_json::from_str(r#"{"action": "remove"}"#).unwrap();
        assert!(matches!(HeadChange::try_from(req).unwrap(), HeadChange::Remove));

        let req: HeadChangeRequest = serde_json::from_str(
            r#"{"action": "create", "originname": "文件名字", "filename": "123.png", "size": 100}"#,
        )
        .unwrap();
        assert!(matches!(HeadChange::try_from(req).unwrap(), HeadChange::Create(_)));
    }

    #[test]
    fn empty_update_is_rejected() {
        assert!(matches!(
            UpdateUserRequest::default().into_changes(),
            Err(ValidationError::NothingToUpdate)
        ));
    }

    #[test]
    fn search_body_fields_are_optional() {
        let req: SearchUsersRequest = serde_json::from_str("{}").unwrap();
        assert!(req.filter.is_empty());
        assert_eq!(req.order, UserOrder::CreatedDesc);
    }
}
