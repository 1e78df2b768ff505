use crate::AppState;
use crate::api::extractors::{PathParam, ValidatedJson, ValidatedQuery};
use crate::api::models::pagination::PaginatedResponse;
use crate::api::models::users::{ListUsersQuery, UserCreate, UserResponse, UserUpdate};
use crate::errors::{Error, ErrorBody, Result};
use crate::services::UserService;
use crate::types::UserId;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
};

#[utoipa::path(
    post,
    path = "/users/",
    tag = "users",
    summary = "Create user",
    request_body = UserCreate,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Username or email already exists", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 422, description = "Invalid request body", body = ErrorBody),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<UserCreate>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let user = UserService::new(&mut tx).create(input).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

#[utoipa::path(
    get,
    path = "/users/",
    tag = "users",
    summary = "List users",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "One page of users", body = PaginatedResponse<UserResponse>),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 422, description = "Invalid pagination, filter or sort parameter", body = ErrorBody),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_users(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<ListUsersQuery>,
) -> Result<Json<PaginatedResponse<UserResponse>>> {
    // One transaction so the total and the page see the same snapshot.
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let page = UserService::new(&mut tx).list(&query).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    let items = page.items.into_iter().map(UserResponse::from).collect();
    Ok(Json(PaginatedResponse::new(items, page.total, query.pagination)))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    summary = "Get user",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_user(State(state): State<AppState>, PathParam(id): PathParam<UserId>) -> Result<Json<UserResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = UserService::new(&mut conn).get(id).await?;

    Ok(Json(UserResponse::from(user)))
}

#[utoipa::path(
    patch,
    path = "/users/{id}",
    tag = "users",
    summary = "Update user",
    description = "Only the supplied fields change. An explicit null clears full_name.",
    params(("id" = i64, Path, description = "User ID")),
    request_body = UserUpdate,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Username or email already exists", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody),
        (status = 422, description = "Invalid request body", body = ErrorBody),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_user(
    State(state): State<AppState>,
    PathParam(id): PathParam<UserId>,
    ValidatedJson(input): ValidatedJson<UserUpdate>,
) -> Result<Json<UserResponse>> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let user = UserService::new(&mut tx).update(id, input).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(UserResponse::from(user)))
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    summary = "Delete user",
    description = "Also deletes every todo the user owns.",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_user(State(state): State<AppState>, PathParam(id): PathParam<UserId>) -> Result<StatusCode> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    UserService::new(&mut tx).delete(id).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(StatusCode::NO_CONTENT)
}
