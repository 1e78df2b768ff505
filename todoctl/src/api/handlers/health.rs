use crate::AppState;
use crate::api::models::health::{HealthResponse, StatusResponse};
use crate::errors::{Error, ErrorBody, Result};
use axum::{Json, extract::State};

#[utoipa::path(
    get,
    path = "/",
    tag = "health",
    summary = "Service status",
    responses((status = 200, description = "Service is up", body = StatusResponse))
)]
pub async fn status() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok".to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    summary = "Health check",
    description = "Runs a trivial query to confirm the database is reachable.",
    responses(
        (status = 200, description = "Service and database are healthy", body = HealthResponse),
        (status = 500, description = "Database unavailable", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    sqlx::query("SELECT 1")
        .execute(&state.db)
        .await
        .map_err(|e| Error::StorageUnavailable { reason: e.to_string() })?;

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        database: "ok".to_string(),
    }))
}
