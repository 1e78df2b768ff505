//! Status probe payloads.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Liveness payload for `GET /`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    pub status: String,
}

/// Readiness payload for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
}
