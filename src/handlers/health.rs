use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db;
use crate::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
}

/// GET /health — liveness plus a database ping.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service health", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match db::check_connection(&state.db).await {
        Ok(()) => "up".to_string(),
        Err(_) => "down".to_string(),
    };
    Json(HealthResponse {
        status: "ok".to_string(),
        database,
    })
}
