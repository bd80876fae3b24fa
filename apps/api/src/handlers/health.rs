//! Liveness probe that also checks database connectivity.

use axum::Json;
use axum::extract::State;
use rolegrid_core::AppError;
use serde::Serialize;

use crate::dto::ApiResponse;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthData {
    pub status: &'static str,
    pub database: &'static str,
}

pub async fn health(State(state): State<AppState>) -> ApiResult<Json<ApiResponse<HealthData>>> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.pool)
        .await
        .map_err(|error| AppError::Internal(format!("database unreachable: {error}")))?;

    Ok(Json(ApiResponse::ok(
        "service healthy",
        HealthData {
            status: "ok",
            database: "ok",
        },
    )))
}
