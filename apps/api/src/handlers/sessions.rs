//! Session management endpoints for the authenticated caller.

use axum::extract::{Extension, Path, State};
use axum::Json;
use uuid::Uuid;

use rolegrid_core::CallerIdentity;
use rolegrid_domain::{SessionId, UserId};

use crate::dto::{ApiResponse, SessionResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_sessions(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
) -> ApiResult<Json<ApiResponse<Vec<SessionResponse>>>> {
    let sessions = state
        .session_service
        .list_sessions(UserId::from_uuid(caller.user_id()))
        .await?;

    Ok(Json(ApiResponse::ok(
        "sessions listed",
        sessions
            .into_iter()
            .map(|session| SessionResponse::from_record(session, caller.session_id()))
            .collect(),
    )))
}

pub async fn revoke_session(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<()>>> {
    state
        .session_service
        .revoke_session(
            SessionId::from_uuid(session_id),
            UserId::from_uuid(caller.user_id()),
        )
        .await?;

    Ok(Json(ApiResponse::message("session revoked")))
}

pub async fn revoke_other_sessions(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let revoked = state
        .session_service
        .revoke_other_sessions(
            UserId::from_uuid(caller.user_id()),
            SessionId::from_uuid(caller.session_id()),
        )
        .await?;

    Ok(Json(ApiResponse::message(format!(
        "revoked {revoked} other session(s)"
    ))))
}

pub async fn deactivate_session(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<()>>> {
    state
        .session_service
        .deactivate_session(
            SessionId::from_uuid(session_id),
            UserId::from_uuid(caller.user_id()),
        )
        .await?;

    Ok(Json(ApiResponse::message("session deactivated")))
}
