use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use rolegrid_core::AppError;

use crate::error::ApiResult;
use crate::state::AppState;

/// Resolves the `Authorization: Bearer` token to a caller identity and
/// stashes it in request extensions for handlers to pick up.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    let caller = state.session_service.validate_bearer(token).await?;

    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}
