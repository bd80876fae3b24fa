//! Assignment matrix endpoints: grid read (with lazy materialization) and
//! bulk reconciliation.

use std::collections::BTreeMap;

use axum::extract::{Extension, Path, State};
use axum::Json;
use uuid::Uuid;

use rolegrid_application::MatrixRoleSubmission;
use rolegrid_core::{AppError, CallerIdentity};
use rolegrid_domain::{ProjectId, UserId};

use crate::dto::{ApiResponse, MatrixData, RolePermissionResponse, RoleSubmissionRequest};
use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::state::AppState;

pub async fn get_matrix(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<MatrixData>>> {
    let grid = state
        .matrix_service
        .get_matrix(
            ProjectId::from_uuid(project_id),
            UserId::from_uuid(caller.user_id()),
        )
        .await?;

    Ok(Json(ApiResponse::ok(
        "permission matrix",
        MatrixData {
            permissions: grid.into_iter().map(RolePermissionResponse::from).collect(),
        },
    )))
}

pub async fn update_matrix(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(project_id): Path<Uuid>,
    ApiJson(body): ApiJson<serde_json::Value>,
) -> ApiResult<Json<ApiResponse<MatrixData>>> {
    // A non-array payload gets a field-level error naming the expected
    // shape instead of a bare deserialization message.
    if !body.is_array() {
        let mut fields = BTreeMap::new();
        fields.insert(
            "permissions".to_owned(),
            "expected an array of role submissions".to_owned(),
        );
        return Err(AppError::ValidationFields {
            message: "invalid matrix payload".to_owned(),
            fields,
        }
        .into());
    }

    let submissions: Vec<RoleSubmissionRequest> = serde_json::from_value(body)
        .map_err(|error| AppError::Validation(format!("invalid matrix payload: {error}")))?;
    let submissions: Vec<MatrixRoleSubmission> =
        submissions.into_iter().map(Into::into).collect();

    let grid = state
        .matrix_service
        .update_matrix(
            ProjectId::from_uuid(project_id),
            &submissions,
            UserId::from_uuid(caller.user_id()),
        )
        .await?;

    Ok(Json(ApiResponse::ok(
        "permission matrix updated",
        MatrixData {
            permissions: grid.into_iter().map(RolePermissionResponse::from).collect(),
        },
    )))
}
