//! Role and permission registry endpoints.
//!
//! Creation and listing are checked against project ownership; rename and
//! delete address entries by their own id.

use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use rolegrid_core::CallerIdentity;
use rolegrid_domain::{PermissionId, ProjectId, RoleId, UserId};

use crate::dto::{
    ApiResponse, CreateRegistryEntryRequest, RegistryEntryResponse, RegistryListQuery,
    RenameRegistryEntryRequest,
};
use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::state::AppState;

pub async fn create_role(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    ApiJson(request): ApiJson<CreateRegistryEntryRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<RegistryEntryResponse>>)> {
    let caller = UserId::from_uuid(caller.user_id());
    let project_id = ProjectId::from_uuid(request.project_id);
    state.project_service.get_project(project_id, caller).await?;

    let role = state
        .registry_service
        .create_role(project_id, &request.name, caller)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("role created", RegistryEntryResponse::from(role))),
    ))
}

pub async fn list_roles(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Query(query): Query<RegistryListQuery>,
) -> ApiResult<Json<ApiResponse<Vec<RegistryEntryResponse>>>> {
    let caller = UserId::from_uuid(caller.user_id());
    let project_id = ProjectId::from_uuid(query.project_id);
    state.project_service.get_project(project_id, caller).await?;

    let roles = state.registry_service.list_roles(project_id).await?;
    Ok(Json(ApiResponse::ok(
        "roles listed",
        roles.into_iter().map(RegistryEntryResponse::from).collect(),
    )))
}

pub async fn rename_role(
    State(state): State<AppState>,
    Path(role_id): Path<Uuid>,
    ApiJson(request): ApiJson<RenameRegistryEntryRequest>,
) -> ApiResult<Json<ApiResponse<RegistryEntryResponse>>> {
    let role = state
        .registry_service
        .rename_role(RoleId::from_uuid(role_id), &request.name)
        .await?;

    Ok(Json(ApiResponse::ok(
        "role renamed",
        RegistryEntryResponse::from(role),
    )))
}

pub async fn delete_role(
    State(state): State<AppState>,
    Path(role_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<()>>> {
    state
        .registry_service
        .delete_role(RoleId::from_uuid(role_id))
        .await?;

    Ok(Json(ApiResponse::message("role deleted")))
}

pub async fn create_permission(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    ApiJson(request): ApiJson<CreateRegistryEntryRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<RegistryEntryResponse>>)> {
    let caller = UserId::from_uuid(caller.user_id());
    let project_id = ProjectId::from_uuid(request.project_id);
    state.project_service.get_project(project_id, caller).await?;

    let permission = state
        .registry_service
        .create_permission(project_id, &request.name, caller)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            "permission created",
            RegistryEntryResponse::from(permission),
        )),
    ))
}

pub async fn list_permissions(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Query(query): Query<RegistryListQuery>,
) -> ApiResult<Json<ApiResponse<Vec<RegistryEntryResponse>>>> {
    let caller = UserId::from_uuid(caller.user_id());
    let project_id = ProjectId::from_uuid(query.project_id);
    state.project_service.get_project(project_id, caller).await?;

    let permissions = state.registry_service.list_permissions(project_id).await?;
    Ok(Json(ApiResponse::ok(
        "permissions listed",
        permissions
            .into_iter()
            .map(RegistryEntryResponse::from)
            .collect(),
    )))
}

pub async fn rename_permission(
    State(state): State<AppState>,
    Path(permission_id): Path<Uuid>,
    ApiJson(request): ApiJson<RenameRegistryEntryRequest>,
) -> ApiResult<Json<ApiResponse<RegistryEntryResponse>>> {
    let permission = state
        .registry_service
        .rename_permission(PermissionId::from_uuid(permission_id), &request.name)
        .await?;

    Ok(Json(ApiResponse::ok(
        "permission renamed",
        RegistryEntryResponse::from(permission),
    )))
}

pub async fn delete_permission(
    State(state): State<AppState>,
    Path(permission_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<()>>> {
    state
        .registry_service
        .delete_permission(PermissionId::from_uuid(permission_id))
        .await?;

    Ok(Json(ApiResponse::message("permission deleted")))
}
