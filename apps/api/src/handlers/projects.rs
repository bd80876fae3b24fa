//! Owner-scoped project CRUD endpoints.

use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use rolegrid_application::UpdateProjectInput;
use rolegrid_core::CallerIdentity;
use rolegrid_domain::{ProjectId, UserId};

use crate::dto::{ApiResponse, CreateProjectRequest, ProjectResponse, UpdateProjectRequest};
use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::state::AppState;

pub async fn create_project(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    ApiJson(request): ApiJson<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<ProjectResponse>>)> {
    let project = state
        .project_service
        .create_project(
            &request.name,
            &request.slug,
            request.description,
            UserId::from_uuid(caller.user_id()),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            "project created",
            ProjectResponse::from(project),
        )),
    ))
}

pub async fn list_projects(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
) -> ApiResult<Json<ApiResponse<Vec<ProjectResponse>>>> {
    let projects = state
        .project_service
        .list_projects(UserId::from_uuid(caller.user_id()))
        .await?;

    Ok(Json(ApiResponse::ok(
        "projects listed",
        projects.into_iter().map(ProjectResponse::from).collect(),
    )))
}

pub async fn get_project(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<ProjectResponse>>> {
    let project = state
        .project_service
        .get_project(
            ProjectId::from_uuid(project_id),
            UserId::from_uuid(caller.user_id()),
        )
        .await?;

    Ok(Json(ApiResponse::ok(
        "project found",
        ProjectResponse::from(project),
    )))
}

pub async fn update_project(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(project_id): Path<Uuid>,
    ApiJson(request): ApiJson<UpdateProjectRequest>,
) -> ApiResult<Json<ApiResponse<ProjectResponse>>> {
    // An absent description leaves the stored one alone; clearing it is
    // not offered over the wire.
    let input = UpdateProjectInput {
        name: request.name,
        slug: request.slug,
        description: request.description.map(Some),
    };

    let project = state
        .project_service
        .update_project(
            ProjectId::from_uuid(project_id),
            input,
            UserId::from_uuid(caller.user_id()),
        )
        .await?;

    Ok(Json(ApiResponse::ok(
        "project updated",
        ProjectResponse::from(project),
    )))
}

pub async fn delete_project(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<()>>> {
    state
        .project_service
        .delete_project(
            ProjectId::from_uuid(project_id),
            UserId::from_uuid(caller.user_id()),
        )
        .await?;

    Ok(Json(ApiResponse::message("project deleted")))
}
