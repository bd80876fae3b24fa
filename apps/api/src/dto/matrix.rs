use rolegrid_application::{
    MatrixCellEntry, MatrixCellSubmission, MatrixRoleSubmission, RoleMatrixEntry,
};
use rolegrid_domain::{PermissionId, RoleId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionCellResponse {
    pub permission_id: Uuid,
    pub permission_name: String,
    pub is_checked: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RolePermissionResponse {
    pub role_id: Uuid,
    pub role_name: String,
    pub permissions: Vec<PermissionCellResponse>,
}

impl From<RoleMatrixEntry> for RolePermissionResponse {
    fn from(entry: RoleMatrixEntry) -> Self {
        Self {
            role_id: entry.role_id.as_uuid(),
            role_name: entry.role_name,
            permissions: entry
                .permissions
                .into_iter()
                .map(|cell: MatrixCellEntry| PermissionCellResponse {
                    permission_id: cell.permission_id.as_uuid(),
                    permission_name: cell.permission_name,
                    is_checked: cell.is_checked,
                })
                .collect(),
        }
    }
}

/// The grid wrapper returned by matrix reads and writes.
#[derive(Debug, Serialize)]
pub struct MatrixData {
    pub permissions: Vec<RolePermissionResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedCellRequest {
    pub permission_id: Uuid,
    pub is_checked: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleSubmissionRequest {
    pub role_id: Uuid,
    pub permissions: Vec<SubmittedCellRequest>,
}

impl From<RoleSubmissionRequest> for MatrixRoleSubmission {
    fn from(submission: RoleSubmissionRequest) -> Self {
        Self {
            role_id: RoleId::from_uuid(submission.role_id),
            permissions: submission
                .permissions
                .into_iter()
                .map(|cell| MatrixCellSubmission {
                    permission_id: PermissionId::from_uuid(cell.permission_id),
                    is_checked: cell.is_checked,
                })
                .collect(),
        }
    }
}
