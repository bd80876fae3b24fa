use rolegrid_application::{PermissionRecord, RoleRecord};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryListQuery {
    pub project_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRegistryEntryRequest {
    pub project_id: Uuid,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct RenameRegistryEntryRequest {
    pub name: String,
}

/// One role or permission registry entry on the wire.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryEntryResponse {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<RoleRecord> for RegistryEntryResponse {
    fn from(role: RoleRecord) -> Self {
        Self {
            id: role.id.as_uuid(),
            project_id: role.project_id.as_uuid(),
            name: role.name,
            created_at: role.created_at,
            updated_at: role.updated_at,
        }
    }
}

impl From<PermissionRecord> for RegistryEntryResponse {
    fn from(permission: PermissionRecord) -> Self {
        Self {
            id: permission.id.as_uuid(),
            project_id: permission.project_id.as_uuid(),
            name: permission.name,
            created_at: permission.created_at,
            updated_at: permission.updated_at,
        }
    }
}
