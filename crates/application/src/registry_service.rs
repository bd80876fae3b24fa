//! Role and permission registry ports and application service.
//!
//! Roles and permissions are per-project named entries with a uniqueness
//! constraint on `(project_id, name)`. Registry deletes do not cascade into
//! the assignment matrix; the matrix read path only serves cells for
//! currently-registered entries.

use std::sync::Arc;

use async_trait::async_trait;

use rolegrid_core::AppResult;
use rolegrid_domain::{PermissionId, ProjectId, RoleId, UserId, validate_registry_name};

/// Role record returned by repository queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRecord {
    /// Unique identifier.
    pub id: RoleId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Role name, unique within the project.
    pub name: String,
    /// User who created the role.
    pub created_by: UserId,
    /// Creation timestamp.
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// Last modification timestamp.
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Permission record returned by repository queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionRecord {
    /// Unique identifier.
    pub id: PermissionId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Permission name, unique within the project.
    pub name: String,
    /// User who created the permission.
    pub created_by: UserId,
    /// Creation timestamp.
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// Last modification timestamp.
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Repository port for both registries.
///
/// `create_*` fails with a `Duplicate` error when `(project_id, name)`
/// already exists; `rename_*`/`delete_*` fail with `NotFound` for unknown
/// ids. Listings are in creation order.
#[async_trait]
pub trait RegistryRepository: Send + Sync {
    /// Creates a role in a project.
    async fn create_role(
        &self,
        project_id: ProjectId,
        name: &str,
        created_by: UserId,
    ) -> AppResult<RoleRecord>;

    /// Lists the roles of a project in creation order.
    async fn list_roles(&self, project_id: ProjectId) -> AppResult<Vec<RoleRecord>>;

    /// Renames a role.
    async fn rename_role(&self, role_id: RoleId, name: &str) -> AppResult<RoleRecord>;

    /// Deletes a role. Does not touch assignment cells.
    async fn delete_role(&self, role_id: RoleId) -> AppResult<()>;

    /// Creates a permission in a project.
    async fn create_permission(
        &self,
        project_id: ProjectId,
        name: &str,
        created_by: UserId,
    ) -> AppResult<PermissionRecord>;

    /// Lists the permissions of a project in creation order.
    async fn list_permissions(&self, project_id: ProjectId) -> AppResult<Vec<PermissionRecord>>;

    /// Renames a permission.
    async fn rename_permission(
        &self,
        permission_id: PermissionId,
        name: &str,
    ) -> AppResult<PermissionRecord>;

    /// Deletes a permission. Does not touch assignment cells.
    async fn delete_permission(&self, permission_id: PermissionId) -> AppResult<()>;
}

/// Application service for the role and permission registries.
#[derive(Clone)]
pub struct RegistryService {
    repository: Arc<dyn RegistryRepository>,
}

impl RegistryService {
    /// Creates a registry service from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn RegistryRepository>) -> Self {
        Self { repository }
    }

    /// Creates a role in a project.
    pub async fn create_role(
        &self,
        project_id: ProjectId,
        name: &str,
        created_by: UserId,
    ) -> AppResult<RoleRecord> {
        validate_registry_name(name)?;
        self.repository
            .create_role(project_id, name.trim(), created_by)
            .await
    }

    /// Lists the roles of a project.
    pub async fn list_roles(&self, project_id: ProjectId) -> AppResult<Vec<RoleRecord>> {
        self.repository.list_roles(project_id).await
    }

    /// Renames a role.
    pub async fn rename_role(&self, role_id: RoleId, name: &str) -> AppResult<RoleRecord> {
        validate_registry_name(name)?;
        self.repository.rename_role(role_id, name.trim()).await
    }

    /// Deletes a role.
    pub async fn delete_role(&self, role_id: RoleId) -> AppResult<()> {
        self.repository.delete_role(role_id).await
    }

    /// Creates a permission in a project.
    pub async fn create_permission(
        &self,
        project_id: ProjectId,
        name: &str,
        created_by: UserId,
    ) -> AppResult<PermissionRecord> {
        validate_registry_name(name)?;
        self.repository
            .create_permission(project_id, name.trim(), created_by)
            .await
    }

    /// Lists the permissions of a project.
    pub async fn list_permissions(&self, project_id: ProjectId) -> AppResult<Vec<PermissionRecord>> {
        self.repository.list_permissions(project_id).await
    }

    /// Renames a permission.
    pub async fn rename_permission(
        &self,
        permission_id: PermissionId,
        name: &str,
    ) -> AppResult<PermissionRecord> {
        validate_registry_name(name)?;
        self.repository
            .rename_permission(permission_id, name.trim())
            .await
    }

    /// Deletes a permission.
    pub async fn delete_permission(&self, permission_id: PermissionId) -> AppResult<()> {
        self.repository.delete_permission(permission_id).await
    }
}
