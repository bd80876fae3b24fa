//! The role×permission assignment matrix and its reconciliation service.
//!
//! The matrix is a sparse set of `(project, role, permission) -> is_checked`
//! cells with a compound uniqueness constraint. Reads materialize missing
//! cells lazily (unchecked) so the grid self-heals to full rank whenever a
//! role or permission is added; writes upsert per cell and never delete.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use rolegrid_core::{AppError, AppResult};
use rolegrid_domain::{PermissionId, ProjectId, RoleId, UserId};

use crate::registry_service::RegistryRepository;

/// One persisted matrix cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentCellRecord {
    /// Unique cell identifier.
    pub id: uuid::Uuid,
    /// Owning project.
    pub project_id: ProjectId,
    /// Role axis.
    pub role_id: RoleId,
    /// Permission axis.
    pub permission_id: PermissionId,
    /// Granted/ungranted state.
    pub is_checked: bool,
    /// User who first materialized or submitted the cell.
    pub created_by: UserId,
    /// Creation timestamp. Preserved across upserts.
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// Last modification timestamp.
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Repository port for the assignment matrix store.
#[async_trait]
pub trait MatrixRepository: Send + Sync {
    /// Lists cells for a project whose role and permission both still exist
    /// in the registries. Orphaned cells are never served.
    async fn list_cells(&self, project_id: ProjectId) -> AppResult<Vec<AssignmentCellRecord>>;

    /// Inserts an unchecked cell unless the `(project, role, permission)`
    /// triple already exists. A concurrent insert losing the race on the
    /// uniqueness constraint is not an error.
    async fn insert_cell_if_absent(
        &self,
        project_id: ProjectId,
        role_id: RoleId,
        permission_id: PermissionId,
        created_by: UserId,
    ) -> AppResult<()>;

    /// Atomically sets `is_checked` for a cell, inserting it when absent.
    /// Updates preserve `created_at` and `created_by`.
    async fn upsert_cell(
        &self,
        project_id: ProjectId,
        role_id: RoleId,
        permission_id: PermissionId,
        is_checked: bool,
        created_by: UserId,
    ) -> AppResult<()>;
}

/// One cell of the per-role grid returned to clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixCellEntry {
    /// Permission axis.
    pub permission_id: PermissionId,
    /// Resolved permission name.
    pub permission_name: String,
    /// Granted/ungranted state.
    pub is_checked: bool,
}

/// One row of the grid: a role and its permission cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleMatrixEntry {
    /// Role axis.
    pub role_id: RoleId,
    /// Resolved role name.
    pub role_name: String,
    /// Cells in permission registry order.
    pub permissions: Vec<MatrixCellEntry>,
}

/// One submitted cell of a bulk matrix write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixCellSubmission {
    /// Permission axis.
    pub permission_id: PermissionId,
    /// Desired granted/ungranted state.
    pub is_checked: bool,
}

/// One submitted role row of a bulk matrix write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixRoleSubmission {
    /// Role axis.
    pub role_id: RoleId,
    /// Submitted cells. Cells absent here are left untouched.
    pub permissions: Vec<MatrixCellSubmission>,
}

/// Application service reconciling the assignment matrix.
#[derive(Clone)]
pub struct MatrixService {
    registry: Arc<dyn RegistryRepository>,
    matrix: Arc<dyn MatrixRepository>,
}

impl MatrixService {
    /// Creates a matrix service from repository implementations.
    #[must_use]
    pub fn new(registry: Arc<dyn RegistryRepository>, matrix: Arc<dyn MatrixRepository>) -> Self {
        Self { registry, matrix }
    }

    /// Returns the full per-role, per-permission grid for a project,
    /// materializing missing cells as unchecked.
    ///
    /// Idempotent: a second call finds every cell present and creates
    /// nothing. An unknown project yields an empty grid, not an error.
    pub async fn get_matrix(
        &self,
        project_id: ProjectId,
        actor: UserId,
    ) -> AppResult<Vec<RoleMatrixEntry>> {
        let roles = self.registry.list_roles(project_id).await?;
        let permissions = self.registry.list_permissions(project_id).await?;

        // Either axis empty: nothing to materialize.
        if roles.is_empty() || permissions.is_empty() {
            return Ok(Vec::new());
        }

        let cells = self.matrix.list_cells(project_id).await?;
        let mut checked_by_pair: HashMap<(RoleId, PermissionId), bool> = cells
            .into_iter()
            .map(|cell| ((cell.role_id, cell.permission_id), cell.is_checked))
            .collect();

        for role in &roles {
            for permission in &permissions {
                let pair = (role.id, permission.id);
                if !checked_by_pair.contains_key(&pair) {
                    // The uniqueness constraint absorbs the race where a
                    // concurrent read materializes the same pair first.
                    self.matrix
                        .insert_cell_if_absent(project_id, role.id, permission.id, actor)
                        .await?;
                    checked_by_pair.insert(pair, false);
                }
            }
        }

        let grid = roles
            .iter()
            .map(|role| RoleMatrixEntry {
                role_id: role.id,
                role_name: role.name.clone(),
                permissions: permissions
                    .iter()
                    .map(|permission| MatrixCellEntry {
                        permission_id: permission.id,
                        permission_name: permission.name.clone(),
                        is_checked: checked_by_pair
                            .get(&(role.id, permission.id))
                            .copied()
                            .unwrap_or(false),
                    })
                    .collect(),
            })
            .collect();

        Ok(grid)
    }

    /// Reconciles a client-submitted grid into persisted state.
    ///
    /// Upsert-per-cell: existing cells are updated in place (preserving
    /// `created_at`/`created_by`), missing cells are inserted with the
    /// submitted state, and cells absent from the submission are left
    /// untouched. Every submitted role and permission id must belong to the
    /// project; otherwise nothing is persisted.
    pub async fn update_matrix(
        &self,
        project_id: ProjectId,
        submissions: &[MatrixRoleSubmission],
        actor: UserId,
    ) -> AppResult<Vec<RoleMatrixEntry>> {
        let roles = self.registry.list_roles(project_id).await?;
        let permissions = self.registry.list_permissions(project_id).await?;

        let role_names: HashMap<RoleId, &str> = roles
            .iter()
            .map(|role| (role.id, role.name.as_str()))
            .collect();
        let permission_names: HashMap<PermissionId, &str> = permissions
            .iter()
            .map(|permission| (permission.id, permission.name.as_str()))
            .collect();

        // All-or-nothing referential integrity check before any persist.
        for submission in submissions {
            if !role_names.contains_key(&submission.role_id) {
                return Err(AppError::Validation(format!(
                    "role '{}' does not belong to project '{}'",
                    submission.role_id, project_id
                )));
            }

            for cell in &submission.permissions {
                if !permission_names.contains_key(&cell.permission_id) {
                    return Err(AppError::Validation(format!(
                        "permission '{}' does not belong to project '{}'",
                        cell.permission_id, project_id
                    )));
                }
            }
        }

        for submission in submissions {
            for cell in &submission.permissions {
                self.matrix
                    .upsert_cell(
                        project_id,
                        submission.role_id,
                        cell.permission_id,
                        cell.is_checked,
                        actor,
                    )
                    .await?;
            }
        }

        // Echo back the touched cells with resolved names.
        let reconciled = submissions
            .iter()
            .map(|submission| RoleMatrixEntry {
                role_id: submission.role_id,
                role_name: role_names
                    .get(&submission.role_id)
                    .map(|name| (*name).to_owned())
                    .unwrap_or_default(),
                permissions: submission
                    .permissions
                    .iter()
                    .map(|cell| MatrixCellEntry {
                        permission_id: cell.permission_id,
                        permission_name: permission_names
                            .get(&cell.permission_id)
                            .map(|name| (*name).to_owned())
                            .unwrap_or_default(),
                        is_checked: cell.is_checked,
                    })
                    .collect(),
            })
            .collect();

        Ok(reconciled)
    }
}

#[cfg(test)]
mod tests;
