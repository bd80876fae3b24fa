use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use rolegrid_core::{AppError, AppResult};
use rolegrid_domain::{PermissionId, ProjectId, RoleId, UserId};

use crate::registry_service::{PermissionRecord, RegistryRepository, RoleRecord};

use super::{
    AssignmentCellRecord, MatrixCellSubmission, MatrixRepository, MatrixRoleSubmission,
    MatrixService,
};

/// In-memory store backing both the registry and matrix ports, enforcing
/// the `(project, role, permission)` uniqueness constraint the way the
/// database index does.
#[derive(Default)]
struct FakeStore {
    roles: Mutex<Vec<RoleRecord>>,
    permissions: Mutex<Vec<PermissionRecord>>,
    cells: Mutex<Vec<AssignmentCellRecord>>,
}

impl FakeStore {
    async fn add_role(&self, project_id: ProjectId, name: &str) -> RoleId {
        let record = RoleRecord {
            id: RoleId::new(),
            project_id,
            name: name.to_owned(),
            created_by: UserId::new(),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        let id = record.id;
        self.roles.lock().await.push(record);
        id
    }

    async fn add_permission(&self, project_id: ProjectId, name: &str) -> PermissionId {
        let record = PermissionRecord {
            id: PermissionId::new(),
            project_id,
            name: name.to_owned(),
            created_by: UserId::new(),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        let id = record.id;
        self.permissions.lock().await.push(record);
        id
    }

    async fn stored_cells(&self) -> Vec<AssignmentCellRecord> {
        self.cells.lock().await.clone()
    }
}

#[async_trait]
impl RegistryRepository for FakeStore {
    async fn create_role(
        &self,
        project_id: ProjectId,
        name: &str,
        created_by: UserId,
    ) -> AppResult<RoleRecord> {
        let record = RoleRecord {
            id: RoleId::new(),
            project_id,
            name: name.to_owned(),
            created_by,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        self.roles.lock().await.push(record.clone());
        Ok(record)
    }

    async fn list_roles(&self, project_id: ProjectId) -> AppResult<Vec<RoleRecord>> {
        Ok(self
            .roles
            .lock()
            .await
            .iter()
            .filter(|role| role.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn rename_role(&self, role_id: RoleId, name: &str) -> AppResult<RoleRecord> {
        let mut roles = self.roles.lock().await;
        let role = roles
            .iter_mut()
            .find(|role| role.id == role_id)
            .ok_or_else(|| AppError::not_found("ROLE_NOT_FOUND", "role not found"))?;
        role.name = name.to_owned();
        Ok(role.clone())
    }

    async fn delete_role(&self, role_id: RoleId) -> AppResult<()> {
        self.roles.lock().await.retain(|role| role.id != role_id);
        Ok(())
    }

    async fn create_permission(
        &self,
        project_id: ProjectId,
        name: &str,
        created_by: UserId,
    ) -> AppResult<PermissionRecord> {
        let record = PermissionRecord {
            id: PermissionId::new(),
            project_id,
            name: name.to_owned(),
            created_by,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        self.permissions.lock().await.push(record.clone());
        Ok(record)
    }

    async fn list_permissions(&self, project_id: ProjectId) -> AppResult<Vec<PermissionRecord>> {
        Ok(self
            .permissions
            .lock()
            .await
            .iter()
            .filter(|permission| permission.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn rename_permission(
        &self,
        permission_id: PermissionId,
        name: &str,
    ) -> AppResult<PermissionRecord> {
        let mut permissions = self.permissions.lock().await;
        let permission = permissions
            .iter_mut()
            .find(|permission| permission.id == permission_id)
            .ok_or_else(|| AppError::not_found("PERMISSION_NOT_FOUND", "permission not found"))?;
        permission.name = name.to_owned();
        Ok(permission.clone())
    }

    async fn delete_permission(&self, permission_id: PermissionId) -> AppResult<()> {
        self.permissions
            .lock()
            .await
            .retain(|permission| permission.id != permission_id);
        Ok(())
    }
}

#[async_trait]
impl MatrixRepository for FakeStore {
    async fn list_cells(&self, project_id: ProjectId) -> AppResult<Vec<AssignmentCellRecord>> {
        let roles = self.roles.lock().await;
        let permissions = self.permissions.lock().await;
        Ok(self
            .cells
            .lock()
            .await
            .iter()
            .filter(|cell| {
                cell.project_id == project_id
                    && roles.iter().any(|role| role.id == cell.role_id)
                    && permissions
                        .iter()
                        .any(|permission| permission.id == cell.permission_id)
            })
            .cloned()
            .collect())
    }

    async fn insert_cell_if_absent(
        &self,
        project_id: ProjectId,
        role_id: RoleId,
        permission_id: PermissionId,
        created_by: UserId,
    ) -> AppResult<()> {
        let mut cells = self.cells.lock().await;
        let exists = cells.iter().any(|cell| {
            cell.project_id == project_id
                && cell.role_id == role_id
                && cell.permission_id == permission_id
        });
        if !exists {
            cells.push(AssignmentCellRecord {
                id: uuid::Uuid::new_v4(),
                project_id,
                role_id,
                permission_id,
                is_checked: false,
                created_by,
                created_at: chrono::Utc::now(),
                updated_at: chrono::Utc::now(),
            });
        }
        Ok(())
    }

    async fn upsert_cell(
        &self,
        project_id: ProjectId,
        role_id: RoleId,
        permission_id: PermissionId,
        is_checked: bool,
        created_by: UserId,
    ) -> AppResult<()> {
        let mut cells = self.cells.lock().await;
        if let Some(cell) = cells.iter_mut().find(|cell| {
            cell.project_id == project_id
                && cell.role_id == role_id
                && cell.permission_id == permission_id
        }) {
            cell.is_checked = is_checked;
            cell.updated_at = chrono::Utc::now();
        } else {
            cells.push(AssignmentCellRecord {
                id: uuid::Uuid::new_v4(),
                project_id,
                role_id,
                permission_id,
                is_checked,
                created_by,
                created_at: chrono::Utc::now(),
                updated_at: chrono::Utc::now(),
            });
        }
        Ok(())
    }
}

fn service(store: &Arc<FakeStore>) -> MatrixService {
    MatrixService::new(store.clone(), store.clone())
}

fn submission(role_id: RoleId, cells: &[(PermissionId, bool)]) -> MatrixRoleSubmission {
    MatrixRoleSubmission {
        role_id,
        permissions: cells
            .iter()
            .map(|(permission_id, is_checked)| MatrixCellSubmission {
                permission_id: *permission_id,
                is_checked: *is_checked,
            })
            .collect(),
    }
}

#[tokio::test]
async fn materialization_is_idempotent() -> AppResult<()> {
    let store = Arc::new(FakeStore::default());
    let project_id = ProjectId::new();
    store.add_role(project_id, "admin").await;
    store.add_role(project_id, "viewer").await;
    store.add_permission(project_id, "read").await;
    store.add_permission(project_id, "write").await;

    let service = service(&store);
    let actor = UserId::new();

    let first = service.get_matrix(project_id, actor).await?;
    assert_eq!(store.stored_cells().await.len(), 4);

    let second = service.get_matrix(project_id, actor).await?;
    assert_eq!(store.stored_cells().await.len(), 4);
    assert_eq!(first, second);
    Ok(())
}

#[tokio::test]
async fn no_two_cells_share_a_triple() -> AppResult<()> {
    let store = Arc::new(FakeStore::default());
    let project_id = ProjectId::new();
    let role = store.add_role(project_id, "admin").await;
    let permission = store.add_permission(project_id, "read").await;

    let service = service(&store);
    let actor = UserId::new();

    service.get_matrix(project_id, actor).await?;
    service
        .update_matrix(project_id, &[submission(role, &[(permission, true)])], actor)
        .await?;
    service.get_matrix(project_id, actor).await?;

    let cells = store.stored_cells().await;
    for cell in &cells {
        let duplicates = cells
            .iter()
            .filter(|other| {
                other.project_id == cell.project_id
                    && other.role_id == cell.role_id
                    && other.permission_id == cell.permission_id
            })
            .count();
        assert_eq!(duplicates, 1);
    }
    Ok(())
}

#[tokio::test]
async fn empty_registries_return_empty_grid_without_materializing() -> AppResult<()> {
    let store = Arc::new(FakeStore::default());
    let project_id = ProjectId::new();
    store.add_role(project_id, "admin").await;
    // No permissions registered.

    let service = service(&store);
    let grid = service.get_matrix(project_id, UserId::new()).await?;

    assert!(grid.is_empty());
    assert!(store.stored_cells().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn two_by_two_scenario_materializes_four_unchecked_cells() -> AppResult<()> {
    let store = Arc::new(FakeStore::default());
    let project_id = ProjectId::new();
    let admin = store.add_role(project_id, "admin").await;
    let viewer = store.add_role(project_id, "viewer").await;
    store.add_permission(project_id, "read").await;
    store.add_permission(project_id, "write").await;

    let service = service(&store);
    let grid = service.get_matrix(project_id, UserId::new()).await?;

    assert_eq!(grid.len(), 2);
    assert_eq!(grid[0].role_id, admin);
    assert_eq!(grid[0].role_name, "admin");
    assert_eq!(grid[1].role_id, viewer);
    for row in &grid {
        assert_eq!(row.permissions.len(), 2);
        assert_eq!(row.permissions[0].permission_name, "read");
        assert_eq!(row.permissions[1].permission_name, "write");
        assert!(row.permissions.iter().all(|cell| !cell.is_checked));
    }
    assert_eq!(store.stored_cells().await.len(), 4);
    Ok(())
}

#[tokio::test]
async fn single_cell_submission_flips_only_that_cell() -> AppResult<()> {
    let store = Arc::new(FakeStore::default());
    let project_id = ProjectId::new();
    let admin = store.add_role(project_id, "admin").await;
    let viewer = store.add_role(project_id, "viewer").await;
    let read = store.add_permission(project_id, "read").await;
    let write = store.add_permission(project_id, "write").await;

    let service = service(&store);
    let actor = UserId::new();
    service.get_matrix(project_id, actor).await?;

    service
        .update_matrix(project_id, &[submission(admin, &[(write, true)])], actor)
        .await?;

    let grid = service.get_matrix(project_id, actor).await?;
    for row in &grid {
        for cell in &row.permissions {
            let expected = row.role_id == admin && cell.permission_id == write;
            assert_eq!(cell.is_checked, expected);
        }
    }

    let _ = (viewer, read);
    Ok(())
}

#[tokio::test]
async fn partial_update_leaves_other_roles_untouched() -> AppResult<()> {
    let store = Arc::new(FakeStore::default());
    let project_id = ProjectId::new();
    let admin = store.add_role(project_id, "admin").await;
    let viewer = store.add_role(project_id, "viewer").await;
    let read = store.add_permission(project_id, "read").await;
    let write = store.add_permission(project_id, "write").await;

    let service = service(&store);
    let actor = UserId::new();
    service.get_matrix(project_id, actor).await?;

    let viewer_cells_before: Vec<_> = store
        .stored_cells()
        .await
        .into_iter()
        .filter(|cell| cell.role_id == viewer)
        .collect();

    service
        .update_matrix(
            project_id,
            &[submission(admin, &[(read, true), (write, true)])],
            actor,
        )
        .await?;

    let viewer_cells_after: Vec<_> = store
        .stored_cells()
        .await
        .into_iter()
        .filter(|cell| cell.role_id == viewer)
        .collect();

    assert_eq!(viewer_cells_before, viewer_cells_after);
    Ok(())
}

#[tokio::test]
async fn upsert_creates_missing_and_updates_in_place() -> AppResult<()> {
    let store = Arc::new(FakeStore::default());
    let project_id = ProjectId::new();
    let admin = store.add_role(project_id, "admin").await;
    let read = store.add_permission(project_id, "read").await;

    let service = service(&store);
    let actor = UserId::new();

    // No materialization yet: the submission inserts the cell.
    service
        .update_matrix(project_id, &[submission(admin, &[(read, true)])], actor)
        .await?;

    let cells = store.stored_cells().await;
    assert_eq!(cells.len(), 1);
    assert!(cells[0].is_checked);
    let original_created_at = cells[0].created_at;
    let original_id = cells[0].id;

    service
        .update_matrix(project_id, &[submission(admin, &[(read, false)])], actor)
        .await?;

    let cells = store.stored_cells().await;
    assert_eq!(cells.len(), 1);
    assert!(!cells[0].is_checked);
    assert_eq!(cells[0].created_at, original_created_at);
    assert_eq!(cells[0].id, original_id);
    Ok(())
}

#[tokio::test]
async fn resubmitting_an_unchanged_grid_is_a_noop() -> AppResult<()> {
    let store = Arc::new(FakeStore::default());
    let project_id = ProjectId::new();
    let admin = store.add_role(project_id, "admin").await;
    let read = store.add_permission(project_id, "read").await;
    let write = store.add_permission(project_id, "write").await;

    let service = service(&store);
    let actor = UserId::new();

    service
        .update_matrix(project_id, &[submission(admin, &[(write, true)])], actor)
        .await?;
    let grid = service.get_matrix(project_id, actor).await?;
    let before = store.stored_cells().await;

    let resubmission: Vec<_> = grid
        .iter()
        .map(|row| MatrixRoleSubmission {
            role_id: row.role_id,
            permissions: row
                .permissions
                .iter()
                .map(|cell| MatrixCellSubmission {
                    permission_id: cell.permission_id,
                    is_checked: cell.is_checked,
                })
                .collect(),
        })
        .collect();

    service
        .update_matrix(project_id, &resubmission, actor)
        .await?;

    let after = store.stored_cells().await;
    assert_eq!(before.len(), after.len());
    for (previous, current) in before.iter().zip(after.iter()) {
        assert_eq!(previous.id, current.id);
        assert_eq!(previous.is_checked, current.is_checked);
        assert_eq!(previous.created_at, current.created_at);
    }

    let _ = read;
    Ok(())
}

#[tokio::test]
async fn foreign_ids_are_rejected_before_any_persist() -> AppResult<()> {
    let store = Arc::new(FakeStore::default());
    let project_id = ProjectId::new();
    let admin = store.add_role(project_id, "admin").await;
    let read = store.add_permission(project_id, "read").await;

    let other_project = ProjectId::new();
    let foreign_permission = store.add_permission(other_project, "deploy").await;

    let service = service(&store);
    let actor = UserId::new();

    let result = service
        .update_matrix(
            project_id,
            &[submission(admin, &[(read, true), (foreign_permission, true)])],
            actor,
        )
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    // All-or-nothing: the valid half of the batch was not persisted either.
    assert!(store.stored_cells().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn concurrent_materialization_persists_exactly_one_cell() -> AppResult<()> {
    let store = Arc::new(FakeStore::default());
    let project_id = ProjectId::new();
    store.add_role(project_id, "admin").await;
    store.add_permission(project_id, "read").await;

    let service = service(&store);
    let actor = UserId::new();

    let (first, second) = tokio::join!(
        service.get_matrix(project_id, actor),
        service.get_matrix(project_id, actor),
    );

    assert!(first.is_ok());
    assert!(second.is_ok());
    assert_eq!(store.stored_cells().await.len(), 1);
    Ok(())
}

#[tokio::test]
async fn deleted_permission_cells_are_not_served() -> AppResult<()> {
    let store = Arc::new(FakeStore::default());
    let project_id = ProjectId::new();
    store.add_role(project_id, "admin").await;
    let read = store.add_permission(project_id, "read").await;
    let write = store.add_permission(project_id, "write").await;

    let service = service(&store);
    let actor = UserId::new();
    service.get_matrix(project_id, actor).await?;

    RegistryRepository::delete_permission(store.as_ref(), write).await?;

    let grid = service.get_matrix(project_id, actor).await?;
    assert_eq!(grid.len(), 1);
    assert_eq!(grid[0].permissions.len(), 1);
    assert_eq!(grid[0].permissions[0].permission_id, read);
    Ok(())
}
