//! PostgreSQL-backed assignment matrix repository.
//!
//! The `assignment_cells` table carries a unique index over
//! `(project_id, role_id, permission_id)`; both write paths lean on it with
//! `ON CONFLICT` so concurrent materialization and updates stay race-free.

use async_trait::async_trait;
use sqlx::PgPool;

use rolegrid_application::{AssignmentCellRecord, MatrixRepository};
use rolegrid_core::{AppError, AppResult};
use rolegrid_domain::{PermissionId, ProjectId, RoleId, UserId};

/// PostgreSQL implementation of the matrix repository port.
#[derive(Clone)]
pub struct PostgresMatrixRepository {
    pool: PgPool,
}

impl PostgresMatrixRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CellRow {
    id: uuid::Uuid,
    project_id: uuid::Uuid,
    role_id: uuid::Uuid,
    permission_id: uuid::Uuid,
    is_checked: bool,
    created_by: uuid::Uuid,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<CellRow> for AssignmentCellRecord {
    fn from(row: CellRow) -> Self {
        Self {
            id: row.id,
            project_id: ProjectId::from_uuid(row.project_id),
            role_id: RoleId::from_uuid(row.role_id),
            permission_id: PermissionId::from_uuid(row.permission_id),
            is_checked: row.is_checked,
            created_by: UserId::from_uuid(row.created_by),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl MatrixRepository for PostgresMatrixRepository {
    async fn list_cells(&self, project_id: ProjectId) -> AppResult<Vec<AssignmentCellRecord>> {
        // Join to the live registries so cells orphaned by a registry
        // delete are never served.
        let rows = sqlx::query_as::<_, CellRow>(
            r#"
            SELECT c.id, c.project_id, c.role_id, c.permission_id,
                   c.is_checked, c.created_by, c.created_at, c.updated_at
            FROM assignment_cells c
            INNER JOIN project_roles r ON r.id = c.role_id
            INNER JOIN project_permissions p ON p.id = c.permission_id
            WHERE c.project_id = $1
            "#,
        )
        .bind(project_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list matrix cells: {error}")))?;

        Ok(rows.into_iter().map(AssignmentCellRecord::from).collect())
    }

    async fn insert_cell_if_absent(
        &self,
        project_id: ProjectId,
        role_id: RoleId,
        permission_id: PermissionId,
        created_by: UserId,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO assignment_cells (project_id, role_id, permission_id, is_checked, created_by)
            VALUES ($1, $2, $3, FALSE, $4)
            ON CONFLICT (project_id, role_id, permission_id) DO NOTHING
            "#,
        )
        .bind(project_id.as_uuid())
        .bind(role_id.as_uuid())
        .bind(permission_id.as_uuid())
        .bind(created_by.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to materialize matrix cell: {error}"))
        })?;

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
        sqlx::query(
            r#"
            INSERT INTO assignment_cells (project_id, role_id, permission_id, is_checked, created_by)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (project_id, role_id, permission_id)
            DO UPDATE SET is_checked = EXCLUDED.is_checked, updated_at = now()
            "#,
        )
        .bind(project_id.as_uuid())
        .bind(role_id.as_uuid())
        .bind(permission_id.as_uuid())
        .bind(is_checked)
        .bind(created_by.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to upsert matrix cell: {error}")))?;

        Ok(())
    }
}
