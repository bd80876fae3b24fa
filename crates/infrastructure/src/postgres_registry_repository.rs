//! PostgreSQL-backed role and permission registry repository.

use async_trait::async_trait;
use sqlx::PgPool;

use rolegrid_application::{PermissionRecord, RegistryRepository, RoleRecord};
use rolegrid_core::{AppError, AppResult};
use rolegrid_domain::{PermissionId, ProjectId, RoleId, UserId};

/// PostgreSQL implementation of the registry repository port.
#[derive(Clone)]
pub struct PostgresRegistryRepository {
    pool: PgPool,
}

impl PostgresRegistryRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RegistryRow {
    id: uuid::Uuid,
    project_id: uuid::Uuid,
    name: String,
    created_by: uuid::Uuid,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<RegistryRow> for RoleRecord {
    fn from(row: RegistryRow) -> Self {
        Self {
            id: RoleId::from_uuid(row.id),
            project_id: ProjectId::from_uuid(row.project_id),
            name: row.name,
            created_by: UserId::from_uuid(row.created_by),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<RegistryRow> for PermissionRecord {
    fn from(row: RegistryRow) -> Self {
        Self {
            id: PermissionId::from_uuid(row.id),
            project_id: ProjectId::from_uuid(row.project_id),
            name: row.name,
            created_by: UserId::from_uuid(row.created_by),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl RegistryRepository for PostgresRegistryRepository {
    async fn create_role(
        &self,
        project_id: ProjectId,
        name: &str,
        created_by: UserId,
    ) -> AppResult<RoleRecord> {
        let row = sqlx::query_as::<_, RegistryRow>(
            r#"
            INSERT INTO project_roles (project_id, name, created_by)
            VALUES ($1, $2, $3)
            RETURNING id, project_id, name, created_by, created_at, updated_at
            "#,
        )
        .bind(project_id.as_uuid())
        .bind(name)
        .bind(created_by.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            name_conflict_or_internal(error, "ROLE_EXISTS", "role", "create role")
        })?;

        Ok(RoleRecord::from(row))
    }

    async fn list_roles(&self, project_id: ProjectId) -> AppResult<Vec<RoleRecord>> {
        let rows = sqlx::query_as::<_, RegistryRow>(
            r#"
            SELECT id, project_id, name, created_by, created_at, updated_at
            FROM project_roles
            WHERE project_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(project_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list roles: {error}")))?;

        Ok(rows.into_iter().map(RoleRecord::from).collect())
    }

    async fn rename_role(&self, role_id: RoleId, name: &str) -> AppResult<RoleRecord> {
        let row = sqlx::query_as::<_, RegistryRow>(
            r#"
            UPDATE project_roles
            SET name = $2, updated_at = now()
            WHERE id = $1
            RETURNING id, project_id, name, created_by, created_at, updated_at
            "#,
        )
        .bind(role_id.as_uuid())
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            name_conflict_or_internal(error, "ROLE_EXISTS", "role", "rename role")
        })?
        .ok_or_else(|| AppError::not_found("ROLE_NOT_FOUND", "role not found"))?;

        Ok(RoleRecord::from(row))
    }

    async fn delete_role(&self, role_id: RoleId) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM project_roles WHERE id = $1")
            .bind(role_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to delete role: {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("ROLE_NOT_FOUND", "role not found"));
        }

        Ok(())
    }

    async fn create_permission(
        &self,
        project_id: ProjectId,
        name: &str,
        created_by: UserId,
    ) -> AppResult<PermissionRecord> {
        let row = sqlx::query_as::<_, RegistryRow>(
            r#"
            INSERT INTO project_permissions (project_id, name, created_by)
            VALUES ($1, $2, $3)
            RETURNING id, project_id, name, created_by, created_at, updated_at
            "#,
        )
        .bind(project_id.as_uuid())
        .bind(name)
        .bind(created_by.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            name_conflict_or_internal(error, "PERMISSION_EXISTS", "permission", "create permission")
        })?;

        Ok(PermissionRecord::from(row))
    }

    async fn list_permissions(&self, project_id: ProjectId) -> AppResult<Vec<PermissionRecord>> {
        let rows = sqlx::query_as::<_, RegistryRow>(
            r#"
            SELECT id, project_id, name, created_by, created_at, updated_at
            FROM project_permissions
            WHERE project_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(project_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list permissions: {error}")))?;

        Ok(rows.into_iter().map(PermissionRecord::from).collect())
    }

    async fn rename_permission(
        &self,
        permission_id: PermissionId,
        name: &str,
    ) -> AppResult<PermissionRecord> {
        let row = sqlx::query_as::<_, RegistryRow>(
            r#"
            UPDATE project_permissions
            SET name = $2, updated_at = now()
            WHERE id = $1
            RETURNING id, project_id, name, created_by, created_at, updated_at
            "#,
        )
        .bind(permission_id.as_uuid())
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            name_conflict_or_internal(error, "PERMISSION_EXISTS", "permission", "rename permission")
        })?
        .ok_or_else(|| AppError::not_found("PERMISSION_NOT_FOUND", "permission not found"))?;

        Ok(PermissionRecord::from(row))
    }

    async fn delete_permission(&self, permission_id: PermissionId) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM project_permissions WHERE id = $1")
            .bind(permission_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to delete permission: {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(
                "PERMISSION_NOT_FOUND",
                "permission not found",
            ));
        }

        Ok(())
    }
}

fn name_conflict_or_internal(
    error: sqlx::Error,
    code: &'static str,
    entity: &str,
    operation: &str,
) -> AppError {
    if let sqlx::Error::Database(ref database_error) = error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::duplicate(
            code,
            format!("a {entity} with this name already exists in the project"),
        );
    }

    AppError::Internal(format!("failed to {operation}: {error}"))
}
