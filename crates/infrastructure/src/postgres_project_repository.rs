//! PostgreSQL-backed project repository.

use async_trait::async_trait;
use sqlx::PgPool;

use rolegrid_application::{ProjectRecord, ProjectRepository};
use rolegrid_core::{AppError, AppResult};
use rolegrid_domain::{ProjectId, ProjectSlug, UserId};

/// PostgreSQL implementation of the project repository port.
#[derive(Clone)]
pub struct PostgresProjectRepository {
    pool: PgPool,
}

impl PostgresProjectRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProjectRow {
    id: uuid::Uuid,
    name: String,
    slug: String,
    description: Option<String>,
    created_by: uuid::Uuid,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl TryFrom<ProjectRow> for ProjectRecord {
    type Error = AppError;

    fn try_from(row: ProjectRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ProjectId::from_uuid(row.id),
            name: row.name,
            slug: ProjectSlug::new(row.slug)?,
            description: row.description,
            created_by: UserId::from_uuid(row.created_by),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl ProjectRepository for PostgresProjectRepository {
    async fn insert(&self, project: ProjectRecord) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO projects (id, name, slug, description, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(project.id.as_uuid())
        .bind(&project.name)
        .bind(project.slug.as_str())
        .bind(&project.description)
        .bind(project.created_by.as_uuid())
        .bind(project.created_at)
        .bind(project.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|error| slug_conflict_or_internal(error, "create project"))?;

        Ok(())
    }

    async fn find_by_id(&self, project_id: ProjectId) -> AppResult<Option<ProjectRecord>> {
        let row = sqlx::query_as::<_, ProjectRow>(
            r#"
            SELECT id, name, slug, description, created_by, created_at, updated_at
            FROM projects
            WHERE id = $1
            "#,
        )
        .bind(project_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find project: {error}")))?;

        row.map(ProjectRecord::try_from).transpose()
    }

    async fn list_for_user(&self, user_id: UserId) -> AppResult<Vec<ProjectRecord>> {
        let rows = sqlx::query_as::<_, ProjectRow>(
            r#"
            SELECT id, name, slug, description, created_by, created_at, updated_at
            FROM projects
            WHERE created_by = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list projects: {error}")))?;

        rows.into_iter().map(ProjectRecord::try_from).collect()
    }

    async fn update(&self, project: &ProjectRecord) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE projects
            SET name = $2, slug = $3, description = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(project.id.as_uuid())
        .bind(&project.name)
        .bind(project.slug.as_str())
        .bind(&project.description)
        .bind(project.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|error| slug_conflict_or_internal(error, "update project"))?;

        Ok(())
    }

    async fn delete(&self, project_id: ProjectId) -> AppResult<()> {
        sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(project_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to delete project: {error}")))?;

        Ok(())
    }
}

fn slug_conflict_or_internal(error: sqlx::Error, operation: &str) -> AppError {
    if let sqlx::Error::Database(ref database_error) = error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::duplicate("PROJECT_EXISTS", "a project with this slug already exists");
    }

    AppError::Internal(format!("failed to {operation}: {error}"))
}
