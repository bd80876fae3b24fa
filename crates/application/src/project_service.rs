//! Projects: the multi-tenant container for registries and the matrix.
//!
//! All reads and writes are scoped to the owning user. A caller can never
//! see or touch another user's projects.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use rolegrid_core::{AppError, AppResult};
use rolegrid_domain::{ProjectId, ProjectSlug, UserId, validate_project_name};

/// One persisted project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRecord {
    /// Unique identifier.
    pub id: ProjectId,
    /// Human-readable name.
    pub name: String,
    /// URL-safe slug, unique per owner.
    pub slug: ProjectSlug,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Owning user.
    pub created_by: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Repository port for the project store.
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Persists a new project. Fails with a `Duplicate` error when the
    /// owner already has a project with this slug.
    async fn insert(&self, project: ProjectRecord) -> AppResult<()>;

    /// Looks up a project by id.
    async fn find_by_id(&self, project_id: ProjectId) -> AppResult<Option<ProjectRecord>>;

    /// Lists a user's projects in creation order.
    async fn list_for_user(&self, user_id: UserId) -> AppResult<Vec<ProjectRecord>>;

    /// Persists changed fields of a project.
    async fn update(&self, project: &ProjectRecord) -> AppResult<()>;

    /// Deletes a project.
    async fn delete(&self, project_id: ProjectId) -> AppResult<()>;
}

/// Fields of a project update. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateProjectInput {
    /// New name.
    pub name: Option<String>,
    /// New slug.
    pub slug: Option<String>,
    /// New description; `Some(None)` clears it.
    pub description: Option<Option<String>>,
}

/// Application service for owner-scoped project CRUD.
#[derive(Clone)]
pub struct ProjectService {
    repository: Arc<dyn ProjectRepository>,
}

impl ProjectService {
    /// Creates a project service from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn ProjectRepository>) -> Self {
        Self { repository }
    }

    /// Creates a project owned by the caller.
    pub async fn create_project(
        &self,
        name: &str,
        slug: &str,
        description: Option<String>,
        caller: UserId,
    ) -> AppResult<ProjectRecord> {
        validate_project_name(name)?;
        let slug = ProjectSlug::new(slug)?;

        let now = Utc::now();
        let project = ProjectRecord {
            id: ProjectId::new(),
            name: name.trim().to_owned(),
            slug,
            description,
            created_by: caller,
            created_at: now,
            updated_at: now,
        };

        self.repository.insert(project.clone()).await?;
        Ok(project)
    }

    /// Lists the caller's projects.
    pub async fn list_projects(&self, caller: UserId) -> AppResult<Vec<ProjectRecord>> {
        self.repository.list_for_user(caller).await
    }

    /// Fetches one of the caller's projects by id.
    pub async fn get_project(
        &self,
        project_id: ProjectId,
        caller: UserId,
    ) -> AppResult<ProjectRecord> {
        self.owned_project(project_id, caller).await
    }

    /// Updates one of the caller's projects.
    pub async fn update_project(
        &self,
        project_id: ProjectId,
        input: UpdateProjectInput,
        caller: UserId,
    ) -> AppResult<ProjectRecord> {
        let mut project = self.owned_project(project_id, caller).await?;

        if let Some(name) = input.name {
            validate_project_name(&name)?;
            project.name = name.trim().to_owned();
        }

        if let Some(slug) = input.slug {
            project.slug = ProjectSlug::new(slug)?;
        }

        if let Some(description) = input.description {
            project.description = description;
        }

        project.updated_at = Utc::now();
        self.repository.update(&project).await?;
        Ok(project)
    }

    /// Deletes one of the caller's projects.
    ///
    /// Registries and matrix cells of the project are removed with it at
    /// the storage layer.
    pub async fn delete_project(&self, project_id: ProjectId, caller: UserId) -> AppResult<()> {
        let project = self.owned_project(project_id, caller).await?;
        self.repository.delete(project.id).await
    }

    async fn owned_project(
        &self,
        project_id: ProjectId,
        caller: UserId,
    ) -> AppResult<ProjectRecord> {
        let project = self
            .repository
            .find_by_id(project_id)
            .await?
            .ok_or_else(|| AppError::not_found("PROJECT_NOT_FOUND", "project not found"))?;

        if project.created_by != caller {
            return Err(AppError::Forbidden(
                "project belongs to another user".to_owned(),
            ));
        }

        Ok(project)
    }
}
