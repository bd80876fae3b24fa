//! PostgreSQL-backed session repository.

use async_trait::async_trait;
use sqlx::PgPool;

use rolegrid_application::{SessionRecord, SessionRepository};
use rolegrid_core::{AppError, AppResult};
use rolegrid_domain::{SessionId, UserId};

/// PostgreSQL implementation of the session repository port.
#[derive(Clone)]
pub struct PostgresSessionRepository {
    pool: PgPool,
}

impl PostgresSessionRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SessionRow {
    id: uuid::Uuid,
    user_id: uuid::Uuid,
    token_hash: String,
    is_active: bool,
    ip_address: Option<String>,
    user_agent: Option<String>,
    expires_at: chrono::DateTime<chrono::Utc>,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<SessionRow> for SessionRecord {
    fn from(row: SessionRow) -> Self {
        Self {
            id: SessionId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            token_hash: row.token_hash,
            is_active: row.is_active,
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            expires_at: row.expires_at,
            created_at: row.created_at,
        }
    }
}

const SESSION_COLUMNS: &str =
    "id, user_id, token_hash, is_active, ip_address, user_agent, expires_at, created_at";

#[async_trait]
impl SessionRepository for PostgresSessionRepository {
    async fn insert(&self, session: SessionRecord) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions (id, user_id, token_hash, is_active, ip_address, user_agent, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(session.id.as_uuid())
        .bind(session.user_id.as_uuid())
        .bind(&session.token_hash)
        .bind(session.is_active)
        .bind(&session.ip_address)
        .bind(&session.user_agent)
        .bind(session.expires_at)
        .bind(session.created_at)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to create session: {error}")))?;

        Ok(())
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> AppResult<Option<SessionRecord>> {
        let row = sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE token_hash = $1"
        ))
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to find session by token: {error}"))
        })?;

        Ok(row.map(SessionRecord::from))
    }

    async fn find_by_id(&self, session_id: SessionId) -> AppResult<Option<SessionRecord>> {
        let row = sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE id = $1"
        ))
        .bind(session_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find session by id: {error}")))?;

        Ok(row.map(SessionRecord::from))
    }

    async fn list_for_user(&self, user_id: UserId) -> AppResult<Vec<SessionRecord>> {
        let rows = sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list sessions: {error}")))?;

        Ok(rows.into_iter().map(SessionRecord::from).collect())
    }

    async fn delete_by_id(&self, session_id: SessionId) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(session_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to delete session: {error}")))?;

        Ok(result.rows_affected())
    }

    async fn delete_for_user_except(&self, user_id: UserId, keep: SessionId) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = $1 AND id <> $2")
            .bind(user_id.as_uuid())
            .bind(keep.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to delete other sessions: {error}"))
            })?;

        Ok(result.rows_affected())
    }

    async fn set_active(&self, session_id: SessionId, is_active: bool) -> AppResult<()> {
        sqlx::query("UPDATE sessions SET is_active = $2 WHERE id = $1")
            .bind(session_id.as_uuid())
            .bind(is_active)
            .execute(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to update session state: {error}"))
            })?;

        Ok(())
    }
}
