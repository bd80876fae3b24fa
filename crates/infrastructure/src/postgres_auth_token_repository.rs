//! PostgreSQL-backed auth token repository.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::PgPool;

use rolegrid_application::{AuthTokenRecord, AuthTokenRepository};
use rolegrid_core::{AppError, AppResult};
use rolegrid_domain::{AuthTokenType, UserId};

/// PostgreSQL implementation of the auth token repository port.
#[derive(Clone)]
pub struct PostgresAuthTokenRepository {
    pool: PgPool,
}

impl PostgresAuthTokenRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TokenRow {
    id: uuid::Uuid,
    user_id: uuid::Uuid,
    email: String,
    token_hash: String,
    token_type: String,
    expires_at: chrono::DateTime<chrono::Utc>,
    used_at: Option<chrono::DateTime<chrono::Utc>>,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl TryFrom<TokenRow> for AuthTokenRecord {
    type Error = AppError;

    fn try_from(row: TokenRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            user_id: UserId::from_uuid(row.user_id),
            email: row.email,
            token_hash: row.token_hash,
            token_type: AuthTokenType::from_str(&row.token_type)?,
            expires_at: row.expires_at,
            used_at: row.used_at,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl AuthTokenRepository for PostgresAuthTokenRepository {
    async fn insert(&self, token: AuthTokenRecord) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO auth_tokens (id, user_id, email, token_hash, token_type, expires_at, used_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(token.id)
        .bind(token.user_id.as_uuid())
        .bind(&token.email)
        .bind(&token.token_hash)
        .bind(token.token_type.as_str())
        .bind(token.expires_at)
        .bind(token.used_at)
        .bind(token.created_at)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to create auth token: {error}")))?;

        Ok(())
    }

    async fn find_valid(
        &self,
        token_hash: &str,
        token_type: AuthTokenType,
    ) -> AppResult<Option<AuthTokenRecord>> {
        let row = sqlx::query_as::<_, TokenRow>(
            r#"
            SELECT id, user_id, email, token_hash, token_type, expires_at, used_at, created_at
            FROM auth_tokens
            WHERE token_hash = $1
              AND token_type = $2
              AND used_at IS NULL
              AND expires_at > now()
            "#,
        )
        .bind(token_hash)
        .bind(token_type.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find auth token: {error}")))?;

        row.map(AuthTokenRecord::try_from).transpose()
    }

    async fn mark_used(&self, token_id: uuid::Uuid) -> AppResult<()> {
        sqlx::query("UPDATE auth_tokens SET used_at = now() WHERE id = $1")
            .bind(token_id)
            .execute(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to mark auth token used: {error}"))
            })?;

        Ok(())
    }

    async fn invalidate_for_user(
        &self,
        user_id: UserId,
        token_type: AuthTokenType,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE auth_tokens
            SET used_at = now()
            WHERE user_id = $1
              AND token_type = $2
              AND used_at IS NULL
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(token_type.as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to invalidate tokens: {error}")))?;

        Ok(())
    }

    async fn count_issued_since(
        &self,
        user_id: UserId,
        token_type: AuthTokenType,
        since: chrono::DateTime<chrono::Utc>,
    ) -> AppResult<u64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM auth_tokens
            WHERE user_id = $1
              AND token_type = $2
              AND created_at >= $3
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(token_type.as_str())
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to count recent tokens: {error}")))?;

        Ok(count.max(0) as u64)
    }
}
