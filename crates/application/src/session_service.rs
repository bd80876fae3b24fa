//! Server-side sessions addressed by opaque bearer tokens.
//!
//! A login issues a raw token that is returned to the client exactly once;
//! only its SHA-256 hash is persisted. Token validity is entirely a function
//! of the stored session row: deleting or deactivating the row invalidates
//! the token immediately.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use rolegrid_core::{AppError, AppResult, CallerIdentity};
use rolegrid_domain::{SessionId, UserId};

use crate::token_crypto::{generate_token, hash_token, is_well_formed_token};

/// One persisted session row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    /// Unique session identifier.
    pub id: SessionId,
    /// Owning user.
    pub user_id: UserId,
    /// SHA-256 hash of the raw bearer token. The raw token is never stored.
    pub token_hash: String,
    /// Inactive sessions fail validation exactly like deleted ones.
    pub is_active: bool,
    /// Client IP captured at login, if known.
    pub ip_address: Option<String>,
    /// Client user agent captured at login, if known.
    pub user_agent: Option<String>,
    /// Hard expiry. Requests past this instant fail with a distinct code.
    pub expires_at: DateTime<Utc>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Repository port for the session store.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Persists a new session row.
    async fn insert(&self, session: SessionRecord) -> AppResult<()>;

    /// Looks up a session by its token hash.
    async fn find_by_token_hash(&self, token_hash: &str) -> AppResult<Option<SessionRecord>>;

    /// Looks up a session by id.
    async fn find_by_id(&self, session_id: SessionId) -> AppResult<Option<SessionRecord>>;

    /// Lists a user's sessions, most recent first.
    async fn list_for_user(&self, user_id: UserId) -> AppResult<Vec<SessionRecord>>;

    /// Deletes a session by id. Returns the number of rows removed.
    async fn delete_by_id(&self, session_id: SessionId) -> AppResult<u64>;

    /// Deletes all of a user's sessions except the one given.
    async fn delete_for_user_except(&self, user_id: UserId, keep: SessionId) -> AppResult<u64>;

    /// Flips a session's active flag.
    async fn set_active(&self, session_id: SessionId, is_active: bool) -> AppResult<()>;
}

/// A freshly issued session together with its raw bearer token.
///
/// The raw token exists only in this value and in the HTTP response that
/// carries it to the client.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    /// Raw bearer token to hand to the client.
    pub token: String,
    /// The persisted session row.
    pub session: SessionRecord,
}

/// Application service for issuing and validating bearer sessions.
#[derive(Clone)]
pub struct SessionService {
    repository: Arc<dyn SessionRepository>,
    ttl: Duration,
}

impl SessionService {
    /// Creates a session service with the given session lifetime.
    #[must_use]
    pub fn new(repository: Arc<dyn SessionRepository>, ttl_hours: i64) -> Self {
        Self {
            repository,
            ttl: Duration::hours(ttl_hours),
        }
    }

    /// Issues a new session for a user and returns the raw bearer token.
    pub async fn create_session(
        &self,
        user_id: UserId,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> AppResult<IssuedSession> {
        let (token, token_hash) = generate_token()?;
        let now = Utc::now();
        let session = SessionRecord {
            id: SessionId::new(),
            user_id,
            token_hash,
            is_active: true,
            ip_address,
            user_agent,
            expires_at: now + self.ttl,
            created_at: now,
        };

        self.repository.insert(session.clone()).await?;
        Ok(IssuedSession { token, session })
    }

    /// Resolves a raw bearer token to the caller it authenticates.
    ///
    /// Malformed tokens, unknown or deactivated sessions, and expired
    /// sessions each fail with a distinct error so clients can tell a bad
    /// request from a login that simply needs renewing.
    pub async fn validate_bearer(&self, raw_token: &str) -> AppResult<CallerIdentity> {
        if !is_well_formed_token(raw_token) {
            return Err(AppError::Unauthorized("malformed bearer token".to_owned()));
        }

        let token_hash = hash_token(raw_token);
        let session = self
            .repository
            .find_by_token_hash(&token_hash)
            .await?
            .ok_or_else(|| AppError::InvalidSession("session not found".to_owned()))?;

        if !session.is_active {
            return Err(AppError::InvalidSession(
                "session has been deactivated".to_owned(),
            ));
        }

        if session.expires_at <= Utc::now() {
            // Expired rows are dead weight; clear them on the way out.
            self.repository.delete_by_id(session.id).await?;
            return Err(AppError::TokenExpired);
        }

        Ok(CallerIdentity::new(
            session.id.as_uuid(),
            session.user_id.as_uuid(),
        ))
    }

    /// Destroys the caller's current session.
    ///
    /// Idempotent: returns whether a row was actually deleted so callers
    /// can phrase the response, never an error for an already-gone session.
    pub async fn logout(&self, session_id: SessionId) -> AppResult<bool> {
        Ok(self.repository.delete_by_id(session_id).await? > 0)
    }

    /// Lists a user's sessions, most recent first.
    pub async fn list_sessions(&self, user_id: UserId) -> AppResult<Vec<SessionRecord>> {
        self.repository.list_for_user(user_id).await
    }

    /// Revokes one of the caller's own sessions by id.
    pub async fn revoke_session(&self, session_id: SessionId, caller: UserId) -> AppResult<()> {
        let session = self.owned_session(session_id, caller).await?;
        self.repository.delete_by_id(session.id).await?;
        Ok(())
    }

    /// Revokes all of the caller's sessions except the current one.
    /// Returns the number of sessions destroyed.
    pub async fn revoke_other_sessions(
        &self,
        caller: UserId,
        current_session: SessionId,
    ) -> AppResult<u64> {
        self.repository
            .delete_for_user_except(caller, current_session)
            .await
    }

    /// Deactivates one of the caller's own sessions without deleting it.
    pub async fn deactivate_session(&self, session_id: SessionId, caller: UserId) -> AppResult<()> {
        let session = self.owned_session(session_id, caller).await?;
        self.repository.set_active(session.id, false).await
    }

    async fn owned_session(
        &self,
        session_id: SessionId,
        caller: UserId,
    ) -> AppResult<SessionRecord> {
        let session = self
            .repository
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| AppError::not_found("SESSION_NOT_FOUND", "session not found"))?;

        if session.user_id != caller {
            return Err(AppError::Forbidden(
                "session belongs to another user".to_owned(),
            ));
        }

        Ok(session)
    }
}

#[cfg(test)]
mod tests;
