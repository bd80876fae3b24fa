use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::Mutex;

use rolegrid_core::{AppError, AppResult};
use rolegrid_domain::{SessionId, UserId};

use super::{SessionRecord, SessionRepository, SessionService};

#[derive(Default)]
struct FakeSessionRepository {
    sessions: Mutex<Vec<SessionRecord>>,
}

#[async_trait]
impl SessionRepository for FakeSessionRepository {
    async fn insert(&self, session: SessionRecord) -> AppResult<()> {
        self.sessions.lock().await.push(session);
        Ok(())
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> AppResult<Option<SessionRecord>> {
        Ok(self
            .sessions
            .lock()
            .await
            .iter()
            .find(|session| session.token_hash == token_hash)
            .cloned())
    }

    async fn find_by_id(&self, session_id: SessionId) -> AppResult<Option<SessionRecord>> {
        Ok(self
            .sessions
            .lock()
            .await
            .iter()
            .find(|session| session.id == session_id)
            .cloned())
    }

    async fn list_for_user(&self, user_id: UserId) -> AppResult<Vec<SessionRecord>> {
        Ok(self
            .sessions
            .lock()
            .await
            .iter()
            .filter(|session| session.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn delete_by_id(&self, session_id: SessionId) -> AppResult<u64> {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|session| session.id != session_id);
        Ok((before - sessions.len()) as u64)
    }

    async fn delete_for_user_except(&self, user_id: UserId, keep: SessionId) -> AppResult<u64> {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|session| session.user_id != user_id || session.id == keep);
        Ok((before - sessions.len()) as u64)
    }

    async fn set_active(&self, session_id: SessionId, is_active: bool) -> AppResult<()> {
        if let Some(session) = self
            .sessions
            .lock()
            .await
            .iter_mut()
            .find(|session| session.id == session_id)
        {
            session.is_active = is_active;
        }
        Ok(())
    }
}

fn service(repository: &Arc<FakeSessionRepository>) -> SessionService {
    SessionService::new(repository.clone(), 24)
}

#[tokio::test]
async fn issued_token_validates_back_to_its_user() -> AppResult<()> {
    let repository = Arc::new(FakeSessionRepository::default());
    let service = service(&repository);
    let user_id = UserId::new();

    let issued = service.create_session(user_id, None, None).await?;
    let caller = service.validate_bearer(&issued.token).await?;

    assert_eq!(caller.user_id(), user_id.as_uuid());
    assert_eq!(caller.session_id(), issued.session.id.as_uuid());
    Ok(())
}

#[tokio::test]
async fn raw_token_is_never_stored() -> AppResult<()> {
    let repository = Arc::new(FakeSessionRepository::default());
    let service = service(&repository);

    let issued = service.create_session(UserId::new(), None, None).await?;

    let sessions = repository.sessions.lock().await;
    assert_ne!(sessions[0].token_hash, issued.token);
    Ok(())
}

#[tokio::test]
async fn malformed_token_is_unauthorized() {
    let repository = Arc::new(FakeSessionRepository::default());
    let service = service(&repository);

    let result = service.validate_bearer("not-a-token").await;
    assert!(matches!(result, Err(AppError::Unauthorized(_))));
}

#[tokio::test]
async fn unknown_token_is_an_invalid_session() {
    let repository = Arc::new(FakeSessionRepository::default());
    let service = service(&repository);

    let result = service.validate_bearer(&"a".repeat(64)).await;
    assert!(matches!(result, Err(AppError::InvalidSession(_))));
}

#[tokio::test]
async fn deactivated_session_fails_like_a_deleted_one() -> AppResult<()> {
    let repository = Arc::new(FakeSessionRepository::default());
    let service = service(&repository);
    let user_id = UserId::new();

    let issued = service.create_session(user_id, None, None).await?;
    service
        .deactivate_session(issued.session.id, user_id)
        .await?;

    let result = service.validate_bearer(&issued.token).await;
    assert!(matches!(result, Err(AppError::InvalidSession(_))));
    Ok(())
}

#[tokio::test]
async fn expired_session_reports_expiry_and_is_removed() -> AppResult<()> {
    let repository = Arc::new(FakeSessionRepository::default());
    let service = service(&repository);

    let issued = service.create_session(UserId::new(), None, None).await?;
    {
        let mut sessions = repository.sessions.lock().await;
        sessions[0].expires_at = Utc::now() - Duration::hours(1);
    }

    let result = service.validate_bearer(&issued.token).await;
    assert!(matches!(result, Err(AppError::TokenExpired)));
    assert!(repository.sessions.lock().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn logout_destroys_the_session_and_is_idempotent() -> AppResult<()> {
    let repository = Arc::new(FakeSessionRepository::default());
    let service = service(&repository);

    let issued = service.create_session(UserId::new(), None, None).await?;
    assert!(service.logout(issued.session.id).await?);
    assert!(repository.sessions.lock().await.is_empty());

    // Logging out an already-destroyed session succeeds without effect.
    assert!(!service.logout(issued.session.id).await?);
    Ok(())
}

#[tokio::test]
async fn revoking_another_users_session_is_forbidden() -> AppResult<()> {
    let repository = Arc::new(FakeSessionRepository::default());
    let service = service(&repository);
    let owner = UserId::new();

    let issued = service.create_session(owner, None, None).await?;

    let result = service
        .revoke_session(issued.session.id, UserId::new())
        .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
    assert_eq!(repository.sessions.lock().await.len(), 1);
    Ok(())
}

#[tokio::test]
async fn revoking_other_sessions_keeps_the_current_one() -> AppResult<()> {
    let repository = Arc::new(FakeSessionRepository::default());
    let service = service(&repository);
    let user_id = UserId::new();

    service.create_session(user_id, None, None).await?;
    service.create_session(user_id, None, None).await?;
    let current = service.create_session(user_id, None, None).await?;

    let destroyed = service
        .revoke_other_sessions(user_id, current.session.id)
        .await?;

    assert_eq!(destroyed, 2);
    let remaining = service.list_sessions(user_id).await?;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, current.session.id);
    Ok(())
}

#[tokio::test]
async fn revoking_an_unknown_session_is_not_found() {
    let repository = Arc::new(FakeSessionRepository::default());
    let service = service(&repository);

    let result = service.revoke_session(SessionId::new(), UserId::new()).await;
    assert!(matches!(result, Err(AppError::NotFound { .. })));
}
