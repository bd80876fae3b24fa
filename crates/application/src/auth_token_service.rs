//! Single-use email verification and password reset tokens.
//!
//! Like sessions, only the SHA-256 hash of a raw token is persisted. Tokens
//! are single-use (consumption marks them used), expire on their own
//! schedule, and issuing a new token invalidates older ones of the same
//! type for that user.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use rolegrid_core::{AppError, AppResult};
use rolegrid_domain::{AuthTokenType, UserId};

use crate::token_crypto::{generate_token, hash_token, is_well_formed_token};
use crate::user_service::UserRecord;

const EMAIL_VERIFICATION_TTL_HOURS: i64 = 24;
const PASSWORD_RESET_TTL_HOURS: i64 = 1;

/// Max tokens of one type issued per user inside the rate window.
const RATE_LIMIT_MAX_TOKENS: u64 = 3;
const RATE_LIMIT_WINDOW_MINUTES: i64 = 60;

/// One persisted verification or reset token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthTokenRecord {
    /// Unique identifier.
    pub id: uuid::Uuid,
    /// User the token was issued to.
    pub user_id: UserId,
    /// Email address the token was mailed to, for match checks at
    /// consumption time.
    pub email: String,
    /// SHA-256 hash of the raw token.
    pub token_hash: String,
    /// What the token authorizes.
    pub token_type: AuthTokenType,
    /// Hard expiry.
    pub expires_at: DateTime<Utc>,
    /// Set on first consumption; a used token never validates again.
    pub used_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Repository port for the auth token store.
#[async_trait]
pub trait AuthTokenRepository: Send + Sync {
    /// Persists a new token row.
    async fn insert(&self, token: AuthTokenRecord) -> AppResult<()>;

    /// Finds an unused, unexpired token by hash and type.
    async fn find_valid(
        &self,
        token_hash: &str,
        token_type: AuthTokenType,
    ) -> AppResult<Option<AuthTokenRecord>>;

    /// Marks a token consumed.
    async fn mark_used(&self, token_id: uuid::Uuid) -> AppResult<()>;

    /// Invalidates a user's outstanding tokens of one type.
    async fn invalidate_for_user(
        &self,
        user_id: UserId,
        token_type: AuthTokenType,
    ) -> AppResult<()>;

    /// Counts tokens of one type issued to a user since an instant,
    /// consumed or not.
    async fn count_issued_since(
        &self,
        user_id: UserId,
        token_type: AuthTokenType,
        since: DateTime<Utc>,
    ) -> AppResult<u64>;
}

/// An outbound email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain text body.
    pub body: String,
}

/// Port for actually delivering an email (SMTP, console, ...).
#[async_trait]
pub trait EmailService: Send + Sync {
    /// Delivers one message.
    async fn send(&self, message: &EmailMessage) -> AppResult<()>;
}

/// Port for handing a message off for asynchronous delivery.
///
/// Enqueueing succeeds as soon as the message is accepted; delivery
/// failures are logged by the dispatcher and never fail the request that
/// triggered the email.
#[async_trait]
pub trait EmailDispatcher: Send + Sync {
    /// Accepts one message for background delivery.
    async fn enqueue(&self, message: EmailMessage) -> AppResult<()>;
}

/// Application service issuing and consuming auth tokens.
#[derive(Clone)]
pub struct AuthTokenService {
    repository: Arc<dyn AuthTokenRepository>,
    dispatcher: Arc<dyn EmailDispatcher>,
    frontend_url: String,
}

impl AuthTokenService {
    /// Creates an auth token service.
    ///
    /// `frontend_url` is the base URL embedded into verification and reset
    /// links, without a trailing slash.
    #[must_use]
    pub fn new(
        repository: Arc<dyn AuthTokenRepository>,
        dispatcher: Arc<dyn EmailDispatcher>,
        frontend_url: String,
    ) -> Self {
        Self {
            repository,
            dispatcher,
            frontend_url,
        }
    }

    /// Issues an email verification token and queues the email carrying it.
    pub async fn send_email_verification(&self, user: &UserRecord) -> AppResult<()> {
        let raw_token = self
            .issue_token(
                user,
                AuthTokenType::EmailVerification,
                Duration::hours(EMAIL_VERIFICATION_TTL_HOURS),
            )
            .await?;

        let link = format!(
            "{}/verify-email?token={}&email={}",
            self.frontend_url,
            raw_token,
            user.email.as_str()
        );

        self.dispatcher
            .enqueue(EmailMessage {
                to: user.email.as_str().to_owned(),
                subject: "Verify your email address".to_owned(),
                body: format!(
                    "Hi {},\n\nConfirm your email address by opening this link:\n\n{}\n\n\
                     The link expires in {} hours. If you did not create an account, \
                     you can ignore this email.\n",
                    user.full_name.as_deref().unwrap_or("there"),
                    link,
                    EMAIL_VERIFICATION_TTL_HOURS
                ),
            })
            .await
    }

    /// Issues a password reset token and queues the email carrying it.
    pub async fn send_password_reset(&self, user: &UserRecord) -> AppResult<()> {
        let raw_token = self
            .issue_token(
                user,
                AuthTokenType::PasswordReset,
                Duration::hours(PASSWORD_RESET_TTL_HOURS),
            )
            .await?;

        let link = format!(
            "{}/reset-password?token={}&email={}",
            self.frontend_url,
            raw_token,
            user.email.as_str()
        );

        self.dispatcher
            .enqueue(EmailMessage {
                to: user.email.as_str().to_owned(),
                subject: "Reset your password".to_owned(),
                body: format!(
                    "Hi {},\n\nReset your password by opening this link:\n\n{}\n\n\
                     The link expires in {} hour(s). If you did not request a reset, \
                     you can ignore this email.\n",
                    user.full_name.as_deref().unwrap_or("there"),
                    link,
                    PASSWORD_RESET_TTL_HOURS
                ),
            })
            .await
    }

    /// Consumes a raw token of the given type, marking it used.
    ///
    /// `email` must match the address the token was issued to. Malformed,
    /// unknown, expired, already-consumed, and email-mismatched tokens all
    /// fail with the same error so the response does not reveal which.
    pub async fn consume_token(
        &self,
        raw_token: &str,
        token_type: AuthTokenType,
        email: &str,
    ) -> AppResult<AuthTokenRecord> {
        if !is_well_formed_token(raw_token) {
            return Err(AppError::InvalidToken(
                "token is invalid or has expired".to_owned(),
            ));
        }

        let token = self
            .repository
            .find_valid(&hash_token(raw_token), token_type)
            .await?
            .ok_or_else(|| AppError::InvalidToken("token is invalid or has expired".to_owned()))?;

        // The match check runs before the token is marked used; a
        // mismatch leaves the single-use token consumable.
        if !token.email.eq_ignore_ascii_case(email.trim()) {
            return Err(AppError::InvalidToken(
                "token is invalid or has expired".to_owned(),
            ));
        }

        self.repository.mark_used(token.id).await?;
        Ok(token)
    }

    async fn issue_token(
        &self,
        user: &UserRecord,
        token_type: AuthTokenType,
        ttl: Duration,
    ) -> AppResult<String> {
        let window_start = Utc::now() - Duration::minutes(RATE_LIMIT_WINDOW_MINUTES);
        let issued = self
            .repository
            .count_issued_since(user.id, token_type, window_start)
            .await?;
        if issued >= RATE_LIMIT_MAX_TOKENS {
            return Err(AppError::Validation(
                "too many requests, please try again later".to_owned(),
            ));
        }

        self.repository
            .invalidate_for_user(user.id, token_type)
            .await?;

        let (raw_token, token_hash) = generate_token()?;
        let now = Utc::now();
        self.repository
            .insert(AuthTokenRecord {
                id: uuid::Uuid::new_v4(),
                user_id: user.id,
                email: user.email.as_str().to_owned(),
                token_hash,
                token_type,
                expires_at: now + ttl,
                used_at: None,
                created_at: now,
            })
            .await?;

        Ok(raw_token)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::{DateTime, Duration, Utc};
    use tokio::sync::Mutex;

    use rolegrid_core::{AppError, AppResult};
    use rolegrid_domain::{AuthTokenType, EmailAddress, UserId};

    use super::{
        AuthTokenRecord, AuthTokenRepository, AuthTokenService, EmailDispatcher, EmailMessage,
    };
    use crate::user_service::UserRecord;

    #[derive(Default)]
    struct FakeAuthTokenRepository {
        tokens: Mutex<Vec<AuthTokenRecord>>,
    }

    #[async_trait]
    impl AuthTokenRepository for FakeAuthTokenRepository {
        async fn insert(&self, token: AuthTokenRecord) -> AppResult<()> {
            self.tokens.lock().await.push(token);
            Ok(())
        }

        async fn find_valid(
            &self,
            token_hash: &str,
            token_type: AuthTokenType,
        ) -> AppResult<Option<AuthTokenRecord>> {
            let now = Utc::now();
            Ok(self
                .tokens
                .lock()
                .await
                .iter()
                .find(|token| {
                    token.token_hash == token_hash
                        && token.token_type == token_type
                        && token.used_at.is_none()
                        && token.expires_at > now
                })
                .cloned())
        }

        async fn mark_used(&self, token_id: uuid::Uuid) -> AppResult<()> {
            if let Some(token) = self
                .tokens
                .lock()
                .await
                .iter_mut()
                .find(|token| token.id == token_id)
            {
                token.used_at = Some(Utc::now());
            }
            Ok(())
        }

        async fn invalidate_for_user(
            &self,
            user_id: UserId,
            token_type: AuthTokenType,
        ) -> AppResult<()> {
            for token in self.tokens.lock().await.iter_mut() {
                if token.user_id == user_id
                    && token.token_type == token_type
                    && token.used_at.is_none()
                {
                    token.used_at = Some(Utc::now());
                }
            }
            Ok(())
        }

        async fn count_issued_since(
            &self,
            user_id: UserId,
            token_type: AuthTokenType,
            since: DateTime<Utc>,
        ) -> AppResult<u64> {
            Ok(self
                .tokens
                .lock()
                .await
                .iter()
                .filter(|token| {
                    token.user_id == user_id
                        && token.token_type == token_type
                        && token.created_at >= since
                })
                .count() as u64)
        }
    }

    #[derive(Default)]
    struct CapturingDispatcher {
        sent: Mutex<Vec<EmailMessage>>,
    }

    #[async_trait]
    impl EmailDispatcher for CapturingDispatcher {
        async fn enqueue(&self, message: EmailMessage) -> AppResult<()> {
            self.sent.lock().await.push(message);
            Ok(())
        }
    }

    fn user() -> AppResult<UserRecord> {
        Ok(UserRecord {
            id: UserId::new(),
            email: EmailAddress::new("jamie@example.com")?,
            full_name: Some("Jamie".to_owned()),
            phone: None,
            password_hash: "hash".to_owned(),
            email_verified: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
    }

    fn service(
        repository: &Arc<FakeAuthTokenRepository>,
        dispatcher: &Arc<CapturingDispatcher>,
    ) -> AuthTokenService {
        AuthTokenService::new(
            repository.clone(),
            dispatcher.clone(),
            "https://app.example.com".to_owned(),
        )
    }

    fn raw_token_from(message: &EmailMessage) -> String {
        let start = message
            .body
            .find("token=")
            .map(|index| index + "token=".len())
            .unwrap_or_else(|| panic!("no token in body"));
        message.body[start..start + 64].to_owned()
    }

    #[tokio::test]
    async fn verification_email_carries_a_consumable_token() -> AppResult<()> {
        let repository = Arc::new(FakeAuthTokenRepository::default());
        let dispatcher = Arc::new(CapturingDispatcher::default());
        let service = service(&repository, &dispatcher);
        let user = user()?;

        service.send_email_verification(&user).await?;

        let sent = dispatcher.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "jamie@example.com");

        let raw_token = raw_token_from(&sent[0]);
        let consumed = service
            .consume_token(&raw_token, AuthTokenType::EmailVerification, "jamie@example.com")
            .await?;
        assert_eq!(consumed.user_id, user.id);
        Ok(())
    }

    #[tokio::test]
    async fn a_token_only_consumes_once() -> AppResult<()> {
        let repository = Arc::new(FakeAuthTokenRepository::default());
        let dispatcher = Arc::new(CapturingDispatcher::default());
        let service = service(&repository, &dispatcher);
        let user = user()?;

        service.send_password_reset(&user).await?;
        let raw_token = raw_token_from(&dispatcher.sent.lock().await[0]);

        service
            .consume_token(&raw_token, AuthTokenType::PasswordReset, "jamie@example.com")
            .await?;
        let second = service
            .consume_token(&raw_token, AuthTokenType::PasswordReset, "jamie@example.com")
            .await;
        assert!(matches!(second, Err(AppError::InvalidToken(_))));
        Ok(())
    }

    #[tokio::test]
    async fn a_mismatched_email_does_not_burn_the_token() -> AppResult<()> {
        let repository = Arc::new(FakeAuthTokenRepository::default());
        let dispatcher = Arc::new(CapturingDispatcher::default());
        let service = service(&repository, &dispatcher);
        let user = user()?;

        service.send_email_verification(&user).await?;
        let raw_token = raw_token_from(&dispatcher.sent.lock().await[0]);

        let wrong = service
            .consume_token(
                &raw_token,
                AuthTokenType::EmailVerification,
                "someone-else@example.com",
            )
            .await;
        assert!(matches!(wrong, Err(AppError::InvalidToken(_))));

        // Still consumable by the right recipient afterwards.
        let right = service
            .consume_token(
                &raw_token,
                AuthTokenType::EmailVerification,
                "Jamie@Example.com",
            )
            .await?;
        assert_eq!(right.user_id, user.id);
        Ok(())
    }

    #[tokio::test]
    async fn a_token_cannot_be_consumed_as_the_wrong_type() -> AppResult<()> {
        let repository = Arc::new(FakeAuthTokenRepository::default());
        let dispatcher = Arc::new(CapturingDispatcher::default());
        let service = service(&repository, &dispatcher);
        let user = user()?;

        service.send_email_verification(&user).await?;
        let raw_token = raw_token_from(&dispatcher.sent.lock().await[0]);

        let result = service
            .consume_token(&raw_token, AuthTokenType::PasswordReset, "jamie@example.com")
            .await;
        assert!(matches!(result, Err(AppError::InvalidToken(_))));
        Ok(())
    }

    #[tokio::test]
    async fn reissuing_invalidates_the_previous_token() -> AppResult<()> {
        let repository = Arc::new(FakeAuthTokenRepository::default());
        let dispatcher = Arc::new(CapturingDispatcher::default());
        let service = service(&repository, &dispatcher);
        let user = user()?;

        service.send_email_verification(&user).await?;
        service.send_email_verification(&user).await?;

        let sent = dispatcher.sent.lock().await;
        let first_token = raw_token_from(&sent[0]);
        let second_token = raw_token_from(&sent[1]);
        drop(sent);

        let first = service
            .consume_token(&first_token, AuthTokenType::EmailVerification, "jamie@example.com")
            .await;
        assert!(matches!(first, Err(AppError::InvalidToken(_))));

        let second = service
            .consume_token(&second_token, AuthTokenType::EmailVerification, "jamie@example.com")
            .await;
        assert!(second.is_ok());
        Ok(())
    }

    #[tokio::test]
    async fn issuance_is_rate_limited_per_user_and_type() -> AppResult<()> {
        let repository = Arc::new(FakeAuthTokenRepository::default());
        let dispatcher = Arc::new(CapturingDispatcher::default());
        let service = service(&repository, &dispatcher);
        let user = user()?;

        for _ in 0..3 {
            service.send_password_reset(&user).await?;
        }
        let fourth = service.send_password_reset(&user).await;
        assert!(matches!(fourth, Err(AppError::Validation(_))));

        // The other token type is unaffected.
        assert!(service.send_email_verification(&user).await.is_ok());
        Ok(())
    }

    #[tokio::test]
    async fn expired_tokens_do_not_consume() -> AppResult<()> {
        let repository = Arc::new(FakeAuthTokenRepository::default());
        let dispatcher = Arc::new(CapturingDispatcher::default());
        let service = service(&repository, &dispatcher);
        let user = user()?;

        service.send_email_verification(&user).await?;
        {
            let mut tokens = repository.tokens.lock().await;
            tokens[0].expires_at = Utc::now() - Duration::hours(1);
        }

        let raw_token = raw_token_from(&dispatcher.sent.lock().await[0]);
        let result = service
            .consume_token(&raw_token, AuthTokenType::EmailVerification, "jamie@example.com")
            .await;
        assert!(matches!(result, Err(AppError::InvalidToken(_))));
        Ok(())
    }
}
