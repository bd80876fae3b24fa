//! User accounts: registration, credential checks, and password changes.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use rolegrid_core::{AppError, AppResult};
use rolegrid_domain::{EmailAddress, UserId, validate_password};

/// One persisted user account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Unique identifier.
    pub id: UserId,
    /// Normalized email address, unique across accounts.
    pub email: EmailAddress,
    /// Optional display name.
    pub full_name: Option<String>,
    /// Optional phone number, stored as given.
    pub phone: Option<String>,
    /// Argon2id password hash.
    pub password_hash: String,
    /// Whether the email address has been verified.
    pub email_verified: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Repository port for the user store.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Persists a new user. Fails with a `Duplicate` error when the email is
    /// already registered.
    async fn insert(&self, user: UserRecord) -> AppResult<()>;

    /// Looks up a user by normalized email.
    async fn find_by_email(&self, email: &EmailAddress) -> AppResult<Option<UserRecord>>;

    /// Looks up a user by id.
    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<UserRecord>>;

    /// Replaces a user's password hash.
    async fn set_password_hash(&self, user_id: UserId, password_hash: &str) -> AppResult<()>;

    /// Marks a user's email address as verified.
    async fn set_email_verified(&self, user_id: UserId) -> AppResult<()>;
}

/// Password hashing port. Implementations must use a memory-hard algorithm.
pub trait PasswordHasher: Send + Sync {
    /// Hashes a plaintext password for storage.
    fn hash(&self, password: &str) -> AppResult<String>;

    /// Verifies a plaintext password against a stored hash.
    fn verify(&self, password: &str, password_hash: &str) -> AppResult<bool>;
}

/// Input to [`UserService::register`].
#[derive(Debug, Clone)]
pub struct RegisterParams {
    /// Email address as submitted; normalized during registration.
    pub email: String,
    /// Plaintext password; validated and hashed, never stored.
    pub password: String,
    /// Optional display name.
    pub full_name: Option<String>,
    /// Optional phone number.
    pub phone: Option<String>,
}

/// Result of a credential check.
///
/// The two failure-adjacent variants are deliberately coarse: callers must
/// not reveal to clients whether the email or the password was wrong.
#[derive(Debug, Clone)]
pub enum LoginOutcome {
    /// Credentials match a verified account.
    Authenticated(UserRecord),
    /// Credentials match, but the email address is unverified.
    EmailNotVerified(UserRecord),
    /// Unknown email or wrong password.
    Failed,
}

/// Application service for user accounts.
#[derive(Clone)]
pub struct UserService {
    repository: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
}

impl UserService {
    /// Creates a user service from its ports.
    #[must_use]
    pub fn new(repository: Arc<dyn UserRepository>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { repository, hasher }
    }

    /// Registers a new account with an unverified email address.
    pub async fn register(&self, params: RegisterParams) -> AppResult<UserRecord> {
        let email = EmailAddress::new(params.email.as_str())?;
        validate_password(&params.password)?;

        let full_name = params
            .full_name
            .map(|name| name.trim().to_owned())
            .filter(|name| !name.is_empty());
        let phone = params
            .phone
            .map(|phone| phone.trim().to_owned())
            .filter(|phone| !phone.is_empty());

        if self.repository.find_by_email(&email).await?.is_some() {
            return Err(AppError::duplicate(
                "EMAIL_EXISTS",
                "an account with this email already exists",
            ));
        }

        let now = Utc::now();
        let user = UserRecord {
            id: UserId::new(),
            email,
            full_name,
            phone,
            password_hash: self.hasher.hash(&params.password)?,
            email_verified: false,
            created_at: now,
            updated_at: now,
        };

        self.repository.insert(user.clone()).await?;
        Ok(user)
    }

    /// Checks an email/password pair.
    ///
    /// Unknown emails still pay the cost of a hash so response timing does
    /// not reveal which accounts exist.
    pub async fn check_credentials(&self, email: &str, password: &str) -> AppResult<LoginOutcome> {
        let Ok(email) = EmailAddress::new(email) else {
            let _ = self.hasher.hash(password)?;
            return Ok(LoginOutcome::Failed);
        };

        let Some(user) = self.repository.find_by_email(&email).await? else {
            let _ = self.hasher.hash(password)?;
            return Ok(LoginOutcome::Failed);
        };

        if !self.hasher.verify(password, &user.password_hash)? {
            return Ok(LoginOutcome::Failed);
        }

        if !user.email_verified {
            return Ok(LoginOutcome::EmailNotVerified(user));
        }

        Ok(LoginOutcome::Authenticated(user))
    }

    /// Looks up a user by email, already normalized or not.
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<UserRecord>> {
        let Ok(email) = EmailAddress::new(email) else {
            return Ok(None);
        };
        self.repository.find_by_email(&email).await
    }

    /// Looks up a user by id.
    pub async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<UserRecord>> {
        self.repository.find_by_id(user_id).await
    }

    /// Validates and stores a new password for a user.
    pub async fn change_password(&self, user_id: UserId, new_password: &str) -> AppResult<()> {
        validate_password(new_password)?;
        let password_hash = self.hasher.hash(new_password)?;
        self.repository
            .set_password_hash(user_id, &password_hash)
            .await
    }

    /// Marks a user's email address as verified.
    pub async fn mark_email_verified(&self, user_id: UserId) -> AppResult<()> {
        self.repository.set_email_verified(user_id).await
    }
}
