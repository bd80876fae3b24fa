//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod argon2_password_hasher;
mod channel_email_dispatcher;
mod console_email_service;
mod postgres_auth_token_repository;
mod postgres_matrix_repository;
mod postgres_project_repository;
mod postgres_registry_repository;
mod postgres_session_repository;
mod postgres_user_repository;
mod smtp_email_service;

pub use argon2_password_hasher::Argon2PasswordHasher;
pub use channel_email_dispatcher::ChannelEmailDispatcher;
pub use console_email_service::ConsoleEmailService;
pub use postgres_auth_token_repository::PostgresAuthTokenRepository;
pub use postgres_matrix_repository::PostgresMatrixRepository;
pub use postgres_project_repository::PostgresProjectRepository;
pub use postgres_registry_repository::PostgresRegistryRepository;
pub use postgres_session_repository::PostgresSessionRepository;
pub use postgres_user_repository::PostgresUserRepository;
pub use smtp_email_service::{SmtpEmailConfig, SmtpEmailService};
