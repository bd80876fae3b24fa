//! Application services and ports.

#![forbid(unsafe_code)]

mod auth_token_service;
mod matrix_service;
mod project_service;
mod registry_service;
mod session_service;
mod token_crypto;
mod user_service;

pub use auth_token_service::{
    AuthTokenRecord, AuthTokenRepository, AuthTokenService, EmailDispatcher, EmailMessage,
    EmailService,
};
pub use matrix_service::{
    AssignmentCellRecord, MatrixCellEntry, MatrixCellSubmission, MatrixRepository,
    MatrixRoleSubmission, MatrixService, RoleMatrixEntry,
};
pub use project_service::{ProjectRecord, ProjectRepository, ProjectService, UpdateProjectInput};
pub use registry_service::{
    PermissionRecord, RegistryRepository, RegistryService, RoleRecord,
};
pub use session_service::{
    IssuedSession, SessionRecord, SessionRepository, SessionService,
};
pub use user_service::{
    LoginOutcome, PasswordHasher, RegisterParams, UserRecord, UserRepository, UserService,
};
