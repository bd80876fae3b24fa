//! Domain value types for Rolegrid.

#![forbid(unsafe_code)]

mod project;
mod security;
mod user;

pub use project::{ProjectId, ProjectSlug, validate_project_name};
pub use security::{PermissionId, RoleId, SessionId, validate_registry_name};
pub use user::{
    AuthTokenType, EmailAddress, PASSWORD_MAX_LENGTH, PASSWORD_MIN_LENGTH, UserId,
    validate_password,
};
