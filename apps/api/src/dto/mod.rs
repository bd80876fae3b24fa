//! Wire DTOs. Everything serializes camelCase.

mod auth;
mod common;
mod matrix;
mod projects;
mod registry;
mod sessions;

pub use auth::{
    ForgotPasswordRequest, LoginData, LoginRequest, RegisterRequest, ResendVerificationRequest,
    ResetPasswordRequest, UserResponse, VerifyEmailQuery,
};
pub use common::{ApiResponse, ErrorBody};
pub use matrix::{
    MatrixData, PermissionCellResponse, RolePermissionResponse, RoleSubmissionRequest,
    SubmittedCellRequest,
};
pub use projects::{CreateProjectRequest, ProjectResponse, UpdateProjectRequest};
pub use registry::{
    CreateRegistryEntryRequest, RegistryEntryResponse, RegistryListQuery, RenameRegistryEntryRequest,
};
pub use sessions::SessionResponse;
