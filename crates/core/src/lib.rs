//! Shared primitives for all Rust crates in Rolegrid.

#![forbid(unsafe_code)]

/// Authentication primitives shared across services.
pub mod auth;

use std::collections::BTreeMap;

use thiserror::Error;

pub use auth::CallerIdentity;

/// Result type used across Rolegrid crates.
pub type AppResult<T> = Result<T, AppError>;

/// Common application error categories.
///
/// Every variant maps to one stable wire code so HTTP clients can branch on
/// `error.code` without parsing messages.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Invalid input with per-field messages for form surfaces.
    #[error("validation error: {message}")]
    ValidationFields {
        /// Human-readable summary.
        message: String,
        /// Field name to message, for client-side form wiring.
        fields: BTreeMap<String, String>,
    },

    /// Write operation violates a uniqueness constraint.
    #[error("duplicate: {message}")]
    Duplicate {
        /// Stable wire code, e.g. `EMAIL_EXISTS` or `ROLE_EXISTS`.
        code: &'static str,
        /// Human-readable summary.
        message: String,
    },

    /// Requested resource does not exist.
    #[error("not found: {message}")]
    NotFound {
        /// Stable wire code, e.g. `ROLE_NOT_FOUND`.
        code: &'static str,
        /// Human-readable summary.
        message: String,
    },

    /// Caller is not authenticated.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Email/password pair did not match any account.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Bearer token is well-formed but its session no longer exists
    /// (or was deactivated).
    #[error("invalid session: {0}")]
    InvalidSession(String),

    /// Bearer token references a session past its expiry.
    #[error("session expired")]
    TokenExpired,

    /// Account exists but its email address has not been verified yet.
    #[error("email not verified: {0}")]
    EmailNotVerified(String),

    /// Verification or reset token is invalid, expired, or already used.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Caller is authenticated but does not own the resource.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Internal unexpected error. Details are suppressed from clients.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Builds a not-found error with a resource-specific wire code.
    #[must_use]
    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Self::NotFound {
            code,
            message: message.into(),
        }
    }

    /// Builds a duplicate error with a resource-specific wire code.
    #[must_use]
    pub fn duplicate(code: &'static str, message: impl Into<String>) -> Self {
        Self::Duplicate {
            code,
            message: message.into(),
        }
    }

    /// Returns the stable wire code for this error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) | Self::ValidationFields { .. } => "VALIDATION_ERROR",
            Self::Duplicate { code, .. } | Self::NotFound { code, .. } => code,
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::InvalidSession(_) => "INVALID_SESSION",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::EmailNotVerified(_) => "EMAIL_NOT_VERIFIED",
            Self::InvalidToken(_) => "INVALID_TOKEN",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the per-field messages for validation errors, if any.
    #[must_use]
    pub fn fields(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Self::ValidationFields { fields, .. } => Some(fields),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::AppError;

    #[test]
    fn not_found_carries_resource_code() {
        let error = AppError::not_found("ROLE_NOT_FOUND", "role is gone");
        assert_eq!(error.code(), "ROLE_NOT_FOUND");
    }

    #[test]
    fn validation_fields_expose_field_map() {
        let mut fields = BTreeMap::new();
        fields.insert("email".to_owned(), "email is required".to_owned());
        let error = AppError::ValidationFields {
            message: "missing parameters".to_owned(),
            fields,
        };
        assert_eq!(error.code(), "VALIDATION_ERROR");
        assert!(error.fields().is_some_and(|map| map.contains_key("email")));
    }

    #[test]
    fn session_errors_use_distinct_codes() {
        assert_eq!(
            AppError::InvalidSession("gone".to_owned()).code(),
            "INVALID_SESSION"
        );
        assert_eq!(AppError::TokenExpired.code(), "TOKEN_EXPIRED");
    }
}
