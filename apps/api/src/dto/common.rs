//! The response envelope every endpoint speaks.

use std::collections::BTreeMap;

use rolegrid_core::AppError;
use serde::Serialize;

use crate::request_id::current_request_id;

/// Error payload carried inside a failure envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, String>>,
}

/// Uniform response envelope.
///
/// `data` and `error` are mutually exclusive; `requestId` matches the
/// `X-Request-ID` response header.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    pub timestamp: String,
    pub request_id: String,
}

impl<T: Serialize> ApiResponse<T> {
    /// Builds a success envelope carrying data.
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
            request_id: current_request_id(),
        }
    }
}

impl ApiResponse<()> {
    /// Builds a success envelope without data.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
            request_id: current_request_id(),
        }
    }

    /// Builds a failure envelope from an application error.
    ///
    /// Internal errors are reported with a generic message; everything
    /// else carries the error's own text and stable code.
    pub fn from_error(error: &AppError) -> Self {
        let message = match error {
            AppError::Internal(_) => "an unexpected error occurred".to_owned(),
            other => other.to_string(),
        };

        Self {
            success: false,
            message: message.clone(),
            data: None,
            error: Some(ErrorBody {
                code: error.code().to_owned(),
                details: match error {
                    AppError::Internal(_) => None,
                    _ => Some(message),
                },
                fields: error.fields().cloned(),
            }),
            timestamp: chrono::Utc::now().to_rfc3339(),
            request_id: current_request_id(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use rolegrid_core::AppError;

    use super::ApiResponse;

    #[test]
    fn success_envelope_has_data_and_no_error() {
        let envelope = ApiResponse::ok("created", vec![1, 2, 3]);
        let value = serde_json::to_value(&envelope).unwrap_or_else(|_| panic!("serialize"));

        assert_eq!(value["success"], true);
        assert_eq!(value["message"], "created");
        assert_eq!(value["data"], serde_json::json!([1, 2, 3]));
        assert!(value.get("error").is_none());
        assert!(value["requestId"].is_string());
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn failure_envelope_carries_the_stable_code() {
        let error = AppError::duplicate("EMAIL_EXISTS", "already registered");
        let envelope = ApiResponse::from_error(&error);
        let value = serde_json::to_value(&envelope).unwrap_or_else(|_| panic!("serialize"));

        assert_eq!(value["success"], false);
        assert_eq!(value["error"]["code"], "EMAIL_EXISTS");
        assert!(value.get("data").is_none());
    }

    #[test]
    fn field_errors_surface_in_the_envelope() {
        let mut fields = BTreeMap::new();
        fields.insert("email".to_owned(), "email is required".to_owned());
        let error = AppError::ValidationFields {
            message: "missing parameters".to_owned(),
            fields,
        };

        let envelope = ApiResponse::from_error(&error);
        let value = serde_json::to_value(&envelope).unwrap_or_else(|_| panic!("serialize"));

        assert_eq!(value["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(value["error"]["fields"]["email"], "email is required");
    }

    #[test]
    fn internal_errors_are_not_leaked() {
        let error = AppError::Internal("database password wrong".to_owned());
        let envelope = ApiResponse::from_error(&error);
        let value = serde_json::to_value(&envelope).unwrap_or_else(|_| panic!("serialize"));

        assert_eq!(value["error"]["code"], "INTERNAL_ERROR");
        assert!(
            !value["message"]
                .as_str()
                .unwrap_or_default()
                .contains("password")
        );
    }
}
