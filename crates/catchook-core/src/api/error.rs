use std::collections::BTreeMap;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Field name → human-readable message, as sent in a validation failure
pub type FieldErrors = BTreeMap<String, String>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("{message}")]
    Validation {
        status: StatusCode,
        message: String,
        errors: FieldErrors,
    },

    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    #[error("Server error ({status}) - please try again later")]
    ServerError { status: StatusCode, message: String },

    #[error("Unable to reach the server: {0}")]
    Network(String),

    #[error("Request timed out - please try again")]
    Timeout,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Session expired - please log in again")]
    SessionExpired,

    #[error("Failed to persist session: {0}")]
    Storage(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Error body shapes the backend produces: `{error:{code,message}}`,
/// `{message, errors:{field: msg}}` or a bare `{message}`.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<ErrorDetail>,
    #[serde(default)]
    errors: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Build the error for a non-success response, rewriting the message to
    /// the backend's human-readable text when the body is structured.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();

        let field_errors: Option<FieldErrors> = parsed.errors.as_ref().and_then(|v| {
            v.as_object().map(|map| {
                map.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect()
            })
        });

        let detail_message = parsed
            .error
            .and_then(|e| e.message)
            .filter(|m| !m.is_empty());

        let message = detail_message
            .or_else(|| {
                field_errors
                    .as_ref()
                    .filter(|e| !e.is_empty())
                    .map(|e| e.values().cloned().collect::<Vec<_>>().join(", "))
            })
            .or_else(|| parsed.message.clone().filter(|m| !m.is_empty()))
            .unwrap_or_else(|| {
                let truncated = Self::truncate_body(body.trim());
                if truncated.is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("Request failed")
                        .to_string()
                } else {
                    truncated
                }
            });

        if let Some(errors) = field_errors.filter(|e| !e.is_empty()) {
            return ApiError::Validation {
                status,
                message,
                errors,
            };
        }

        match status.as_u16() {
            401 => ApiError::Unauthorized(message),
            403 => ApiError::AccessDenied(message),
            404 => ApiError::NotFound(message),
            500..=599 => ApiError::ServerError { status, message },
            _ => ApiError::Rejected { status, message },
        }
    }

    /// HTTP status behind this error, when one was received
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Unauthorized(_) | ApiError::SessionExpired => Some(StatusCode::UNAUTHORIZED),
            ApiError::AccessDenied(_) => Some(StatusCode::FORBIDDEN),
            ApiError::NotFound(_) => Some(StatusCode::NOT_FOUND),
            ApiError::Validation { status, .. }
            | ApiError::Rejected { status, .. }
            | ApiError::ServerError { status, .. } => Some(*status),
            ApiError::Network(_)
            | ApiError::Timeout
            | ApiError::InvalidResponse(_)
            | ApiError::Storage(_) => None,
        }
    }

    /// Field-keyed validation errors for form display
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            ApiError::Validation { errors, .. } => Some(errors),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else if e.is_decode() {
            ApiError::InvalidResponse(e.to_string())
        } else {
            ApiError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::InvalidResponse(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_detail_message_wins() {
        let body = r#"{"success":false,"error":{"code":"INVALID_CREDENTIALS","message":"Invalid email or password"}}"#;
        let err = ApiError::from_status(StatusCode::UNAUTHORIZED, body);
        assert!(matches!(err, ApiError::Unauthorized(_)));
        assert_eq!(err.to_string(), "Invalid email or password");
        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn test_validation_errors_keep_status_and_fields() {
        let body = r#"{"success":false,"message":"Validation failed","errors":{"email":"Email is already taken","password":"Too short"},"timestamp":"2025-01-01T00:00:00Z"}"#;
        let err = ApiError::from_status(StatusCode::UNPROCESSABLE_ENTITY, body);
        assert_eq!(err.status(), Some(StatusCode::UNPROCESSABLE_ENTITY));
        let fields = err.field_errors().unwrap();
        assert_eq!(fields.get("email").map(String::as_str), Some("Email is already taken"));
        // BTreeMap joins in key order
        assert_eq!(err.to_string(), "Email is already taken, Too short");
    }

    #[test]
    fn test_non_string_field_errors_are_skipped() {
        let body = r#"{"message":"Bad input","errors":{"age":42}}"#;
        let err = ApiError::from_status(StatusCode::BAD_REQUEST, body);
        assert!(err.field_errors().is_none());
        assert_eq!(err.to_string(), "Bad input");
        assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
    }

    #[test]
    fn test_plain_text_body() {
        let err = ApiError::from_status(StatusCode::BAD_GATEWAY, "upstream down");
        match err {
            ApiError::ServerError { status, ref message } => {
                assert_eq!(status, StatusCode::BAD_GATEWAY);
                assert_eq!(message, "upstream down");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_empty_body_uses_reason() {
        let err = ApiError::from_status(StatusCode::NOT_FOUND, "");
        assert_eq!(err.to_string(), "Resource not found: Not Found");
    }

    #[test]
    fn test_truncate_body() {
        let long = "x".repeat(MAX_ERROR_BODY_LENGTH + 20);
        let truncated = ApiError::truncate_body(&long);
        assert!(truncated.starts_with(&"x".repeat(MAX_ERROR_BODY_LENGTH)));
        assert!(truncated.ends_with("(truncated, 520 total bytes)"));
    }
}
