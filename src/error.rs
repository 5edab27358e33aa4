//! EventDesk error types
//!
//! Every failure of the event core is a typed variant of [`Error`]. The HTTP
//! layer maps variants to status codes through the `IntoResponse` impl.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Authentication failure reported by the identity resolver
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No bearer credential was supplied
    #[error("No token, authorization denied")]
    MissingCredential,

    /// The credential could not be verified or names an unknown actor
    #[error("Invalid or expired token: {0}")]
    InvalidCredential(String),
}

/// EventDesk error type
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or incomplete input; lists the offending fields
    #[error("Validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),

    /// An event with the same (title, date) already exists
    #[error("Event already exists ({existing_id})")]
    Conflict { existing_id: String },

    /// Unknown resource
    #[error("{0} not found")]
    NotFound(String),

    /// Authenticated but not allowed
    #[error("Not authorized: {0}")]
    Forbidden(String),

    /// Missing or invalid credential
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Malformed query parameters
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// Persistence collaborator failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Notification delivery error
    #[error("Notification error: {0}")]
    Notification(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parse error
    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type alias for EventDesk operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidFilter(_) => StatusCode::BAD_REQUEST,
            Self::Auth(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidFilter(_) => "INVALID_FILTER",
            Self::Auth(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict { .. } => "CONFLICT",
            _ => "INTERNAL_ERROR",
        }
    }
}

/// API error response body
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

/// API error detail
#[derive(Debug, Serialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
}

impl From<&Error> for ApiError {
    fn from(err: &Error) -> Self {
        let fields = match err {
            Error::Validation(fields) => fields.clone(),
            _ => Vec::new(),
        };
        // Internal details stay in the logs
        let message = if err.status().is_server_error() {
            "Internal server error".to_string()
        } else {
            err.to_string()
        };
        Self {
            error: ApiErrorDetail {
                code: err.code().to_string(),
                message,
                fields,
            },
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        (status, Json(ApiError::from(&self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            Error::Validation(vec!["title".into()]).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::Conflict { existing_id: "evt-1".into() }.status(),
            StatusCode::CONFLICT
        );
        assert_eq!(Error::NotFound("Event".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(Error::Forbidden("x".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(
            Error::Auth(AuthError::MissingCredential).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            Error::InvalidFilter("lat".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::Storage("disk full".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_api_error_includes_validation_fields() {
        let err = Error::Validation(vec!["title".into(), "date".into()]);
        let json = serde_json::to_value(ApiError::from(&err)).unwrap();
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(json["error"]["fields"][0], "title");
        assert_eq!(json["error"]["fields"][1], "date");
    }

    #[test]
    fn test_api_error_hides_storage_detail() {
        let err = Error::Storage("/var/lib/events: permission denied".into());
        let json = serde_json::to_value(ApiError::from(&err)).unwrap();
        assert_eq!(json["error"]["code"], "INTERNAL_ERROR");
        assert!(!json["error"]["message"]
            .as_str()
            .unwrap()
            .contains("permission"));
        assert!(json["error"].get("fields").is_none());
    }
}
