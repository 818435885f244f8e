//! Uniform error envelope for the HTTP surface

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Machine-readable error kinds exposed to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    ValidationError,
    UnknownProvider,
    UnsupportedCapability,
    AuthenticationError,
    UpstreamError,
    CacheError,
    InternalError,
}

impl std::fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ValidationError => write!(f, "validation_error"),
            Self::UnknownProvider => write!(f, "unknown_provider"),
            Self::UnsupportedCapability => write!(f, "unsupported_capability"),
            Self::AuthenticationError => write!(f, "authentication_error"),
            Self::UpstreamError => write!(f, "upstream_error"),
            Self::CacheError => write!(f, "cache_error"),
            Self::InternalError => write!(f, "internal_error"),
        }
    }
}

/// Envelope serialized to clients: `{"error": {...}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub kind: ApiErrorKind,
    pub message: String,
    /// Status the upstream provider answered with, when there was one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_status: Option<u16>,
}

/// API error with status code
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub response: ApiErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            status,
            response: ApiErrorResponse {
                error: ApiErrorDetail {
                    kind,
                    message: message.into(),
                    provider_status: None,
                },
            },
        }
    }

    pub fn with_provider_status(mut self, status: Option<u16>) -> Self {
        self.response.error.provider_status = status;
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ApiErrorKind::ValidationError, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            ApiErrorKind::AuthenticationError,
            message,
        )
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ApiErrorKind::InternalError,
            message,
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.response)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation { message } => Self::bad_request(message),
            DomainError::UnknownProvider { name } => Self::new(
                StatusCode::NOT_FOUND,
                ApiErrorKind::UnknownProvider,
                format!("Unknown provider: {}", name),
            ),
            DomainError::UnsupportedCapability { provider, message } => Self::new(
                StatusCode::BAD_REQUEST,
                ApiErrorKind::UnsupportedCapability,
                format!("{}: {}", provider, message),
            ),
            DomainError::Upstream {
                provider,
                status,
                message,
            } => Self::new(
                StatusCode::BAD_GATEWAY,
                ApiErrorKind::UpstreamError,
                format!("{}: {}", provider, message),
            )
            .with_provider_status(status),
            DomainError::Cache { message } => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiErrorKind::CacheError,
                message,
            ),
            DomainError::Configuration { message } | DomainError::Internal { message } => {
                Self::internal(message)
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}",
            self.response.error.kind, self.response.error.message
        )
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_400() {
        let api_err: ApiError = DomainError::validation("payload must be an object").into();

        assert_eq!(api_err.status, StatusCode::BAD_REQUEST);
        assert_eq!(api_err.response.error.kind, ApiErrorKind::ValidationError);
    }

    #[test]
    fn test_unknown_provider_maps_to_404() {
        let api_err: ApiError = DomainError::unknown_provider("nope").into();

        assert_eq!(api_err.status, StatusCode::NOT_FOUND);
        assert_eq!(api_err.response.error.kind, ApiErrorKind::UnknownProvider);
        assert!(api_err.response.error.message.contains("nope"));
    }

    #[test]
    fn test_upstream_preserves_provider_status() {
        let api_err: ApiError =
            DomainError::upstream("p1", Some(429), "rate limited").into();

        assert_eq!(api_err.status, StatusCode::BAD_GATEWAY);
        assert_eq!(api_err.response.error.provider_status, Some(429));
    }

    #[test]
    fn test_envelope_serialization() {
        let err = ApiError::unauthorized("Invalid API key");
        let json = serde_json::to_string(&err.response).unwrap();

        assert!(json.contains("\"error\""));
        assert!(json.contains("authentication_error"));
        assert!(!json.contains("provider_status"));
    }

    #[test]
    fn test_upstream_without_status_omits_field() {
        let api_err: ApiError = DomainError::upstream("p1", None, "connect refused").into();
        let json = serde_json::to_string(&api_err.response).unwrap();

        assert!(!json.contains("provider_status"));
    }
}
