// HTTP API Error Types
use axum::{extract::rejection::JsonRejection, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::identity::IdentityError;
use crate::services::ServiceError;
use crate::store::StoreError;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    // 400 Bad Request
    InvalidInput(String),

    // 401 Unauthorized
    Unauthenticated(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 500 Internal Server Error (identity service)
    UpstreamFailure { message: String, details: String },

    // 500 Internal Server Error (document store)
    StoreFailure { message: String, details: String },
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::UpstreamFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::StoreFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::InvalidInput(msg) => msg,
            ApiError::Unauthenticated(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::UpstreamFailure { message, .. } => message,
            ApiError::StoreFailure { message, .. } => message,
        }
    }

    pub fn details(&self) -> Option<&str> {
        match self {
            ApiError::UpstreamFailure { details, .. } | ApiError::StoreFailure { details, .. } => Some(details),
            _ => None,
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "success": false,
            "error": self.message(),
        });
        if let Some(details) = self.details() {
            body["details"] = json!(details);
        }
        body
    }
}

// Static constructor methods
impl ApiError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        ApiError::InvalidInput(message.into())
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        ApiError::Unauthenticated(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn upstream_failure(message: impl Into<String>, details: impl Into<String>) -> Self {
        ApiError::UpstreamFailure {
            message: message.into(),
            details: details.into(),
        }
    }

    pub fn store_failure(message: impl Into<String>, details: impl Into<String>) -> Self {
        ApiError::StoreFailure {
            message: message.into(),
            details: details.into(),
        }
    }
}

// Convert other error types to ApiError
impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::InvalidCredential => ApiError::unauthenticated("Invalid or expired token"),
            IdentityError::Rejected(msg) => ApiError::unauthenticated(msg),
            IdentityError::Unavailable(msg) => {
                tracing::error!("Identity service error: {}", msg);
                ApiError::upstream_failure("Failed to authenticate user", msg)
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        tracing::error!("Document store error: {}", err);
        ApiError::store_failure("Document store request failed", err.to_string())
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidInput(msg) => ApiError::invalid_input(msg),
            ServiceError::Forbidden(msg) => ApiError::forbidden(msg),
            ServiceError::NotFound(msg) => ApiError::not_found(msg),
            ServiceError::Upstream(msg) => {
                tracing::error!("Identity service error: {}", msg);
                ApiError::upstream_failure("Identity service request failed", msg)
            }
            ServiceError::Store(err) => err.into(),
            ServiceError::Contention(msg) => {
                tracing::error!("{}", msg);
                ApiError::store_failure("Failed to update trip", msg)
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::invalid_input(rejection.body_text())
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}
