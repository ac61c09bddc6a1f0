//! Error types for the gateway.
//!
//! Uses `thiserror` for structured error handling with automatic `From` implementations.

use std::time::Duration;

use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::Json;

/// Errors from the backend API client layer.
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    /// HTTP transport error (connection, DNS, TLS, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Middleware error
    #[error("Middleware error: {0}")]
    Middleware(#[from] reqwest_middleware::Error),

    /// Rate limited by the backend (429 response)
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Suggested wait time before retry
        retry_after: Duration,
    },

    /// Service credentials rejected by the backend (401/403 response)
    #[error("Backend rejected service credentials ({status}): {message}")]
    Unauthorized {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },

    /// Resource not found (404 response)
    #[error("Resource not found: {resource}")]
    NotFound {
        /// Description of the missing resource
        resource: String,
    },

    /// Invalid request parameters (400 response)
    #[error("Bad request: {message}")]
    BadRequest {
        /// Error message from API
        message: String,
    },

    /// JSON parsing error
    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    /// Server error (5xx response)
    #[error("Server error ({status}): {message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
    },

    /// Unexpected HTTP status
    #[error("Unexpected status {status}: {message}")]
    UnexpectedStatus {
        /// HTTP status code
        status: u16,
        /// Response body or message
        message: String,
    },
}

impl ClientError {
    /// Create a rate limited error with retry-after duration.
    #[must_use]
    pub fn rate_limited(seconds: u64) -> Self {
        Self::RateLimited { retry_after: Duration::from_secs(seconds) }
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound { resource: resource.into() }
    }

    /// Create a bad request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest { message: message.into() }
    }

    /// Create a server error.
    #[must_use]
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server { status, message: message.into() }
    }

    /// Get the retry-after duration if this is a rate limit error.
    #[must_use]
    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}

/// Errors from the session layer.
#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    /// A stored value does not match the field's type.
    #[error("Session field '{field}' has an unexpected shape: {source}")]
    Decode {
        /// Field name
        field: &'static str,
        /// Underlying serde error
        source: serde_json::Error,
    },

    /// A value could not be encoded for storage.
    #[error("Session field '{field}' could not be stored: {source}")]
    Encode {
        /// Field name
        field: &'static str,
        /// Underlying serde error
        source: serde_json::Error,
    },
}

/// Errors raised while handling an endpoint request.
#[derive(thiserror::Error, Debug)]
pub enum HandlerError {
    /// Backend call failed
    #[error("API error: {0}")]
    Client(#[from] ClientError),

    /// Session read/write failed
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// The incoming request is malformed
    #[error("{description}")]
    BadRequest {
        /// OAuth error code
        error: &'static str,
        /// Human readable description
        description: String,
    },

    /// A presented access token was rejected
    #[error("Access token rejected ({status})")]
    TokenRejected {
        /// HTTP status to answer with
        status: StatusCode,
        /// `WWW-Authenticate` challenge
        challenge: Option<String>,
        /// Fresh DPoP nonce, if the backend issued one
        dpop_nonce: Option<String>,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal handler logic error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HandlerError {
    /// Create an `invalid_request` error.
    #[must_use]
    pub fn invalid_request(description: impl Into<String>) -> Self {
        Self::BadRequest { error: "invalid_request", description: description.into() }
    }

    /// Create a bad request error with a specific OAuth error code.
    #[must_use]
    pub fn bad_request(error: &'static str, description: impl Into<String>) -> Self {
        Self::BadRequest { error, description: description.into() }
    }

    /// Create an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// HTTP status this error maps to.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::TokenRejected { status, .. } => *status,
            Self::Client(ClientError::RateLimited { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Client(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// OAuth error code for the response body.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest { error, .. } => *error,
            Self::TokenRejected { .. } => "invalid_token",
            Self::Client(ClientError::RateLimited { .. }) => "temporarily_unavailable",
            _ => "server_error",
        }
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let status = self.status();

        // RFC 6750: the challenge travels in the header, the body stays empty.
        if let Self::TokenRejected { ref challenge, ref dpop_nonce, .. } = self {
            tracing::debug!(%status, "Access token rejected");
            let mut response = status.into_response();
            let headers = response.headers_mut();
            headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
            headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
            if let Some(value) = challenge.as_deref().and_then(|c| HeaderValue::from_str(c).ok()) {
                headers.insert(header::WWW_AUTHENTICATE, value);
            }
            if let Some(value) = dpop_nonce.as_deref().and_then(|n| HeaderValue::from_str(n).ok()) {
                headers.insert("dpop-nonce", value);
            }
            return response;
        }

        if status.is_server_error() {
            tracing::error!(error = %self, "Request handling failed");
        } else {
            tracing::debug!(error = %self, "Rejected request");
        }

        let mut response = (
            status,
            Json(serde_json::json!({
                "error": self.error_code(),
                "error_description": self.to_string()
            })),
        )
            .into_response();

        let headers = response.headers_mut();
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
        headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
        if let Self::Client(ref err) = self {
            if let Some(retry_after) = err.retry_after() {
                headers.insert(header::RETRY_AFTER, HeaderValue::from(retry_after.as_secs()));
            }
        }
        response
    }
}

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Result type alias for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Result type alias for handler operations.
pub type HandlerResult<T> = Result<T, HandlerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_retry_after() {
        let err = ClientError::rate_limited(60);
        assert_eq!(err.retry_after(), Some(Duration::from_secs(60)));

        let err = ClientError::not_found("service");
        assert_eq!(err.retry_after(), None);
    }

    #[test]
    fn test_handler_error_status() {
        assert_eq!(HandlerError::invalid_request("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            HandlerError::from(ClientError::server(503, "down")).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(HandlerError::internal("x").status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_rate_limited_response_carries_retry_after() {
        let response = HandlerError::from(ClientError::rate_limited(30)).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers()[header::RETRY_AFTER], "30");

        let response = HandlerError::from(ClientError::server(500, "down")).into_response();
        assert!(response.headers().get(header::RETRY_AFTER).is_none());
    }

    #[test]
    fn test_token_rejected_response() {
        let err = HandlerError::TokenRejected {
            status: StatusCode::FORBIDDEN,
            challenge: Some("Bearer error=\"insufficient_scope\"".to_string()),
            dpop_nonce: Some("n-1".to_string()),
        };
        assert_eq!(err.status(), StatusCode::FORBIDDEN);

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            response.headers()[header::WWW_AUTHENTICATE],
            "Bearer error=\"insufficient_scope\""
        );
        assert_eq!(response.headers()["dpop-nonce"], "n-1");
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
    }

    #[test]
    fn test_handler_error_code() {
        let err = HandlerError::bad_request("unsupported_credential_format", "nope");
        assert_eq!(err.error_code(), "unsupported_credential_format");
        assert_eq!(err.to_string(), "nope");
    }
}
