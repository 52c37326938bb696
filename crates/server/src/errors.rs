use std::time::Duration;

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

use service::auth::errors::AuthError;
use service::errors::ServiceError;
use service::storage::StorageError;

/// Error returned by handlers: `{"error": <title>, "detail": <message>}`.
#[derive(Debug)]
pub struct JsonApiError {
    pub status: StatusCode,
    pub error: String,
    pub detail: Option<String>,
    retry_after: Option<Duration>,
}

impl JsonApiError {
    pub fn new(status: StatusCode, error: impl Into<String>, detail: Option<String>) -> Self {
        Self { status, error: error.into(), detail, retry_after: None }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Bad Request", Some(detail.into()))
    }

    pub fn validation(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, "Validation Error", Some(detail.into()))
    }

    pub fn unauthorized(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized", Some(detail.into()))
    }

    pub fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN, "Forbidden", Some("Operation forbidden: insufficient permissions.".into()))
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "Not Found", Some(detail.into()))
    }

    pub fn conflict(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, "Conflict", Some(detail.into()))
    }

    pub fn too_many_requests(retry_after: Duration) -> Self {
        let mut e = Self::new(StatusCode::TOO_MANY_REQUESTS, "Too Many Requests", Some("Rate limit exceeded".into()));
        e.retry_after = Some(retry_after);
        e
    }

    /// The cause is logged; clients only see a generic message.
    pub fn internal(cause: impl std::fmt::Display) -> Self {
        error!(error = %cause, "internal error");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error", None)
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.error, "detail": self.detail });
        let mut resp = (self.status, Json(body)).into_response();
        if self.status == StatusCode::UNAUTHORIZED {
            resp.headers_mut().insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        if let Some(after) = self.retry_after {
            let secs = after.as_secs().max(1);
            if let Ok(v) = HeaderValue::from_str(&secs.to_string()) {
                resp.headers_mut().insert(header::RETRY_AFTER, v);
            }
        }
        resp
    }
}

impl From<ServiceError> for JsonApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Validation(m) => Self::validation(m),
            ServiceError::NotFound(m) => Self::not_found(m),
            ServiceError::Conflict(m) => Self::conflict(m),
            ServiceError::Db(_) | ServiceError::Storage(_) => Self::internal(e),
        }
    }
}

impl From<AuthError> for JsonApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Validation(m) => Self::validation(m),
            AuthError::Conflict(m) => Self::conflict(m),
            AuthError::NotFound(m) => Self::not_found(m),
            AuthError::Unauthorized(m) => Self::unauthorized(m),
            AuthError::InvalidToken(m) => Self::bad_request(m),
            AuthError::Verification => Self::bad_request(e.to_string()),
            AuthError::HashError(_) | AuthError::TokenError(_) | AuthError::Repository(_) => {
                error!(code = e.code(), "auth failure");
                Self::internal(e)
            }
        }
    }
}

impl From<StorageError> for JsonApiError {
    fn from(e: StorageError) -> Self {
        Self::internal(e)
    }
}

/// Failures that abort startup before the server accepts connections.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("storage root unavailable: {0}")]
    Storage(#[from] StorageError),
    #[error("database setup failed: {0}")]
    Database(String),
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_errors_map_to_status() {
        assert_eq!(JsonApiError::from(ServiceError::Validation("x".into())).status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(JsonApiError::from(ServiceError::Conflict("x".into())).status, StatusCode::CONFLICT);
        assert_eq!(JsonApiError::from(ServiceError::not_found("contact")).status, StatusCode::NOT_FOUND);
        assert_eq!(JsonApiError::from(ServiceError::Db("boom".into())).status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn auth_errors_map_to_status() {
        assert_eq!(JsonApiError::from(AuthError::Unauthorized("no".into())).status, StatusCode::UNAUTHORIZED);
        assert_eq!(JsonApiError::from(AuthError::Verification).status, StatusCode::BAD_REQUEST);
        assert_eq!(JsonApiError::from(AuthError::Conflict("dup".into())).status, StatusCode::CONFLICT);
    }

    #[test]
    fn rate_limited_response_carries_retry_after() {
        let resp = JsonApiError::too_many_requests(Duration::from_millis(1500)).into_response();
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(resp.headers().get(header::RETRY_AFTER).and_then(|v| v.to_str().ok()), Some("1"));
    }

    #[test]
    fn unauthorized_sets_www_authenticate() {
        let resp = JsonApiError::unauthorized("Could not validate credentials").into_response();
        assert_eq!(resp.headers().get(header::WWW_AUTHENTICATE).and_then(|v| v.to_str().ok()), Some("Bearer"));
    }
}
