use std::sync::atomic::{AtomicBool, Ordering};

use axum::extract::rejection::{BytesRejection, JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use service::auth::errors::AuthError;
use service::errors::ServiceError;
use thiserror::Error;
use tracing::{error, warn};

static DIAGNOSTIC_ERRORS: AtomicBool = AtomicBool::new(false);

/// When on, 5xx responses carry the underlying error text instead of a generic message.
pub fn set_diagnostic_errors(on: bool) {
    DIAGNOSTIC_ERRORS.store(on, Ordering::Relaxed);
}

const GENERIC_DETAIL: &str = "An unexpected error occurred";

#[derive(Serialize)]
struct ErrorBody<'a> {
    status: u16,
    title: &'a str,
    error: &'a str,
}

/// Error payload returned by every handler: `{"status", "title", "error"}`.
#[derive(Debug)]
pub struct JsonApiError {
    pub status: StatusCode,
    pub title: &'static str,
    pub detail: String,
}

impl JsonApiError {
    pub fn new(status: StatusCode, title: &'static str, detail: impl Into<String>) -> Self {
        Self { status, title, detail: detail.into() }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self { Self::new(StatusCode::BAD_REQUEST, "Validation Error", detail) }

    pub fn unauthorized(detail: impl Into<String>) -> Self { Self::new(StatusCode::UNAUTHORIZED, "Authentication Error", detail) }

    pub fn internal(detail: impl Into<String>) -> Self { Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Service Error", detail) }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        common::metrics::record_http_error(self.status.as_u16());
        let detail = if self.status.is_server_error() {
            error!(status = self.status.as_u16(), error = %self.detail, "request failed");
            if DIAGNOSTIC_ERRORS.load(Ordering::Relaxed) { self.detail.as_str() } else { GENERIC_DETAIL }
        } else {
            self.detail.as_str()
        };
        let body = ErrorBody { status: self.status.as_u16(), title: self.title, error: detail };
        (self.status, Json(body)).into_response()
    }
}

impl From<ServiceError> for JsonApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Validation(m) => Self::bad_request(m),
            ServiceError::NotFound(m) => Self::new(StatusCode::NOT_FOUND, "Not Found", m),
            ServiceError::Forbidden(m) => Self::new(StatusCode::FORBIDDEN, "Authorization Error", m),
            ServiceError::Unauthorized(m) => Self::unauthorized(m),
            ServiceError::Model(models::errors::ModelError::Validation(m)) => Self::bad_request(m),
            other => Self::internal(other.to_string()),
        }
    }
}

impl From<AuthError> for JsonApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Unauthorized => Self::unauthorized("Invalid email or password"),
            AuthError::Inactive => Self::unauthorized("Account is inactive"),
            AuthError::TokenError(m) => {
                warn!(error = %m, "token rejected");
                Self::unauthorized("Invalid or expired token")
            }
            other => ServiceError::from(other).into(),
        }
    }
}

// 框架层的提取失败统一按校验错误返回
impl From<JsonRejection> for JsonApiError {
    fn from(e: JsonRejection) -> Self {
        Self::bad_request(e.body_text())
    }
}

impl From<PathRejection> for JsonApiError {
    fn from(e: PathRejection) -> Self {
        Self::bad_request(e.body_text())
    }
}

impl From<QueryRejection> for JsonApiError {
    fn from(e: QueryRejection) -> Self {
        Self::bad_request(e.body_text())
    }
}

impl From<BytesRejection> for JsonApiError {
    fn from(e: BytesRejection) -> Self {
        Self::new(e.status(), "Validation Error", e.body_text())
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("runtime check failed: {0}")]
    Runtime(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}
