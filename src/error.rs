use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    /// Missing or invalid credentials.
    Unauthorized(String),
    /// Authenticated, but the caller's role does not permit the operation.
    NotAuthorized(String),
    /// Delete refused because the owning project is locked by a sign-off.
    DataProtected(String),
    BadRequest(String),
    Conflict(String),
    RateLimited(String),
    /// An external provider failed or answered with something unusable.
    Upstream(String),
    Internal(String),
    Database(sqlx::Error),
}

impl AppError {
    /// Machine-readable error kind, returned alongside the message.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::NotAuthorized(_) => "not_authorized",
            AppError::DataProtected(_) => "data_protected",
            AppError::BadRequest(_) => "bad_request",
            AppError::Conflict(_) => "conflict",
            AppError::RateLimited(_) => "rate_limited",
            AppError::Upstream(_) => "upstream",
            AppError::Internal(_) | AppError::Database(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotAuthorized(_) | AppError::DataProtected(_) => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not Found: {msg}"),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
            AppError::NotAuthorized(msg) => write!(f, "Not Authorized: {msg}"),
            AppError::DataProtected(msg) => write!(f, "Data Protected: {msg}"),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {msg}"),
            AppError::Conflict(msg) => write!(f, "Conflict: {msg}"),
            AppError::RateLimited(msg) => write!(f, "Rate Limited: {msg}"),
            AppError::Upstream(msg) => write!(f, "Upstream Error: {msg}"),
            AppError::Internal(msg) => write!(f, "Internal Error: {msg}"),
            AppError::Database(err) => write!(f, "Database Error: {err}"),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.kind();
        let message = match self {
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                "Internal server error".to_string()
            }
            AppError::Database(err) => {
                tracing::error!("Database error: {err}");
                "Internal server error".to_string()
            }
            AppError::Upstream(msg) => {
                tracing::error!("Upstream error: {msg}");
                "Upstream service unavailable".to_string()
            }
            AppError::NotFound(msg)
            | AppError::Unauthorized(msg)
            | AppError::NotAuthorized(msg)
            | AppError::DataProtected(msg)
            | AppError::BadRequest(msg)
            | AppError::Conflict(msg)
            | AppError::RateLimited(msg) => msg,
        };

        let body = json!({ "success": false, "error": message, "kind": kind });
        (status, axum::Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err)
    }
}
