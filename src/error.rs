//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid prefix '{0}': must start with '/' and must not end with '/'")]
    InvalidPrefix(String),
    #[error("duplicate view name: {0}")]
    DuplicateViewName(String),
    #[error("unknown view: {0}")]
    UnknownView(String),
    #[error("config load: {0}")]
    Load(String),
    #[error("validation: {0}")]
    Validation(String),
}

/// Failures reported by a [`crate::store::DocumentStore`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("document not found")]
    NotFound,
    #[error("document update conflict: {0}")]
    Conflict(String),
    #[error("document deleted: {0}")]
    Deleted(String),
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    #[error("malformed view: {0}")]
    MalformedView(String),
    #[error("invalid document: {0}")]
    InvalidDocument(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Request path has no route shape under this mount.
    #[error("no such route")]
    RouteNotFound,
    /// Route exists but is disabled in configuration.
    #[error("route disabled")]
    Forbidden,
    /// Route matched but the backend holds nothing for the key.
    #[error("not found: {0}")]
    NotFound(String),
    #[error("backend: {0}")]
    Backend(#[from] StoreError),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("entity has been deleted")]
    EntityDeleted,
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    pub fn status(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            AppError::RouteNotFound | AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
            AppError::Backend(e) => {
                if let StoreError::NotFound = e {
                    (StatusCode::NOT_FOUND, "not_found")
                } else {
                    (StatusCode::INTERNAL_SERVER_ERROR, "backend_error")
                }
            }
            AppError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            AppError::EntityDeleted => (StatusCode::GONE, "deleted"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
        }
    }
}

/// Wire body for every error status. Carries the code only; messages stay in the logs.
#[derive(Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status();
        (status, Json(ErrorBody { error: code })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_not_found_maps_to_404_and_other_backend_errors_to_500() {
        assert_eq!(AppError::Backend(StoreError::NotFound).status().0, StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::Backend(StoreError::Unavailable("connection refused".into())).status().0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(AppError::Forbidden.status().0, StatusCode::FORBIDDEN);
        assert_eq!(AppError::RouteNotFound.status().0, StatusCode::NOT_FOUND);
    }
}
