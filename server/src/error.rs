use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use storage::error::StorageError;

/// REST-layer errors: axum's `IntoResponse` counterpart of a typical
/// actix `ResponseError` impl, ported to axum's trait.
#[derive(Debug)]
pub enum WebError {
    Storage(StorageError),
    BadRequest(String),
    NotFound(String),
}

impl std::fmt::Display for WebError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "storage error: {e}"),
            Self::BadRequest(msg) => write!(f, "bad request: {msg}"),
            Self::NotFound(msg) => write!(f, "not found: {msg}"),
        }
    }
}

impl From<StorageError> for WebError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err)
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Storage(StorageError::NotFound) => (StatusCode::NOT_FOUND, "resource not found".to_string()),
            Self::Storage(StorageError::ConstraintViolation(msg)) => (StatusCode::CONFLICT, msg.clone()),
            Self::Storage(StorageError::BadInput(msg)) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Storage(StorageError::StateConflict(msg)) => (StatusCode::CONFLICT, msg.clone()),
            Self::Storage(StorageError::NotReady(msg)) => (StatusCode::from_u16(425).unwrap(), msg.clone()),
            Self::Storage(e @ (StorageError::Database(_) | StorageError::Migration(_))) => {
                tracing::error!(%e, "internal storage error");
                (StatusCode::INTERNAL_SERVER_ERROR, "an internal error occurred".to_string())
            }
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub type WebResult<T> = Result<T, WebError>;
