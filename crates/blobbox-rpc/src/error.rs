use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use blobbox_storage::StorageError;
use thiserror::Error;
use tracing::{error, warn};

/// Failures reported through the HTTP status with an empty body. Handler
/// level failures never end up here; they travel inside the envelope.
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("Request method not allowed: {0}")]
    MethodNotAllowed(String),

    #[error("Unknown operation: {0:?}")]
    UnknownOperation(String),

    #[error("Unreadable request body: {0}")]
    UnreadableBody(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type Result<T> = std::result::Result<T, RpcError>;

impl RpcError {
    pub fn status(&self) -> StatusCode {
        match self {
            RpcError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            RpcError::UnknownOperation(_) | RpcError::UnreadableBody(_) => StatusCode::BAD_REQUEST,
            RpcError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        match &self {
            RpcError::Storage(e) => error!(error = %e, "request aborted by storage failure"),
            other => warn!(error = %other, "request rejected"),
        }
        self.status().into_response()
    }
}
