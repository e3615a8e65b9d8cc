// FICHIER : src-server/src/api/error.rs

use crate::utils::AppError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, warn};

/// Corps d'erreur STAC : `{ "code": "NotFoundError", "description": "..." }`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub description: String,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self.root() {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::StorageTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "ConfigError",
            AppError::Io(_) => "IoError",
            AppError::Validation(_) => "ValidationError",
            AppError::NotFound(_) => "NotFoundError",
            AppError::Conflict(_) => "ConflictError",
            AppError::StorageUnavailable(_) => "StorageUnavailableError",
            AppError::StorageTimeout { .. } => "StorageTimeoutError",
            AppError::Storage { .. } => "StorageError",
            AppError::Serialization(_) => "SerializationError",
            AppError::System(_) => "SystemError",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("❌ {} : {}", status, self);
        } else {
            warn!("⚠️ {} : {}", status, self);
        }

        let body = ErrorBody {
            code: self.code().to_string(),
            description: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
