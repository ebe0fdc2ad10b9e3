//! Maps domain `AppError` to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Map, Value};

use pdfdesk_core::error::{AppError, ErrorKind};

/// Handler error: an `AppError` rendered as a JSON error body.
#[derive(Debug)]
pub struct ApiError(pub AppError);

/// Result type returned by handlers.
pub type ApiResult<T> = Result<T, ApiError>;

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

/// HTTP status for an error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidInput | ErrorKind::Authentication => StatusCode::BAD_REQUEST,
        ErrorKind::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        ErrorKind::NotImplemented => StatusCode::NOT_IMPLEMENTED,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::RateLimit => StatusCode::TOO_MANY_REQUESTS,
        ErrorKind::Processing
        | ErrorKind::Storage
        | ErrorKind::Configuration
        | ErrorKind::Serialization
        | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status = status_for(err.kind);

        let message = match err.kind {
            ErrorKind::Internal => {
                tracing::error!(error = %err.message, source = ?err.source, "Internal server error");
                "Internal server error".to_string()
            }
            ErrorKind::Storage | ErrorKind::Configuration | ErrorKind::Serialization => {
                tracing::error!(code = err.kind.code(), error = %err.message, source = ?err.source, "Server error");
                err.message
            }
            ErrorKind::Processing => {
                tracing::warn!(error = %err.message, source = ?err.source, "Processing failed");
                err.message
            }
            _ => err.message,
        };

        let mut body = Map::new();
        body.insert("success".into(), Value::Bool(false));
        body.insert("error".into(), Value::String(message));
        body.insert("code".into(), Value::String(err.kind.code().to_string()));
        if let Some(details) = err.details {
            for (key, value) in details {
                body.entry(key).or_insert(value);
            }
        }

        (status, Json(Value::Object(body))).into_response()
    }
}
