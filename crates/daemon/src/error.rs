use automon_core::error::CoreError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::host::HostError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for rejected reads and writes and [`HostError`] for
/// lookups of unknown devices or attributes. Implements [`IntoResponse`]
/// to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Host(#[from] HostError),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::Core(core) => match core {
                CoreError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
                CoreError::ReadOnly(_) => (StatusCode::METHOD_NOT_ALLOWED, "READ_ONLY"),
            },
            AppError::Host(host) => match host {
                HostError::NoSuchDevice(_)
                | HostError::NoSuchDir(_)
                | HostError::NoSuchAttribute { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                HostError::DeviceExists(_)
                | HostError::DirExists(_)
                | HostError::GroupExists(_) => {
                    tracing::error!(error = %host, "Unexpected registration error in handler");
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
                }
            },
        };

        let body = json!({
            "error": self.to_string(),
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
