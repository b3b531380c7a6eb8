use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::warn;

use crate::core::error::CoreError;

#[derive(Debug)]
pub enum APIError {
    BadRequest(String),
    UnAuthorized,
    Forbidden,
    NotFound(String),
    Conflict(String),
    ServiceUnavailable(String),
    InternalServerError(String),
}

impl From<CoreError> for APIError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Unauthorized => Self::Forbidden,
            CoreError::InvalidState(detail) => {
                warn!("Rejected stale review action: {}", detail);
                Self::Conflict("this post was already reviewed, please refresh".to_string())
            }
            CoreError::NotFound(what) => Self::NotFound(what),
            CoreError::WriteError(detail) | CoreError::LoadError(detail) => {
                Self::ServiceUnavailable(detail)
            }
        }
    }
}

fn error_body(status: StatusCode, details: String, retryable: bool) -> Response {
    (
        status,
        Json(serde_json::json!({
            "status": "error",
            "details": details,
            "retryable": retryable,
        })),
    )
        .into_response()
}

impl IntoResponse for APIError {
    fn into_response(self) -> Response {
        match self {
            Self::BadRequest(msg) => error_body(StatusCode::BAD_REQUEST, msg, false),
            Self::UnAuthorized => (StatusCode::UNAUTHORIZED).into_response(),
            Self::Forbidden => error_body(StatusCode::FORBIDDEN, "no access".to_string(), false),
            Self::NotFound(msg) => error_body(StatusCode::NOT_FOUND, msg, false),
            Self::Conflict(msg) => error_body(StatusCode::CONFLICT, msg, false),
            Self::ServiceUnavailable(msg) => {
                error_body(StatusCode::SERVICE_UNAVAILABLE, msg, true)
            }
            Self::InternalServerError(msg) => {
                error_body(StatusCode::INTERNAL_SERVER_ERROR, msg, false)
            }
        }
    }
}
