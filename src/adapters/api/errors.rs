use crate::domain::errors::CoreError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// API error response format: `{error, message}` per the external contract.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Input faults map to 4xx; resource limits and programmer bugs map to
/// 5xx. Algorithmic uncertainty is never represented here — it travels as
/// a confidence/warning field on the success path.
impl IntoResponse for CoreError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            CoreError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "invalid_input"),
            CoreError::UnknownScoreId(_) => (StatusCode::NOT_FOUND, "unknown_score_id"),
            CoreError::EmptyPart => (StatusCode::BAD_REQUEST, "empty_part"),
            CoreError::PageTooLarge { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "page_too_large"),
            CoreError::LayoutOverflow { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "layout_overflow"),
            CoreError::CacheExhausted { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "cache_exhausted"),
            CoreError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let message = match &self {
            CoreError::Internal(_) | CoreError::LayoutOverflow { .. } => {
                log::error!("{self}");
                "an internal error occurred".to_string()
            }
            _ => self.to_string(),
        };

        let body = Json(ErrorResponse {
            error: error.to_string(),
            message,
        });

        (status, body).into_response()
    }
}
