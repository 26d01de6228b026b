//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

/// API-level error, mapped onto HTTP status codes at the response edge.
#[derive(Debug)]
pub enum ApiError {
    Core(deck_core::Error),
    BadRequest(String),
    Forbidden(String),
    NotFound(String),
}

impl From<deck_core::Error> for ApiError {
    fn from(err: deck_core::Error) -> Self {
        ApiError::Core(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Core(err) => {
                let status = match &err {
                    deck_core::Error::Validation(_)
                    | deck_core::Error::InvalidSlotTransition(_) => StatusCode::BAD_REQUEST,
                    deck_core::Error::CardNotFound(_) => StatusCode::NOT_FOUND,
                    deck_core::Error::AttachmentIo(_) => StatusCode::BAD_GATEWAY,
                    deck_core::Error::Persistence(_) | deck_core::Error::Config(_) => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, err.to_string())
            }
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
