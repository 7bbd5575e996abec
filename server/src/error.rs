//! Error surfacing: maps [`accounts_engine::Error`] to HTTP status codes
//! via axum's [`IntoResponse`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use accounts_engine::Error as EngineError;

/// The HTTP-facing error type every handler returns on failure.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    /// Builds a 400 with a message, for request-parsing failures that
    /// occur before an engine call (unknown route parameter shape, bad
    /// JSON, duplicate query key).
    pub fn bad_request(message: impl std::fmt::Display) -> Self {
        ApiError {
            status: StatusCode::BAD_REQUEST,
            message: message.to_string(),
        }
    }

    /// Builds a 404.
    #[must_use]
    pub fn not_found() -> Self {
        ApiError {
            status: StatusCode::NOT_FOUND,
            message: "not found".to_string(),
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(error: EngineError) -> Self {
        match error {
            EngineError::BadRequest(message) => ApiError {
                status: StatusCode::BAD_REQUEST,
                message,
            },
            EngineError::NotFound => ApiError::not_found(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::debug!(status = %self.status, message = %self.message, "request rejected");
        // Error responses carry no body, only the status code.
        self.status.into_response()
    }
}
