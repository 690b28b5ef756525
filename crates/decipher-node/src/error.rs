//! HTTP mapping of [`DecipherError`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use decipher_core::{ChatErrorEnvelope, DecipherError};
use serde::Serialize;

/// Error body for every route except chat.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub details: Option<String>,
}

/// A [`DecipherError`] on its way out of a handler.
#[derive(Debug)]
pub struct ApiError(pub DecipherError);

impl From<DecipherError> for ApiError {
    fn from(err: DecipherError) -> Self {
        ApiError(err)
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

pub fn status_code(err: &DecipherError) -> StatusCode {
    match err {
        DecipherError::Unauthorized => StatusCode::UNAUTHORIZED,
        DecipherError::NotFound { .. } => StatusCode::NOT_FOUND,
        DecipherError::Validation { .. } | DecipherError::Serialization(_) => {
            StatusCode::BAD_REQUEST
        }
        DecipherError::Precondition { .. } => StatusCode::CONFLICT,
        DecipherError::Upstream { .. } | DecipherError::Connection(_) => StatusCode::BAD_GATEWAY,
        DecipherError::Persistence { .. } | DecipherError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Short message safe to show a user. Store and internal details are logged, not returned.
pub fn public_message(err: &DecipherError) -> String {
    match err {
        DecipherError::Unauthorized => "Unauthorized".to_string(),
        DecipherError::NotFound { resource, .. } => format!("{resource} not found"),
        DecipherError::Validation { message } | DecipherError::Precondition { message } => {
            message.clone()
        }
        DecipherError::Serialization(msg) => format!("Invalid request body: {msg}"),
        DecipherError::Upstream { .. } | DecipherError::Connection(_) => {
            "Research service request failed".to_string()
        }
        DecipherError::Persistence { .. } | DecipherError::Internal(_) => {
            tracing::error!(error = %err, "request failed");
            "Internal server error".to_string()
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_code(&self.0);
        let body = ErrorBody {
            error: public_message(&self.0),
            details: self.0.upstream_detail(),
        };
        (status, Json(body)).into_response()
    }
}

/// Chat failures use the `{status, response}` envelope.
#[derive(Debug)]
pub struct ChatError(pub DecipherError);

impl From<DecipherError> for ChatError {
    fn from(err: DecipherError) -> Self {
        ChatError(err)
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let status = status_code(&self.0);
        let response = match &self.0 {
            DecipherError::Upstream {
                status: Some(code),
                message,
                ..
            } => format!("Backend API error: {code} - {message}"),
            DecipherError::Upstream { message, .. } => format!("Backend API error: {message}"),
            other => public_message(other),
        };
        (status, Json(ChatErrorEnvelope::new(response))).into_response()
    }
}
