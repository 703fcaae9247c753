//! API error taxonomy and its HTTP mapping.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use rusty_canvas_draw::{DrawError, ElementError};

#[derive(Debug, Error)]
pub enum ApiError {
    /// A required field is missing or malformed.
    #[error("{0}")]
    Validation(String),

    /// No canvas with this id.
    #[error("Canvas not found")]
    NotFound(String),

    /// Drawing or encoding failed. `message` is what the client sees.
    #[error("{message}")]
    Draw {
        message: &'static str,
        #[source]
        source: DrawError,
    },

    #[error("Internal Server Error")]
    Internal(String),
}

impl ApiError {
    pub fn draw(message: &'static str, source: DrawError) -> Self {
        ApiError::Draw { message, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Draw { .. } | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation",
            ApiError::NotFound(_) => "not_found",
            ApiError::Draw { .. } => "draw",
            ApiError::Internal(_) => "internal",
        }
    }
}

impl From<ElementError> for ApiError {
    fn from(err: ElementError) -> Self {
        match err {
            ElementError::Draw(source) => ApiError::draw("Failed to add element", source),
            other => ApiError::Validation(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        #[cfg(feature = "metrics")]
        crate::metrics::record_error(self.kind());

        let body = match &self {
            ApiError::Validation(msg) => {
                warn!(error = %msg, "Rejected request");
                json!({ "error": msg })
            }
            ApiError::NotFound(id) => {
                warn!(canvas_id = %id, "Canvas not found");
                json!({ "error": self.to_string() })
            }
            ApiError::Draw { message, source } => {
                error!(error = %source, "{message}");
                json!({ "error": message })
            }
            ApiError::Internal(message) => {
                error!(%message, "Internal server error");
                json!({ "error": "Internal Server Error", "message": message })
            }
        };
        (self.status(), Json(body)).into_response()
    }
}
