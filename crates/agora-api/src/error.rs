//! HTTP mapping for concept failures.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{error, warn};

use agora_types::api::ErrorResponse;
use agora_types::{ConceptError, ErrorKind};

#[derive(Debug, Error)]
pub enum AppError {
    /// A concept refused or failed the operation.
    #[error(transparent)]
    Concept(#[from] ConceptError),

    /// No caller identity on the request (401).
    #[error("Caller identity required")]
    Unauthorized,

    /// Task join failures and the like (500).
    #[error("Internal server error")]
    Internal,
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Concept(err) => match err.kind() {
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Duplicate => StatusCode::CONFLICT,
                ErrorKind::NotAllowed => StatusCode::FORBIDDEN,
                ErrorKind::InsufficientBalance => StatusCode::UNPROCESSABLE_ENTITY,
                ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
                ErrorKind::Store => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Storage details stay in the log, not in the response.
        let message = if status.is_server_error() {
            error!("Request failed: {}", self);
            "Internal server error".to_string()
        } else {
            warn!("Request refused ({}): {}", status, self);
            self.to_string()
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
