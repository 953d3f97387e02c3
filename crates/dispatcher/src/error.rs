//! Error types for the dispatcher.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use database::DatabaseError;
use ping_core::api::ErrorBody;
use push_gateway::GatewayError;
use thiserror::Error;

/// Errors a dispatcher handler can answer with.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The request is malformed or missing required fields.
    #[error("{0}")]
    BadRequest(String),

    /// Sender identity and token do not match a user.
    #[error("Unauthorized access")]
    Unauthorized,

    /// A referenced recipient or notification does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Store read or write failed.
    #[error("Database error: {0}")]
    Persistence(#[from] DatabaseError),

    /// The push gateway refused a broadcast.
    #[error("Push gateway error: {0}")]
    Gateway(#[from] GatewayError),
}

impl DispatchError {
    /// The status code this error is answered with.
    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::BadRequest(_) => StatusCode::BAD_REQUEST,
            DispatchError::Unauthorized => StatusCode::UNAUTHORIZED,
            DispatchError::NotFound(_) => StatusCode::NOT_FOUND,
            DispatchError::Persistence(DatabaseError::Invalid(_)) => StatusCode::BAD_REQUEST,
            DispatchError::Persistence(DatabaseError::NotFound { .. }) => StatusCode::NOT_FOUND,
            DispatchError::Persistence(_) | DispatchError::Gateway(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            DispatchError::Persistence(DatabaseError::Invalid(err)) => ErrorBody {
                success: None,
                error: err.to_string(),
            },
            DispatchError::Persistence(err) if status.is_server_error() => {
                // Detail stays in the log
                tracing::error!("Database error: {}", err);
                ErrorBody {
                    success: None,
                    error: "Internal storage error".to_string(),
                }
            }
            DispatchError::Gateway(err) => {
                tracing::error!("Push gateway error: {}", err);
                ErrorBody {
                    success: Some(false),
                    error: err.to_string(),
                }
            }
            other => ErrorBody {
                success: None,
                error: other.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for dispatcher handlers.
pub type Result<T> = std::result::Result<T, DispatchError>;

#[cfg(test)]
mod tests {
    use super::*;
    use database::ValidationError;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            DispatchError::BadRequest("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(DispatchError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            DispatchError::NotFound("Recipient").status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            DispatchError::Persistence(DatabaseError::Invalid(ValidationError::Empty(
                "message".into()
            )))
            .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            DispatchError::Gateway(GatewayError::Unavailable("down".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(
            DispatchError::NotFound("Notification").to_string(),
            "Notification not found"
        );
    }
}
