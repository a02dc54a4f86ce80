use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use pokec_engine::EngineError;

/// Transport-side wrapper that maps every engine error kind to a
/// user-visible HTTP response. Engine errors arrive as values, never as
/// panics across the boundary.
pub struct ApiError(pub EngineError);

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            EngineError::DuplicateIdentity => StatusCode::CONFLICT,
            EngineError::EmptyField(_) => StatusCode::BAD_REQUEST,
            EngineError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            EngineError::AccountBanned
            | EngineError::Unauthorized
            | EngineError::Banned
            | EngineError::Muted => StatusCode::FORBIDDEN,
            EngineError::PaymentRequired => StatusCode::PAYMENT_REQUIRED,
            EngineError::EmptyMessage => StatusCode::UNPROCESSABLE_ENTITY,
            EngineError::NotFound(_) => StatusCode::NOT_FOUND,
            EngineError::Persistence(e) => {
                // Collaborator outage, not a policy violation — the one kind
                // worth operational visibility.
                error!("persistence unavailable: {e:#}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
