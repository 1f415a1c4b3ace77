use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("{0}")]
    Validation(String),

    #[error("the selected time slot is not available")]
    SlotUnavailable,

    #[error("{0}")]
    BookingConflict(String),

    #[error("we do not currently service this postcode area")]
    UnserviceableArea,

    #[error("total price cannot be 0, please review your selections")]
    InvalidSelection,

    #[error("{0}")]
    InvalidState(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("payment gateway error: {0}")]
    Gateway(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_)
            | AppError::UnserviceableArea
            | AppError::InvalidSelection
            | AppError::InvalidState(_) => StatusCode::BAD_REQUEST,
            AppError::SlotUnavailable | AppError::BookingConflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Gateway(_) => StatusCode::BAD_GATEWAY,
        };

        // Unexpected failures get logged with full detail but the response
        // body never carries it.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "internal error");
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = serde_json::json!({ "success": false, "message": message });
        (status, axum::Json(body)).into_response()
    }
}
