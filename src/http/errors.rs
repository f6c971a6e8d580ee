//! HTTP error mapping

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::error::LedgerError;

#[derive(Debug)]
pub enum ApiError {
    Ledger(LedgerError),
    BadRequest(String),
}

impl From<LedgerError> for ApiError {
    fn from(error: LedgerError) -> Self {
        Self::Ledger(error)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    fn status_and_message(self) -> (StatusCode, String) {
        let error = match self {
            Self::BadRequest(message) => return (StatusCode::BAD_REQUEST, message),
            Self::Ledger(error) => error,
        };

        let status = match &error {
            LedgerError::NotFound | LedgerError::NotYetActiveOrExpired => StatusCode::NOT_FOUND,
            LedgerError::DuplicateCode
            | LedgerError::LimitReached
            | LedgerError::BelowMinimum { .. }
            | LedgerError::Validation(_) => StatusCode::BAD_REQUEST,
            LedgerError::Persistence(source) => {
                error!("failed to process promotion: {source}");

                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                );
            }
        };

        (status, error.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        (status, Json(json!({ "error": message }))).into_response()
    }
}
