use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use compute::ComputeError;
use thiserror::Error;
use tracing::error;

use crate::schemas::ErrorResponse;

/// The single error type all handlers return.
///
/// Every variant maps onto one taxonomy entry: validation failures are 400,
/// missing and not-owned entities are deliberately the same 404 (so the API
/// does not leak whether another user's entity exists), conflicts are 409,
/// auth failures are 401, and store/engine failures surface as a generic 500
/// with the details logged server-side only.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error(transparent)]
    Database(#[from] sea_orm::DbErr),
    #[error(transparent)]
    Compute(#[from] ComputeError),
}

/// Type alias for handler results.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// The merged missing/not-owned response for an entity type.
    pub fn not_found(entity: &str) -> Self {
        Self::NotFound(format!("{entity} not found"))
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            Self::Compute(compute_error) => match compute_error {
                ComputeError::AlreadySettled => (StatusCode::CONFLICT, "ALREADY_SETTLED"),
                ComputeError::AlreadyPaid => (StatusCode::CONFLICT, "ALREADY_PAID"),
                ComputeError::InvalidInstallmentCount { .. } => {
                    (StatusCode::BAD_REQUEST, "INVALID_INSTALLMENT_COUNT")
                }
                ComputeError::InvalidFrequency(_) => {
                    (StatusCode::BAD_REQUEST, "INVALID_FREQUENCY")
                }
                ComputeError::NonPositiveAmount => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
                ComputeError::NotInstallmentPlan => {
                    (StatusCode::BAD_REQUEST, "NOT_INSTALLMENT_PLAN")
                }
                ComputeError::NoPendingInstallments => {
                    (StatusCode::BAD_REQUEST, "NO_PENDING_INSTALLMENTS")
                }
                ComputeError::Database(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR")
                }
                ComputeError::Date(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = if status.is_server_error() {
            error!(error = %self, "request failed with internal error");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            error: message,
            code: code.to_string(),
            success: false,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_expected_statuses() {
        let cases: Vec<(ApiError, StatusCode)> = vec![
            (
                ApiError::Validation("bad".into()),
                StatusCode::BAD_REQUEST,
            ),
            (ApiError::not_found("Debt"), StatusCode::NOT_FOUND),
            (ApiError::Conflict("dup".into()), StatusCode::CONFLICT),
            (
                ApiError::Unauthorized("no token".into()),
                StatusCode::UNAUTHORIZED,
            ),
            (
                ApiError::Compute(ComputeError::AlreadySettled),
                StatusCode::CONFLICT,
            ),
            (
                ApiError::Compute(ComputeError::InvalidInstallmentCount {
                    got: 49,
                    min: 2,
                    max: 48,
                }),
                StatusCode::BAD_REQUEST,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.status_and_code().0, expected);
        }
    }

    #[test]
    fn server_errors_hide_details() {
        let err = ApiError::Database(sea_orm::DbErr::Custom("connection refused".into()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
