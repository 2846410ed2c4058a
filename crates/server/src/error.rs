use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use services::services::{card::CardServiceError, paywall::PaywallError};
use thiserror::Error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Card(#[from] CardServiceError),
    #[error(transparent)]
    Paywall(#[from] PaywallError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("{0}")]
    BadRequest(String),
    #[error("viewer identity required")]
    Unauthorized,
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Card(CardServiceError::CardNotFound(_))
            | ApiError::Card(CardServiceError::CategoryNotFound(_))
            | ApiError::Paywall(PaywallError::ArticleNotFound(_))
            | ApiError::Paywall(PaywallError::UserNotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Card(CardServiceError::ProtectedCategory(_)) => StatusCode::CONFLICT,
            ApiError::Paywall(PaywallError::InsufficientCredit { .. }) => {
                StatusCode::PAYMENT_REQUIRED
            }
            ApiError::Card(CardServiceError::NegativeUsedSeconds(_))
            | ApiError::Paywall(PaywallError::InvalidCutoff(_))
            | ApiError::Paywall(PaywallError::InvalidGrantAmount(_))
            | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Card(CardServiceError::Database(_))
            | ApiError::Paywall(PaywallError::Database(_))
            | ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
        }
        let body: ApiResponse<()> = ApiResponse::error(self.to_string());
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::Card(CardServiceError::CardNotFound(1)).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Card(CardServiceError::ProtectedCategory(2)).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::Paywall(PaywallError::InsufficientCredit {
                required: 10,
                balance: 0
            })
            .status_code(),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            ApiError::Card(CardServiceError::NegativeUsedSeconds(-5)).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Paywall(PaywallError::InvalidGrantAmount(0)).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
    }
}
