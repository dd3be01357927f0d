use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::auth::{LoginError, PasswordError};
use crate::booking::{PaymentError, PricingError, SeatParseError, WizardError};
use crate::models::BookingInsertError;

/// Ошибка обработчика. Тело ответа всегда `{"success": false, "message": ...}`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Validation(#[from] validator::ValidationErrors),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Redis(#[from] redis::RedisError),
    #[error("{0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn not_found(what: &str) -> Self {
        AppError::NotFound(format!("{what} not found"))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Redis(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Детали инфраструктурных ошибок только в лог
        let message = match &self {
            AppError::Database(e) => {
                tracing::error!("database error: {:?}", e);
                "Internal server error".to_string()
            }
            AppError::Redis(e) => {
                tracing::error!("redis error: {:?}", e);
                "Internal server error".to_string()
            }
            AppError::Internal(detail) => {
                tracing::error!("internal error: {}", detail);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "success": false, "message": message }))).into_response()
    }
}

impl From<WizardError> for AppError {
    fn from(err: WizardError) -> Self {
        match err {
            WizardError::AmountMismatch { .. } | WizardError::PaymentKindMismatch { .. } => {
                AppError::Internal(err.to_string())
            }
            other => AppError::BadRequest(other.to_string()),
        }
    }
}

impl From<PricingError> for AppError {
    fn from(err: PricingError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<SeatParseError> for AppError {
    fn from(err: SeatParseError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<LoginError> for AppError {
    fn from(err: LoginError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        AppError::Internal(format!("token error: {err}"))
    }
}

impl From<BookingInsertError> for AppError {
    fn from(err: BookingInsertError) -> Self {
        match err {
            BookingInsertError::SeatTaken => {
                AppError::Conflict("One or more seats were just booked by someone else".to_string())
            }
            BookingInsertError::Database(e) => AppError::Database(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::WizardStep;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::not_found("Movie").status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::from(BookingInsertError::SeatTaken).status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::from(WizardError::NoSeats).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(WizardError::AmountMismatch { expected: 994, paid: 800 }).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::from(WizardError::WrongStep {
                current: WizardStep::Cinema,
                expected: WizardStep::Seats
            })
            .status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(AppError::not_found("Show").to_string(), "Show not found");
    }
}
