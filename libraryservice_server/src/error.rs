use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use crate::admins_repository::AdminsRepositoryError;
use crate::api::ErrorResponse;
use crate::books_repository::BooksRepositoryError;
use crate::persons_repository::PersonsRepositoryError;
use crate::reservations_repository::ReservationsRepositoryError;

pub const BOOK_NOT_FOUND: &str = "Book not found.";
pub const USER_NOT_FOUND: &str = "User not found.";
pub const RESERVATION_NOT_FOUND: &str = "Reservation not found.";
pub const BOOK_STOCK_FULL: &str = "Book stock cannot be increased.";
const INTERNAL_SERVER_ERROR: &str = "Internal Server Error";

/// Error returned by handlers, rendered as `{"error": ...}` with the matching status
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(message: &str) -> Self {
        Self::Validation(message.to_string())
    }

    pub fn not_found(message: &str) -> Self {
        Self::NotFound(message.to_string())
    }

    pub fn unauthorized(message: &str) -> Self {
        Self::Unauthorized(message.to_string())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            ApiError::Internal(details) => {
                tracing::error!("Request failed: {}", details);
                INTERNAL_SERVER_ERROR.to_string()
            }
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(ErrorResponse { error })
    }
}

impl From<BooksRepositoryError> for ApiError {
    fn from(err: BooksRepositoryError) -> Self {
        match err {
            BooksRepositoryError::NotFound(_) => ApiError::not_found(BOOK_NOT_FOUND),
            BooksRepositoryError::StockOverflow(_) => ApiError::validation(BOOK_STOCK_FULL),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<PersonsRepositoryError> for ApiError {
    fn from(err: PersonsRepositoryError) -> Self {
        match err {
            PersonsRepositoryError::NotFound(_) => ApiError::not_found(USER_NOT_FOUND),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<ReservationsRepositoryError> for ApiError {
    fn from(err: ReservationsRepositoryError) -> Self {
        match err {
            ReservationsRepositoryError::ReservationNotFound { .. } => {
                ApiError::not_found(RESERVATION_NOT_FOUND)
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<AdminsRepositoryError> for ApiError {
    fn from(err: AdminsRepositoryError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod error_tests {
    use actix_web::body::to_bytes;

    use super::*;

    async fn body_of(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.error_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[actix_web::test]
    async fn test_errors_render_status_and_message() {
        assert_eq!(
            body_of(ApiError::validation("Bad input")).await,
            (
                StatusCode::BAD_REQUEST,
                serde_json::json!({"error": "Bad input"})
            )
        );
        assert_eq!(
            body_of(BooksRepositoryError::NotFound(3).into()).await,
            (
                StatusCode::NOT_FOUND,
                serde_json::json!({"error": BOOK_NOT_FOUND})
            )
        );
        assert_eq!(
            body_of(ApiError::unauthorized("Not logged in")).await,
            (
                StatusCode::UNAUTHORIZED,
                serde_json::json!({"error": "Not logged in"})
            )
        );
    }

    #[actix_web::test]
    async fn test_internal_details_are_not_exposed() {
        let err: ApiError = PersonsRepositoryError::Other("connection reset".to_string()).into();
        assert_eq!(
            body_of(err).await,
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({"error": INTERNAL_SERVER_ERROR})
            )
        );
    }
}
