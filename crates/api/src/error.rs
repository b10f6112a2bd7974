//! API error types with HTTP response mapping.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{CustomerError, DomainError, OrderError, ProductError};
use store::StoreError;
use thiserror::Error;

/// API-level error type that maps to HTTP responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad request from the client.
    #[error("{0}")]
    BadRequest(String),
    /// Domain logic error.
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Domain(err) => domain_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    let status = match &err {
        DomainError::Customer(customer_err) => match customer_err {
            CustomerError::NotFound(_) => StatusCode::NOT_FOUND,
            CustomerError::EmailAlreadyExists(_)
            | CustomerError::PhoneAlreadyExists(_)
            | CustomerError::HasOrders(_) => StatusCode::CONFLICT,
            CustomerError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        },
        DomainError::Product(product_err) => match product_err {
            ProductError::NotFound(_) => StatusCode::NOT_FOUND,
            ProductError::AlreadyExists(_) => StatusCode::CONFLICT,
            ProductError::InvalidPrice(_) | ProductError::InvalidInput(_) => {
                StatusCode::BAD_REQUEST
            }
        },
        DomainError::Order(order_err) => match order_err {
            OrderError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            OrderError::ProductNotFound(_) | OrderError::OrderNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            OrderError::InsufficientStock { .. } => StatusCode::CONFLICT,
        },
        DomainError::Store(StoreError::UniqueViolation(_)) => StatusCode::CONFLICT,
        DomainError::Store(StoreError::CustomerNotFound(_) | StoreError::ProductNotFound(_)) => {
            StatusCode::NOT_FOUND
        }
        DomainError::Store(_) => {
            tracing::error!(error = %err, "internal server error");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            );
        }
    };

    (status, err.to_string())
}
