//! Domain error types.

use store::StoreError;
use thiserror::Error;

use crate::customer::CustomerError;
use crate::order::OrderError;
use crate::product::ProductError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A customer rule was violated.
    #[error("Customer error: {0}")]
    Customer(#[from] CustomerError),

    /// A product rule was violated.
    #[error("Product error: {0}")]
    Product(#[from] ProductError),

    /// Order placement or cancellation failed.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// An error occurred in the store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl DomainError {
    /// Short machine-readable label, used as a metrics dimension.
    pub fn reason(&self) -> &'static str {
        match self {
            DomainError::Customer(CustomerError::NotFound(_)) => "customer_not_found",
            DomainError::Customer(CustomerError::InvalidInput(_)) => "invalid_input",
            DomainError::Customer(_) => "customer_conflict",
            DomainError::Product(ProductError::NotFound(_)) => "product_not_found",
            DomainError::Product(_) => "invalid_product",
            DomainError::Order(OrderError::InvalidInput(_)) => "invalid_input",
            DomainError::Order(OrderError::ProductNotFound(_)) => "product_not_found",
            DomainError::Order(OrderError::InsufficientStock { .. }) => "insufficient_stock",
            DomainError::Order(OrderError::OrderNotFound(_)) => "order_not_found",
            DomainError::Store(_) => "store",
        }
    }
}
