use common::{CustomerId, ProductId};
use thiserror::Error;

/// Unique constraints enforced by the stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    CustomerEmail,
    CustomerPhoneNumber,
    ProductName,
}

impl std::fmt::Display for UniqueField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UniqueField::CustomerEmail => write!(f, "customer email"),
            UniqueField::CustomerPhoneNumber => write!(f, "customer phone number"),
            UniqueField::ProductName => write!(f, "product name"),
        }
    }
}

/// Errors that can occur when interacting with a store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write.
    #[error("Unique constraint violated on {0}")]
    UniqueViolation(UniqueField),

    /// The customer does not exist.
    #[error("Customer not found: {0}")]
    CustomerNotFound(CustomerId),

    /// The customer cannot be deleted while orders reference it.
    #[error("Customer {0} still has orders")]
    CustomerHasOrders(CustomerId),

    /// The product does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// A conditional stock decrement found less stock than requested.
    #[error(
        "Insufficient stock for product {product_id}: available {available}, requested {requested}"
    )]
    InsufficientStock {
        product_id: ProductId,
        available: u32,
        requested: u32,
    },

    /// A get-or-create lost every race against concurrent writers.
    #[error("Concurrent modification of {0}")]
    ConcurrentModification(&'static str),

    /// A row could not be mapped back into a record.
    #[error("Invalid row data: {0}")]
    InvalidRow(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
