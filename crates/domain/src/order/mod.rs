//! Order fulfillment and cancellation.

mod ledger;
mod service;
mod views;

use common::{OrderId, ProductId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::customer::CustomerDetails;

pub use ledger::{Reservation, StockLedger};
pub use service::OrderService;
pub use views::{CustomerSummary, OrderDetails, OrderLine};

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The request is malformed, e.g. it has no line items.
    #[error("Invalid order input: {0}")]
    InvalidInput(String),

    /// A line item references a product that does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// A line item asks for more than the product has in stock.
    #[error(
        "Insufficient stock for product {product_id}: available {available}, requested {requested}"
    )]
    InsufficientStock {
        product_id: ProductId,
        available: u32,
        requested: u32,
    },

    /// The order does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),
}

/// One requested line: a product and how many units of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Request to place an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceOrder {
    pub customer: CustomerDetails,
    #[serde(default)]
    pub items: Vec<LineItem>,
}

impl PlaceOrder {
    /// Creates a request for the given customer and line items.
    pub fn new(customer: CustomerDetails, items: Vec<LineItem>) -> Self {
        Self { customer, items }
    }

    /// Rejects requests without line items or with zero quantities.
    pub fn validate(&self) -> Result<(), OrderError> {
        if self.items.is_empty() {
            return Err(OrderError::InvalidInput(
                "order must contain at least one line item".to_string(),
            ));
        }
        if let Some(item) = self.items.iter().find(|item| item.quantity == 0) {
            return Err(OrderError::InvalidInput(format!(
                "quantity for product {} must be greater than 0",
                item.product_id
            )));
        }
        Ok(())
    }
}
