//! HTTP route handlers and the shared application state.

pub mod customers;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod products;

use std::str::FromStr;

use domain::{CustomerService, OrderService, ProductService};
use store::Store;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store> {
    pub customer_service: CustomerService<S>,
    pub product_service: ProductService<S>,
    pub order_service: OrderService<S, S, S>,
}

impl<S: Store> AppState<S> {
    /// Builds every service over one store.
    pub fn new(store: S) -> Self {
        Self {
            customer_service: CustomerService::new(store.clone()),
            product_service: ProductService::new(store.clone()),
            order_service: OrderService::new(store.clone(), store.clone(), store),
        }
    }
}

/// Parses a path segment into a typed id.
pub(crate) fn parse_id<T>(raw: &str, kind: &str) -> Result<T, ApiError>
where
    T: FromStr<Err = uuid::Error>,
{
    raw.parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid {kind} id: {e}")))
}
