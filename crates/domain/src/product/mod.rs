//! Product catalog management.

mod service;

use common::{Money, ProductId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use service::ProductService;

/// Errors that can occur during product operations.
#[derive(Debug, Error)]
pub enum ProductError {
    /// The product does not exist.
    #[error("Product not found: {0}")]
    NotFound(ProductId),

    /// Another product already uses this name.
    #[error("Product already exists: {0}")]
    AlreadyExists(String),

    /// Negative price, more than two decimal places, or above [`Money::MAX`].
    #[error("Invalid price: {0}")]
    InvalidPrice(Money),

    /// A field failed validation.
    #[error("Invalid product input: {0}")]
    InvalidInput(String),
}

/// Fields of a product to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub price: Money,
    pub stock_quantity: u32,
}

/// Fields of a product that can be changed after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: String,
    pub price: Money,
}

fn validate(name: &str, price: Money) -> Result<(), ProductError> {
    if name.trim().is_empty() {
        return Err(ProductError::InvalidInput(
            "name must not be empty".to_string(),
        ));
    }
    if price.is_negative() || price.exceeds_scale() || price.exceeds_max() {
        return Err(ProductError::InvalidPrice(price));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_must_be_non_negative_with_two_decimals() {
        assert!(validate("Widget", Money::from_cents(0)).is_ok());
        assert!(validate("Widget", Money::from_cents(-1)).is_err());

        let too_precise: NewProduct =
            serde_json::from_str(r#"{"name":"Widget","price":"1.005","stock_quantity":1}"#)
                .unwrap();
        assert!(matches!(
            validate(&too_precise.name, too_precise.price),
            Err(ProductError::InvalidPrice(_))
        ));

        let trailing_zeros: Money = serde_json::from_str(r#""2.500""#).unwrap();
        assert!(validate("Widget", trailing_zeros).is_ok());
    }

    #[test]
    fn price_is_capped_at_storable_maximum() {
        assert!(validate("Widget", Money::MAX).is_ok());

        let huge: Money = serde_json::from_str(r#""50000000000000000000000000000""#).unwrap();
        assert!(matches!(
            validate("Widget", huge),
            Err(ProductError::InvalidPrice(_))
        ));
        let one_cent_over: Money = serde_json::from_str(r#""10000000000000000.00""#).unwrap();
        assert!(matches!(
            validate("Widget", one_cent_over),
            Err(ProductError::InvalidPrice(_))
        ));
    }

    #[test]
    fn name_must_not_be_blank() {
        assert!(matches!(
            validate(" ", Money::from_cents(100)),
            Err(ProductError::InvalidInput(_))
        ));
    }
}
