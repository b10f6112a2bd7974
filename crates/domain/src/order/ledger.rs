use std::collections::HashMap;

use common::{Money, ProductId};
use store::{ProductStore, StockAdjustment};

use super::OrderError;
use crate::error::DomainError;

/// The outcome of reserving one line item: the product's name and price at
/// reservation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: Money,
    pub quantity: u32,
}

/// Stages stock movements for one fulfillment or cancellation.
///
/// Nothing is written while staging. The collected adjustments are handed to
/// the order store, which applies them in the same transaction as the order
/// insert or delete and re-checks every decrement there.
pub struct StockLedger<'a, P: ProductStore + ?Sized> {
    products: &'a P,
    staged: HashMap<ProductId, u32>,
    adjustments: Vec<StockAdjustment>,
}

impl<'a, P: ProductStore + ?Sized> StockLedger<'a, P> {
    /// Creates an empty ledger over the given product store.
    pub fn new(products: &'a P) -> Self {
        Self {
            products,
            staged: HashMap::new(),
            adjustments: Vec::new(),
        }
    }

    /// Checks that `quantity` units can be taken from the product and stages
    /// the decrement.
    ///
    /// Quantities already staged for the same product count against its
    /// stock, so repeated lines are reserved cumulatively.
    pub async fn reserve(
        &mut self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Reservation, DomainError> {
        let product = self
            .products
            .find_product(product_id)
            .await?
            .ok_or(OrderError::ProductNotFound(product_id))?;

        let already_staged = self.staged.get(&product_id).copied().unwrap_or(0);
        let available = product.stock_quantity.saturating_sub(already_staged);
        if available < quantity {
            return Err(OrderError::InsufficientStock {
                product_id,
                available,
                requested: quantity,
            }
            .into());
        }

        *self.staged.entry(product_id).or_default() += quantity;
        self.adjustments.push(StockAdjustment {
            product_id,
            quantity,
        });

        Ok(Reservation {
            product_id,
            product_name: product.name,
            unit_price: product.price,
            quantity,
        })
    }

    /// Stages an increment of `quantity` units for the product.
    ///
    /// Returns false, staging nothing, if the product no longer exists.
    pub async fn release(
        &mut self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<bool, DomainError> {
        if self.products.find_product(product_id).await?.is_none() {
            return Ok(false);
        }

        let staged = self.staged.entry(product_id).or_default();
        *staged = staged.saturating_add(quantity);
        self.adjustments.push(StockAdjustment {
            product_id,
            quantity,
        });
        Ok(true)
    }

    /// Total units staged so far across all products.
    pub fn staged_units(&self) -> u64 {
        self.staged.values().map(|&q| u64::from(q)).sum()
    }

    /// Consumes the ledger, returning the staged adjustments in staging order.
    pub fn into_adjustments(self) -> Vec<StockAdjustment> {
        self.adjustments
    }
}

#[cfg(test)]
mod tests {
    use store::{InMemoryStore, Product};

    use super::*;

    async fn store_with(stock: u32) -> (InMemoryStore, Product) {
        let store = InMemoryStore::new();
        let product = Product::new("Widget", Money::from_cents(1000), stock);
        store.insert_product(&product).await.unwrap();
        (store, product)
    }

    #[tokio::test]
    async fn reserve_returns_price_and_stages_without_writing() {
        let (store, product) = store_with(5).await;
        let mut ledger = StockLedger::new(&store);

        let reservation = ledger.reserve(product.id, 3).await.unwrap();
        assert_eq!(reservation.unit_price, Money::from_cents(1000));
        assert_eq!(reservation.product_name, "Widget");
        assert_eq!(ledger.staged_units(), 3);

        let unchanged = store.find_product(product.id).await.unwrap().unwrap();
        assert_eq!(unchanged.stock_quantity, 5);
    }

    #[tokio::test]
    async fn repeated_reservations_are_cumulative() {
        let (store, product) = store_with(5).await;
        let mut ledger = StockLedger::new(&store);

        ledger.reserve(product.id, 3).await.unwrap();
        let err = ledger.reserve(product.id, 3).await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::Order(OrderError::InsufficientStock {
                available: 2,
                requested: 3,
                ..
            })
        ));
        assert_eq!(ledger.into_adjustments().len(), 1);
    }

    #[tokio::test]
    async fn reserve_unknown_product_fails() {
        let store = InMemoryStore::new();
        let mut ledger = StockLedger::new(&store);

        let missing = ProductId::new();
        let err = ledger.reserve(missing, 1).await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::Order(OrderError::ProductNotFound(id)) if id == missing
        ));
    }

    #[tokio::test]
    async fn release_skips_deleted_products() {
        let (store, product) = store_with(1).await;
        let mut ledger = StockLedger::new(&store);

        assert!(ledger.release(product.id, 2).await.unwrap());
        assert!(!ledger.release(ProductId::new(), 2).await.unwrap());

        let adjustments = ledger.into_adjustments();
        assert_eq!(
            adjustments,
            vec![StockAdjustment {
                product_id: product.id,
                quantity: 2
            }]
        );
    }
}
