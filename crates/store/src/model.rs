//! Persisted records for customers, products and orders.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use common::{CustomerId, Money, MoneyOverflow, OrderId, OrderItemId, ProductId};
use serde::{Deserialize, Serialize};

/// A customer. Email and phone number are each unique across all customers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub date_of_birth: NaiveDate,
}

impl Customer {
    /// Creates a customer with a fresh identifier.
    pub fn new(
        full_name: impl Into<String>,
        email: impl Into<String>,
        phone_number: impl Into<String>,
        date_of_birth: NaiveDate,
    ) -> Self {
        Self {
            id: CustomerId::new(),
            full_name: full_name.into(),
            email: email.into(),
            phone_number: phone_number.into(),
            date_of_birth,
        }
    }
}

/// A catalog product and its available stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub stock_quantity: u32,
}

impl Product {
    /// Creates a product with a fresh identifier.
    pub fn new(name: impl Into<String>, price: Money, stock_quantity: u32) -> Self {
        Self {
            id: ProductId::new(),
            name: name.into(),
            price,
            stock_quantity,
        }
    }
}

/// Editable product fields. Stock only moves through order reservations
/// and releases, so it is not part of this set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductChanges {
    pub name: String,
    pub price: Money,
}

/// A line of an order with the product name and unit price captured when
/// the order was placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
}

impl OrderItem {
    /// Creates a line item with a fresh identifier.
    pub fn new(
        product_id: ProductId,
        product_name: impl Into<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Self {
        Self {
            id: OrderItemId::new(),
            product_id,
            product_name: product_name.into(),
            quantity,
            unit_price,
        }
    }

    /// Returns `unit_price * quantity`.
    pub fn line_total(&self) -> Result<Money, MoneyOverflow> {
        self.unit_price.multiply(self.quantity)
    }
}

/// An order and its line items, stored and removed as one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub order_date: DateTime<Utc>,
    pub total_amount: Money,
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Starts an empty order with a zero total.
    pub fn new(customer_id: CustomerId, order_date: DateTime<Utc>) -> Self {
        Self {
            id: OrderId::new(),
            customer_id,
            order_date,
            total_amount: Money::zero(),
            items: Vec::new(),
        }
    }

    /// Appends a line item and adds its line total to the order total.
    ///
    /// On overflow the order is left unchanged.
    pub fn add_item(&mut self, item: OrderItem) -> Result<(), MoneyOverflow> {
        self.total_amount = self.total_amount.checked_add(item.line_total()?)?;
        self.items.push(item);
        Ok(())
    }

    /// Recomputes the total from the line items.
    pub fn computed_total(&self) -> Result<Money, MoneyOverflow> {
        self.items
            .iter()
            .try_fold(Money::zero(), |acc, item| acc.checked_add(item.line_total()?))
    }
}

/// A stock movement for one product, applied by the order store in the same
/// transaction as the order insert (decrement) or delete (increment).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockAdjustment {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl StockAdjustment {
    /// Sums adjustments per product, ordered by product id.
    pub fn merge(adjustments: &[StockAdjustment]) -> Vec<StockAdjustment> {
        let mut merged: BTreeMap<ProductId, u32> = BTreeMap::new();
        for adjustment in adjustments {
            let total = merged.entry(adjustment.product_id).or_default();
            *total = total.saturating_add(adjustment.quantity);
        }
        merged
            .into_iter()
            .map(|(product_id, quantity)| StockAdjustment {
                product_id,
                quantity,
            })
            .collect()
    }
}
