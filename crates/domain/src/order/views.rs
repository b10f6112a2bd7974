use chrono::{DateTime, Utc};
use common::{CustomerId, Money, MoneyOverflow, OrderId, OrderItemId, ProductId};
use serde::{Deserialize, Serialize};
use store::{Customer, Order, OrderItem};

/// Customer fields shown on an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerSummary {
    pub id: CustomerId,
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
}

impl From<&Customer> for CustomerSummary {
    fn from(customer: &Customer) -> Self {
        Self {
            id: customer.id,
            full_name: customer.full_name.clone(),
            email: customer.email.clone(),
            phone_number: customer.phone_number.clone(),
        }
    }
}

/// A line item as shown on an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: OrderItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub line_total: Money,
}

impl TryFrom<OrderItem> for OrderLine {
    type Error = MoneyOverflow;

    fn try_from(item: OrderItem) -> Result<Self, Self::Error> {
        let line_total = item.line_total()?;
        Ok(Self {
            id: item.id,
            product_id: item.product_id,
            product_name: item.product_name,
            quantity: item.quantity,
            unit_price: item.unit_price,
            line_total,
        })
    }
}

/// An order with its customer and line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetails {
    pub id: OrderId,
    pub order_date: DateTime<Utc>,
    pub total_amount: Money,
    pub customer: CustomerSummary,
    pub items: Vec<OrderLine>,
}

impl OrderDetails {
    /// Combines a stored order with its customer.
    pub fn new(order: Order, customer: CustomerSummary) -> Result<Self, MoneyOverflow> {
        Ok(Self {
            id: order.id,
            order_date: order.order_date,
            total_amount: order.total_amount,
            customer,
            items: order
                .items
                .into_iter()
                .map(OrderLine::try_from)
                .collect::<Result<_, _>>()?,
        })
    }
}
