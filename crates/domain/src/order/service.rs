//! Order service: fulfillment, cancellation and read views.

use std::collections::HashMap;
use std::time::Instant;

use chrono::Utc;
use common::{CustomerId, OrderId};
use store::{CustomerStore, Order, OrderItem, OrderStore, ProductStore, StoreError};

use super::{CustomerSummary, OrderDetails, OrderError, PlaceOrder, StockLedger};
use crate::customer::CustomerResolver;
use crate::error::DomainError;

/// Service for placing, cancelling and reading orders.
///
/// Each collaborator is a narrow store trait; a single store implementing all
/// three can be passed for each of them.
pub struct OrderService<C, P, O>
where
    C: CustomerStore,
    P: ProductStore,
    O: OrderStore,
{
    resolver: CustomerResolver<C>,
    customers: C,
    products: P,
    orders: O,
}

impl<C, P, O> OrderService<C, P, O>
where
    C: CustomerStore + Clone,
    P: ProductStore,
    O: OrderStore,
{
    /// Creates a new order service over the given stores.
    pub fn new(customers: C, products: P, orders: O) -> Self {
        Self {
            resolver: CustomerResolver::new(customers.clone()),
            customers,
            products,
            orders,
        }
    }

    /// Places an order and returns its id.
    ///
    /// The customer is resolved (or created) first. Every line is then
    /// reserved in request order against current stock, and the order is
    /// stored together with all stock decrements in one transaction. Any
    /// failure leaves stock untouched and stores no order; a customer created
    /// on the way is kept.
    #[tracing::instrument(skip(self, cmd), fields(email = %cmd.customer.email, lines = cmd.items.len()))]
    pub async fn place_order(&self, cmd: PlaceOrder) -> Result<OrderId, DomainError> {
        let started = Instant::now();
        let result = self.fulfill(cmd).await;

        match &result {
            Ok(order_id) => {
                metrics::counter!("orders_placed_total").increment(1);
                metrics::histogram!("order_fulfillment_duration_seconds")
                    .record(started.elapsed().as_secs_f64());
                tracing::info!(%order_id, "order placed");
            }
            Err(e) => {
                metrics::counter!("orders_place_failed_total", "reason" => e.reason())
                    .increment(1);
                tracing::warn!(error = %e, "order placement failed");
            }
        }

        result
    }

    async fn fulfill(&self, cmd: PlaceOrder) -> Result<OrderId, DomainError> {
        cmd.validate()?;

        let customer = self.resolver.resolve_or_create(cmd.customer).await?;
        let mut order = Order::new(customer.id, Utc::now());

        let mut ledger = StockLedger::new(&self.products);
        for line in &cmd.items {
            let reservation = ledger.reserve(line.product_id, line.quantity).await?;
            order
                .add_item(OrderItem::new(
                    reservation.product_id,
                    reservation.product_name,
                    reservation.quantity,
                    reservation.unit_price,
                ))
                .map_err(|e| OrderError::InvalidInput(format!("order total: {e}")))?;
        }
        let reserved_units = ledger.staged_units();
        let decrements = ledger.into_adjustments();

        self.orders
            .insert_order(&order, &decrements)
            .await
            .map_err(stock_conflict)?;

        metrics::counter!("stock_reserved_units_total").increment(reserved_units);
        Ok(order.id)
    }

    /// Cancels an order, returning its units to stock exactly once.
    ///
    /// Lines whose product has since been deleted are skipped.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_order(&self, order_id: OrderId) -> Result<(), DomainError> {
        let order = self
            .orders
            .find_order(order_id)
            .await?
            .ok_or(OrderError::OrderNotFound(order_id))?;

        let mut ledger = StockLedger::new(&self.products);
        for item in &order.items {
            if !ledger.release(item.product_id, item.quantity).await? {
                tracing::debug!(product_id = %item.product_id, "product no longer exists, skipping release");
            }
        }
        let released_units = ledger.staged_units();
        let increments = ledger.into_adjustments();

        // A concurrent cancel may have removed the order since it was read;
        // only the caller whose delete succeeds restores stock.
        if !self.orders.delete_order(order_id, &increments).await? {
            return Err(OrderError::OrderNotFound(order_id).into());
        }

        metrics::counter!("orders_cancelled_total").increment(1);
        metrics::counter!("stock_released_units_total").increment(released_units);
        tracing::info!(%order_id, released_units, "order cancelled");
        Ok(())
    }

    /// Loads an order with its customer and line items.
    #[tracing::instrument(skip(self))]
    pub async fn get_order_details(&self, order_id: OrderId) -> Result<OrderDetails, DomainError> {
        let order = self
            .orders
            .find_order(order_id)
            .await?
            .ok_or(OrderError::OrderNotFound(order_id))?;
        let customer = self.customer_summary(order.customer_id).await?;
        details_of(order, customer)
    }

    /// Lists every order, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<OrderDetails>, DomainError> {
        let orders = self.orders.list_orders().await?;

        let mut customers: HashMap<CustomerId, CustomerSummary> = HashMap::new();
        let mut details = Vec::with_capacity(orders.len());
        for order in orders {
            let customer = match customers.get(&order.customer_id) {
                Some(summary) => summary.clone(),
                None => {
                    let summary = self.customer_summary(order.customer_id).await?;
                    customers.insert(order.customer_id, summary.clone());
                    summary
                }
            };
            details.push(details_of(order, customer)?);
        }

        Ok(details)
    }

    async fn customer_summary(&self, id: CustomerId) -> Result<CustomerSummary, DomainError> {
        let customer = self
            .customers
            .find_customer(id)
            .await?
            .ok_or(StoreError::CustomerNotFound(id))?;
        Ok(CustomerSummary::from(&customer))
    }
}

fn details_of(order: Order, customer: CustomerSummary) -> Result<OrderDetails, DomainError> {
    let order_id = order.id;
    OrderDetails::new(order, customer).map_err(|e| {
        StoreError::InvalidRow(format!("order {order_id} line total: {e}")).into()
    })
}

/// Maps stock failures detected at commit time to the same errors staging
/// reports.
fn stock_conflict(e: StoreError) -> DomainError {
    match e {
        StoreError::ProductNotFound(id) => OrderError::ProductNotFound(id).into(),
        StoreError::InsufficientStock {
            product_id,
            available,
            requested,
        } => OrderError::InsufficientStock {
            product_id,
            available,
            requested,
        }
        .into(),
        other => other.into(),
    }
}
