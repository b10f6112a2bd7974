use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{CustomerId, OrderId, Page, PageRequest, ProductId};
use tokio::sync::RwLock;

use crate::{
    CustomerQuery, ProductQuery, Result, StoreError, UniqueField,
    model::{Customer, Order, Product, ProductChanges, StockAdjustment},
    store::{CustomerStore, OrderStore, ProductStore},
};

#[derive(Default)]
struct Tables {
    customers: HashMap<CustomerId, Customer>,
    products: HashMap<ProductId, Product>,
    orders: HashMap<OrderId, Order>,
}

impl Tables {
    fn check_customer_unique(&self, customer: &Customer) -> Result<()> {
        for other in self.customers.values().filter(|c| c.id != customer.id) {
            if other.email == customer.email {
                return Err(StoreError::UniqueViolation(UniqueField::CustomerEmail));
            }
            if other.phone_number == customer.phone_number {
                return Err(StoreError::UniqueViolation(
                    UniqueField::CustomerPhoneNumber,
                ));
            }
        }
        Ok(())
    }

    fn check_product_name(&self, id: ProductId, name: &str) -> Result<()> {
        if self
            .products
            .values()
            .any(|p| p.id != id && p.name == name)
        {
            return Err(StoreError::UniqueViolation(UniqueField::ProductName));
        }
        Ok(())
    }

    fn customer_by_email_or_phone(&self, email: &str, phone_number: &str) -> Option<&Customer> {
        self.customers
            .values()
            .find(|c| c.email == email)
            .or_else(|| {
                self.customers
                    .values()
                    .find(|c| c.phone_number == phone_number)
            })
    }
}

/// In-memory store implementation for tests and database-less runs.
///
/// All tables sit behind one lock, so every write is atomic with respect to
/// every other operation.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.tables.read().await.orders.len()
    }

    /// Returns the number of stored customers.
    pub async fn customer_count(&self) -> usize {
        self.tables.read().await.customers.len()
    }
}

fn paginate<T: Clone>(
    rows: impl Iterator<Item = T>,
    records_total: usize,
    page: PageRequest,
    draw: Option<i32>,
    mut compare: impl FnMut(&T, &T) -> Ordering,
) -> Page<T> {
    let mut filtered: Vec<T> = rows.collect();
    filtered.sort_by(&mut compare);
    let records_filtered = filtered.len() as u64;

    let data = filtered
        .into_iter()
        .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
        .take(page.page_size() as usize)
        .collect();

    Page {
        draw,
        records_total: records_total as u64,
        records_filtered,
        data,
    }
}

#[async_trait]
impl CustomerStore for InMemoryStore {
    async fn find_customer(&self, id: CustomerId) -> Result<Option<Customer>> {
        Ok(self.tables.read().await.customers.get(&id).cloned())
    }

    async fn find_customer_by_email(&self, email: &str) -> Result<Option<Customer>> {
        let tables = self.tables.read().await;
        Ok(tables.customers.values().find(|c| c.email == email).cloned())
    }

    async fn find_customer_by_phone(&self, phone_number: &str) -> Result<Option<Customer>> {
        let tables = self.tables.read().await;
        Ok(tables
            .customers
            .values()
            .find(|c| c.phone_number == phone_number)
            .cloned())
    }

    async fn find_customer_by_email_or_phone(
        &self,
        email: &str,
        phone_number: &str,
    ) -> Result<Option<Customer>> {
        let tables = self.tables.read().await;
        Ok(tables
            .customer_by_email_or_phone(email, phone_number)
            .cloned())
    }

    async fn insert_customer(&self, customer: &Customer) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.check_customer_unique(customer)?;
        tables.customers.insert(customer.id, customer.clone());
        Ok(())
    }

    async fn find_or_insert_customer(&self, candidate: Customer) -> Result<(Customer, bool)> {
        let mut tables = self.tables.write().await;
        if let Some(existing) =
            tables.customer_by_email_or_phone(&candidate.email, &candidate.phone_number)
        {
            return Ok((existing.clone(), false));
        }
        tables.customers.insert(candidate.id, candidate.clone());
        Ok((candidate, true))
    }

    async fn update_customer(&self, customer: &Customer) -> Result<()> {
        let mut tables = self.tables.write().await;
        if !tables.customers.contains_key(&customer.id) {
            return Err(StoreError::CustomerNotFound(customer.id));
        }
        tables.check_customer_unique(customer)?;
        tables.customers.insert(customer.id, customer.clone());
        Ok(())
    }

    async fn delete_customer(&self, id: CustomerId) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if !tables.customers.contains_key(&id) {
            return Ok(false);
        }
        if tables.orders.values().any(|o| o.customer_id == id) {
            return Err(StoreError::CustomerHasOrders(id));
        }
        tables.customers.remove(&id);
        Ok(true)
    }

    async fn list_customers(&self, query: &CustomerQuery) -> Result<Page<Customer>> {
        let tables = self.tables.read().await;
        Ok(paginate(
            tables
                .customers
                .values()
                .filter(|c| query.matches(c))
                .cloned(),
            tables.customers.len(),
            query.page,
            query.draw,
            |a, b| query.compare(a, b),
        ))
    }
}

#[async_trait]
impl ProductStore for InMemoryStore {
    async fn find_product(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.tables.read().await.products.get(&id).cloned())
    }

    async fn find_product_by_name(&self, name: &str) -> Result<Option<Product>> {
        let tables = self.tables.read().await;
        Ok(tables.products.values().find(|p| p.name == name).cloned())
    }

    async fn insert_product(&self, product: &Product) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.check_product_name(product.id, &product.name)?;
        tables.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn update_product(&self, id: ProductId, changes: &ProductChanges) -> Result<Product> {
        let mut tables = self.tables.write().await;
        if !tables.products.contains_key(&id) {
            return Err(StoreError::ProductNotFound(id));
        }
        tables.check_product_name(id, &changes.name)?;
        let product = tables
            .products
            .get_mut(&id)
            .ok_or(StoreError::ProductNotFound(id))?;
        product.name = changes.name.clone();
        product.price = changes.price;
        Ok(product.clone())
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool> {
        Ok(self.tables.write().await.products.remove(&id).is_some())
    }

    async fn list_products(&self, query: &ProductQuery) -> Result<Page<Product>> {
        let tables = self.tables.read().await;
        Ok(paginate(
            tables
                .products
                .values()
                .filter(|p| query.matches(p))
                .cloned(),
            tables.products.len(),
            query.page,
            query.draw,
            |a, b| query.compare(a, b),
        ))
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn insert_order(&self, order: &Order, decrements: &[StockAdjustment]) -> Result<()> {
        let mut tables = self.tables.write().await;

        if !tables.customers.contains_key(&order.customer_id) {
            return Err(StoreError::CustomerNotFound(order.customer_id));
        }

        // Validate every decrement before touching any row
        let requested = StockAdjustment::merge(decrements);
        for &StockAdjustment {
            product_id,
            quantity,
        } in &requested
        {
            let product = tables
                .products
                .get(&product_id)
                .ok_or(StoreError::ProductNotFound(product_id))?;
            if product.stock_quantity < quantity {
                return Err(StoreError::InsufficientStock {
                    product_id,
                    available: product.stock_quantity,
                    requested: quantity,
                });
            }
        }

        for adjustment in requested {
            if let Some(product) = tables.products.get_mut(&adjustment.product_id) {
                product.stock_quantity -= adjustment.quantity;
            }
        }
        tables.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn find_order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.tables.read().await.orders.get(&id).cloned())
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        let tables = self.tables.read().await;
        let mut orders: Vec<Order> = tables.orders.values().cloned().collect();
        orders.sort_by(|a, b| {
            b.order_date
                .cmp(&a.order_date)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(orders)
    }

    async fn delete_order(&self, id: OrderId, increments: &[StockAdjustment]) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if tables.orders.remove(&id).is_none() {
            return Ok(false);
        }
        for adjustment in increments {
            if let Some(product) = tables.products.get_mut(&adjustment.product_id) {
                product.stock_quantity = product.stock_quantity.saturating_add(adjustment.quantity);
            }
        }
        Ok(true)
    }
}
