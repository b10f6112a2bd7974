use async_trait::async_trait;
use common::{CustomerId, OrderId, Page, ProductId};

use crate::{
    CustomerQuery, ProductQuery, Result,
    model::{Customer, Order, Product, ProductChanges, StockAdjustment},
};

/// Persistence for customers.
#[async_trait]
pub trait CustomerStore: Send + Sync {
    /// Retrieves a customer by id.
    async fn find_customer(&self, id: CustomerId) -> Result<Option<Customer>>;

    /// Retrieves the customer holding `email`.
    async fn find_customer_by_email(&self, email: &str) -> Result<Option<Customer>>;

    /// Retrieves the customer holding `phone_number`.
    async fn find_customer_by_phone(&self, phone_number: &str) -> Result<Option<Customer>>;

    /// Retrieves a customer holding either contact detail.
    ///
    /// If the email and the phone number belong to different customers, the
    /// email match wins.
    async fn find_customer_by_email_or_phone(
        &self,
        email: &str,
        phone_number: &str,
    ) -> Result<Option<Customer>>;

    /// Inserts a new customer.
    ///
    /// Fails with `UniqueViolation` if the email or phone number is taken.
    async fn insert_customer(&self, customer: &Customer) -> Result<()>;

    /// Returns the existing customer matching the email or phone number of
    /// `candidate`, or inserts `candidate`.
    ///
    /// The check and the insert are a single conditional write, so two
    /// concurrent calls with the same contact details yield one customer.
    /// The flag is true when `candidate` was inserted.
    async fn find_or_insert_customer(&self, candidate: Customer) -> Result<(Customer, bool)>;

    /// Replaces a customer's fields.
    ///
    /// Fails with `CustomerNotFound` or `UniqueViolation`.
    async fn update_customer(&self, customer: &Customer) -> Result<()>;

    /// Deletes a customer. Returns false if it did not exist.
    ///
    /// Fails with `CustomerHasOrders` while orders reference the customer.
    async fn delete_customer(&self, id: CustomerId) -> Result<bool>;

    /// Lists one page of customers.
    async fn list_customers(&self, query: &CustomerQuery) -> Result<Page<Customer>>;
}

/// Persistence for products and their stock.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Retrieves a product by id.
    async fn find_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Retrieves a product by exact name.
    async fn find_product_by_name(&self, name: &str) -> Result<Option<Product>>;

    /// Inserts a new product.
    ///
    /// Fails with `UniqueViolation` if the name is taken.
    async fn insert_product(&self, product: &Product) -> Result<()>;

    /// Changes a product's name and price, leaving stock untouched.
    async fn update_product(&self, id: ProductId, changes: &ProductChanges) -> Result<Product>;

    /// Deletes a product. Returns false if it did not exist.
    async fn delete_product(&self, id: ProductId) -> Result<bool>;

    /// Lists one page of products.
    async fn list_products(&self, query: &ProductQuery) -> Result<Page<Product>>;
}

/// Persistence for orders, coupled with the stock they hold.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Inserts an order and applies its stock decrements atomically.
    ///
    /// Each decrement only succeeds if enough stock remains at write time.
    /// On any failure nothing is written.
    async fn insert_order(&self, order: &Order, decrements: &[StockAdjustment]) -> Result<()>;

    /// Retrieves an order with its items in placement order.
    async fn find_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Lists all orders, newest first.
    async fn list_orders(&self) -> Result<Vec<Order>>;

    /// Deletes an order and applies its stock increments atomically.
    ///
    /// Increments for products that no longer exist are skipped. Returns
    /// false, and changes nothing, if the order did not exist.
    async fn delete_order(&self, id: OrderId, increments: &[StockAdjustment]) -> Result<bool>;
}

/// Every store the services need, behind one bound.
pub trait Store: CustomerStore + ProductStore + OrderStore + Clone + 'static {}

impl<T> Store for T where T: CustomerStore + ProductStore + OrderStore + Clone + 'static {}
