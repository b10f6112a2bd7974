//! Storage for customers, products and orders.
//!
//! Each aggregate has its own narrow trait ([`CustomerStore`],
//! [`ProductStore`], [`OrderStore`]); [`InMemoryStore`] and
//! [`PostgresStore`] implement all three.

pub mod error;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod query;
pub mod store;

pub use error::{Result, StoreError, UniqueField};
pub use memory::InMemoryStore;
pub use model::{Customer, Order, OrderItem, Product, ProductChanges, StockAdjustment};
pub use postgres::PostgresStore;
pub use query::{CustomerQuery, CustomerSortColumn, ProductQuery, ProductSortColumn};
pub use store::{CustomerStore, OrderStore, ProductStore, Store};
