//! Domain layer for the order management service.
//!
//! This crate provides:
//! - Customer resolution (get-or-create by email or phone) and strict customer CRUD
//! - Product catalog management
//! - The stock ledger that stages reservations and releases
//! - Order fulfillment and cancellation on top of the store traits

pub mod customer;
pub mod error;
pub mod order;
pub mod product;

pub use customer::{CustomerDetails, CustomerError, CustomerResolver, CustomerService};
pub use error::DomainError;
pub use order::{
    CustomerSummary, LineItem, OrderDetails, OrderError, OrderLine, OrderService, PlaceOrder,
    Reservation, StockLedger,
};
pub use product::{NewProduct, ProductError, ProductService, ProductUpdate};
