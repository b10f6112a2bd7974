//! Shared types for the order management service.

mod money;
mod paging;
mod types;

pub use money::{Money, MoneyOverflow};
pub use paging::{Page, PageRequest, SortDirection};
pub use types::{CustomerId, OrderId, OrderItemId, ProductId};
