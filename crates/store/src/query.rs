use std::cmp::Ordering;

use common::{Money, PageRequest, SortDirection};
use serde::{Deserialize, Serialize};

use crate::model::{Customer, Product};

/// Columns a customer listing can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerSortColumn {
    #[default]
    FullName,
    Email,
    PhoneNumber,
    DateOfBirth,
}

impl CustomerSortColumn {
    /// Ascending comparison of two customers on this column.
    pub fn compare(self, a: &Customer, b: &Customer) -> Ordering {
        match self {
            CustomerSortColumn::FullName => a.full_name.cmp(&b.full_name),
            CustomerSortColumn::Email => a.email.cmp(&b.email),
            CustomerSortColumn::PhoneNumber => a.phone_number.cmp(&b.phone_number),
            CustomerSortColumn::DateOfBirth => a.date_of_birth.cmp(&b.date_of_birth),
        }
    }

    /// Column name in the `customers` table.
    pub fn as_sql(self) -> &'static str {
        match self {
            CustomerSortColumn::FullName => "full_name",
            CustomerSortColumn::Email => "email",
            CustomerSortColumn::PhoneNumber => "phone_number",
            CustomerSortColumn::DateOfBirth => "date_of_birth",
        }
    }
}

/// Columns a product listing can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSortColumn {
    #[default]
    Name,
    Price,
    StockQuantity,
}

impl ProductSortColumn {
    /// Ascending comparison of two products on this column.
    pub fn compare(self, a: &Product, b: &Product) -> Ordering {
        match self {
            ProductSortColumn::Name => a.name.cmp(&b.name),
            ProductSortColumn::Price => a.price.cmp(&b.price),
            ProductSortColumn::StockQuantity => a.stock_quantity.cmp(&b.stock_quantity),
        }
    }

    /// Column name in the `products` table.
    pub fn as_sql(self) -> &'static str {
        match self {
            ProductSortColumn::Name => "name",
            ProductSortColumn::Price => "price",
            ProductSortColumn::StockQuantity => "stock_quantity",
        }
    }
}

/// Builder for paged customer listings.
///
/// The search term matches anywhere in the full name, ignoring case.
#[derive(Debug, Clone, Default)]
pub struct CustomerQuery {
    pub page: PageRequest,
    pub search_term: Option<String>,
    pub sort_column: CustomerSortColumn,
    pub sort_direction: SortDirection,
    pub draw: Option<i32>,
}

impl CustomerQuery {
    /// Creates a query for the first page with default sorting.
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects the page window.
    pub fn page(mut self, page: PageRequest) -> Self {
        self.page = page;
        self
    }

    /// Filters by a free-text term.
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search_term = Some(term.into());
        self
    }

    /// Sets the sort column and direction.
    pub fn sort_by(mut self, column: CustomerSortColumn, direction: SortDirection) -> Self {
        self.sort_column = column;
        self.sort_direction = direction;
        self
    }

    /// Echoes a caller-supplied draw counter on the result page.
    pub fn draw(mut self, draw: i32) -> Self {
        self.draw = Some(draw);
        self
    }

    /// The trimmed search term, if one is set and non-empty.
    pub fn term(&self) -> Option<&str> {
        normalized_term(self.search_term.as_deref())
    }

    /// Returns true if the customer passes the filter.
    pub fn matches(&self, customer: &Customer) -> bool {
        self.term()
            .is_none_or(|term| contains_ignore_case(&customer.full_name, term))
    }

    /// Full ordering: the chosen column, then id for a stable order.
    pub fn compare(&self, a: &Customer, b: &Customer) -> Ordering {
        self.sort_direction
            .apply(self.sort_column.compare(a, b))
            .then_with(|| a.id.cmp(&b.id))
    }
}

/// Builder for paged product listings.
///
/// The search term matches anywhere in the name, ignoring case; the price
/// bounds are inclusive.
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    pub page: PageRequest,
    pub search_term: Option<String>,
    pub low_price: Option<Money>,
    pub high_price: Option<Money>,
    pub sort_column: ProductSortColumn,
    pub sort_direction: SortDirection,
    pub draw: Option<i32>,
}

impl ProductQuery {
    /// Creates a query for the first page with default sorting.
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects the page window.
    pub fn page(mut self, page: PageRequest) -> Self {
        self.page = page;
        self
    }

    /// Filters by a free-text term.
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search_term = Some(term.into());
        self
    }

    /// Keeps products priced at or above `low`.
    pub fn low_price(mut self, low: Money) -> Self {
        self.low_price = Some(low);
        self
    }

    /// Keeps products priced at or below `high`.
    pub fn high_price(mut self, high: Money) -> Self {
        self.high_price = Some(high);
        self
    }

    /// Sets the sort column and direction.
    pub fn sort_by(mut self, column: ProductSortColumn, direction: SortDirection) -> Self {
        self.sort_column = column;
        self.sort_direction = direction;
        self
    }

    /// Echoes a caller-supplied draw counter on the result page.
    pub fn draw(mut self, draw: i32) -> Self {
        self.draw = Some(draw);
        self
    }

    /// The trimmed search term, if one is set and non-empty.
    pub fn term(&self) -> Option<&str> {
        normalized_term(self.search_term.as_deref())
    }

    /// Returns true if the product passes every filter.
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(term) = self.term()
            && !contains_ignore_case(&product.name, term)
        {
            return false;
        }
        if let Some(low) = self.low_price
            && product.price < low
        {
            return false;
        }
        if let Some(high) = self.high_price
            && product.price > high
        {
            return false;
        }
        true
    }

    /// Full ordering: the chosen column, then id for a stable order.
    pub fn compare(&self, a: &Product, b: &Product) -> Ordering {
        self.sort_direction
            .apply(self.sort_column.compare(a, b))
            .then_with(|| a.id.cmp(&b.id))
    }
}

fn normalized_term(term: Option<&str>) -> Option<&str> {
    term.map(str::trim).filter(|t| !t.is_empty())
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
