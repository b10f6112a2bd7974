use std::collections::HashMap;

use async_trait::async_trait;
use common::{CustomerId, Money, OrderId, OrderItemId, Page, ProductId};
use rust_decimal::Decimal;
use sqlx::{PgPool, Row, postgres::PgPoolOptions, postgres::PgRow};
use uuid::Uuid;

use crate::{
    CustomerQuery, ProductQuery, Result, StoreError, UniqueField,
    model::{Customer, Order, OrderItem, Product, ProductChanges, StockAdjustment},
    store::{CustomerStore, OrderStore, ProductStore},
};

/// Attempts made by a get-or-create before giving up on a racing writer.
const FIND_OR_INSERT_ATTEMPTS: usize = 3;

const CUSTOMER_COLUMNS: &str = "id, full_name, email, phone_number, date_of_birth";
const PRODUCT_COLUMNS: &str = "id, name, price, stock_quantity";

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool and wraps it in a store.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_customer(row: PgRow) -> Result<Customer> {
        Ok(Customer {
            id: CustomerId::from_uuid(row.try_get::<Uuid, _>("id")?),
            full_name: row.try_get("full_name")?,
            email: row.try_get("email")?,
            phone_number: row.try_get("phone_number")?,
            date_of_birth: row.try_get("date_of_birth")?,
        })
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        Ok(Product {
            id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            price: Money::new(row.try_get::<Decimal, _>("price")?),
            stock_quantity: quantity_from_row(row.try_get("stock_quantity")?)?,
        })
    }

    fn row_to_order(row: &PgRow) -> Result<Order> {
        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            customer_id: CustomerId::from_uuid(row.try_get::<Uuid, _>("customer_id")?),
            order_date: row.try_get("order_date")?,
            total_amount: Money::new(row.try_get::<Decimal, _>("total_amount")?),
            items: Vec::new(),
        })
    }

    fn row_to_item(row: &PgRow) -> Result<OrderItem> {
        Ok(OrderItem {
            id: OrderItemId::from_uuid(row.try_get::<Uuid, _>("id")?),
            product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
            product_name: row.try_get("product_name")?,
            quantity: quantity_from_row(row.try_get("quantity")?)?,
            unit_price: Money::new(row.try_get::<Decimal, _>("unit_price")?),
        })
    }
}

fn quantity_from_row(value: i64) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| StoreError::InvalidRow(format!("quantity out of range: {value}")))
}

/// Maps constraint violations to store errors, passing everything else through.
fn map_constraint(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e {
        match db_err.constraint() {
            Some("uq_customers_email") => {
                return StoreError::UniqueViolation(UniqueField::CustomerEmail);
            }
            Some("uq_customers_phone_number") => {
                return StoreError::UniqueViolation(UniqueField::CustomerPhoneNumber);
            }
            Some("uq_products_name") => {
                return StoreError::UniqueViolation(UniqueField::ProductName);
            }
            _ => {}
        }
    }
    StoreError::Database(e)
}

fn is_constraint(e: &sqlx::Error, name: &str) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.constraint() == Some(name))
}

#[async_trait]
impl CustomerStore for PostgresStore {
    async fn find_customer(&self, id: CustomerId) -> Result<Option<Customer>> {
        let row = sqlx::query(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_customer).transpose()
    }

    async fn find_customer_by_email(&self, email: &str) -> Result<Option<Customer>> {
        let row = sqlx::query(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_customer).transpose()
    }

    async fn find_customer_by_phone(&self, phone_number: &str) -> Result<Option<Customer>> {
        let row = sqlx::query(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE phone_number = $1"
        ))
        .bind(phone_number)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_customer).transpose()
    }

    async fn find_customer_by_email_or_phone(
        &self,
        email: &str,
        phone_number: &str,
    ) -> Result<Option<Customer>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {CUSTOMER_COLUMNS}
            FROM customers
            WHERE email = $1 OR phone_number = $2
            ORDER BY (email = $1) DESC
            LIMIT 1
            "#
        ))
        .bind(email)
        .bind(phone_number)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_customer).transpose()
    }

    async fn insert_customer(&self, customer: &Customer) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO customers (id, full_name, email, phone_number, date_of_birth)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(customer.id.as_uuid())
        .bind(&customer.full_name)
        .bind(&customer.email)
        .bind(&customer.phone_number)
        .bind(customer.date_of_birth)
        .execute(&self.pool)
        .await
        .map_err(map_constraint)?;

        Ok(())
    }

    async fn find_or_insert_customer(&self, candidate: Customer) -> Result<(Customer, bool)> {
        for attempt in 1..=FIND_OR_INSERT_ATTEMPTS {
            if let Some(existing) = self
                .find_customer_by_email_or_phone(&candidate.email, &candidate.phone_number)
                .await?
            {
                return Ok((existing, false));
            }

            let inserted: Option<Uuid> = sqlx::query_scalar(
                r#"
                INSERT INTO customers (id, full_name, email, phone_number, date_of_birth)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT DO NOTHING
                RETURNING id
                "#,
            )
            .bind(candidate.id.as_uuid())
            .bind(&candidate.full_name)
            .bind(&candidate.email)
            .bind(&candidate.phone_number)
            .bind(candidate.date_of_birth)
            .fetch_optional(&self.pool)
            .await?;

            if inserted.is_some() {
                return Ok((candidate, true));
            }

            // A concurrent writer took the email or phone number between the
            // lookup and the insert; the next lookup will see it.
            tracing::debug!(attempt, email = %candidate.email, "customer insert conflicted, retrying lookup");
        }

        Err(StoreError::ConcurrentModification("customer"))
    }

    async fn update_customer(&self, customer: &Customer) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE customers
            SET full_name = $2, email = $3, phone_number = $4, date_of_birth = $5
            WHERE id = $1
            "#,
        )
        .bind(customer.id.as_uuid())
        .bind(&customer.full_name)
        .bind(&customer.email)
        .bind(&customer.phone_number)
        .bind(customer.date_of_birth)
        .execute(&self.pool)
        .await
        .map_err(map_constraint)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::CustomerNotFound(customer.id));
        }
        Ok(())
    }

    async fn delete_customer(&self, id: CustomerId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_constraint(&e, "fk_orders_customer") {
                    return StoreError::CustomerHasOrders(id);
                }
                StoreError::Database(e)
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_customers(&self, query: &CustomerQuery) -> Result<Page<Customer>> {
        const FILTER: &str = "($1::text IS NULL OR strpos(lower(full_name), lower($1)) > 0)";
        let term = query.term();

        let records_total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await?;
        let records_filtered: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM customers WHERE {FILTER}"))
                .bind(term)
                .fetch_one(&self.pool)
                .await?;

        // Sort column and direction come from closed enums, never from input text
        let sql = format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE {FILTER} ORDER BY {} {}, id ASC LIMIT $2 OFFSET $3",
            query.sort_column.as_sql(),
            query.sort_direction.as_sql(),
        );
        let rows = sqlx::query(&sql)
            .bind(term)
            .bind(query.page.limit() as i64)
            .bind(query.page.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(Page {
            draw: query.draw,
            records_total: records_total as u64,
            records_filtered: records_filtered as u64,
            data: rows
                .into_iter()
                .map(Self::row_to_customer)
                .collect::<Result<_>>()?,
        })
    }
}

#[async_trait]
impl ProductStore for PostgresStore {
    async fn find_product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn find_product_by_name(&self, name: &str) -> Result<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE name = $1"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn insert_product(&self, product: &Product) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, price, stock_quantity)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(product.price.amount())
        .bind(i64::from(product.stock_quantity))
        .execute(&self.pool)
        .await
        .map_err(map_constraint)?;

        Ok(())
    }

    async fn update_product(&self, id: ProductId, changes: &ProductChanges) -> Result<Product> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE products
            SET name = $2, price = $3
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(&changes.name)
        .bind(changes.price.amount())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_constraint)?;

        row.map(Self::row_to_product)
            .transpose()?
            .ok_or(StoreError::ProductNotFound(id))
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_products(&self, query: &ProductQuery) -> Result<Page<Product>> {
        const FILTER: &str = r#"($1::text IS NULL OR strpos(lower(name), lower($1)) > 0)
            AND ($2::numeric IS NULL OR price >= $2)
            AND ($3::numeric IS NULL OR price <= $3)"#;
        let term = query.term();
        let low = query.low_price.map(|p| p.amount());
        let high = query.high_price.map(|p| p.amount());

        let records_total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        let records_filtered: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM products WHERE {FILTER}"))
                .bind(term)
                .bind(low)
                .bind(high)
                .fetch_one(&self.pool)
                .await?;

        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE {FILTER} ORDER BY {} {}, id ASC LIMIT $4 OFFSET $5",
            query.sort_column.as_sql(),
            query.sort_direction.as_sql(),
        );
        let rows = sqlx::query(&sql)
            .bind(term)
            .bind(low)
            .bind(high)
            .bind(query.page.limit() as i64)
            .bind(query.page.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(Page {
            draw: query.draw,
            records_total: records_total as u64,
            records_filtered: records_filtered as u64,
            data: rows
                .into_iter()
                .map(Self::row_to_product)
                .collect::<Result<_>>()?,
        })
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn insert_order(&self, order: &Order, decrements: &[StockAdjustment]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        // Merged adjustments are sorted by product id, so concurrent orders
        // lock product rows in the same order.
        for adjustment in StockAdjustment::merge(decrements) {
            let requested = i64::from(adjustment.quantity);
            let remaining: Option<i64> = sqlx::query_scalar(
                r#"
                UPDATE products
                SET stock_quantity = stock_quantity - $2
                WHERE id = $1 AND stock_quantity >= $2
                RETURNING stock_quantity
                "#,
            )
            .bind(adjustment.product_id.as_uuid())
            .bind(requested)
            .fetch_optional(&mut *tx)
            .await?;

            if remaining.is_some() {
                continue;
            }

            let available: Option<i64> =
                sqlx::query_scalar("SELECT stock_quantity FROM products WHERE id = $1")
                    .bind(adjustment.product_id.as_uuid())
                    .fetch_optional(&mut *tx)
                    .await?;

            return Err(match available {
                None => StoreError::ProductNotFound(adjustment.product_id),
                Some(available) => StoreError::InsufficientStock {
                    product_id: adjustment.product_id,
                    available: quantity_from_row(available)?,
                    requested: adjustment.quantity,
                },
            });
        }

        sqlx::query(
            r#"
            INSERT INTO orders (id, customer_id, order_date, total_amount)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.customer_id.as_uuid())
        .bind(order.order_date)
        .bind(order.total_amount.amount())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_constraint(&e, "fk_orders_customer") {
                return StoreError::CustomerNotFound(order.customer_id);
            }
            StoreError::Database(e)
        })?;

        for (position, item) in order.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items (id, order_id, position, product_id, product_name, quantity, unit_price)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(item.id.as_uuid())
            .bind(order.id.as_uuid())
            .bind(position as i32)
            .bind(item.product_id.as_uuid())
            .bind(&item.product_name)
            .bind(i64::from(item.quantity))
            .bind(item.unit_price.amount())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_order(&self, id: OrderId) -> Result<Option<Order>> {
        let Some(row) = sqlx::query(
            "SELECT id, customer_id, order_date, total_amount FROM orders WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let mut order = Self::row_to_order(&row)?;
        let items = sqlx::query(
            r#"
            SELECT id, product_id, product_name, quantity, unit_price
            FROM order_items
            WHERE order_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        order.items = items
            .iter()
            .map(Self::row_to_item)
            .collect::<Result<_>>()?;
        Ok(Some(order))
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT id, customer_id, order_date, total_amount
            FROM orders
            ORDER BY order_date DESC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut orders = rows
            .iter()
            .map(Self::row_to_order)
            .collect::<Result<Vec<_>>>()?;
        if orders.is_empty() {
            return Ok(orders);
        }

        let ids: Vec<Uuid> = orders.iter().map(|o| o.id.as_uuid()).collect();
        let item_rows = sqlx::query(
            r#"
            SELECT id, order_id, product_id, product_name, quantity, unit_price
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY order_id, position ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut items: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        for row in &item_rows {
            let order_id: Uuid = row.try_get("order_id")?;
            items
                .entry(order_id)
                .or_default()
                .push(Self::row_to_item(row)?);
        }
        for order in &mut orders {
            order.items = items.remove(&order.id.as_uuid()).unwrap_or_default();
        }

        Ok(orders)
    }

    async fn delete_order(&self, id: OrderId, increments: &[StockAdjustment]) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            return Ok(false);
        }

        // Deleted products match no row and are skipped
        for adjustment in StockAdjustment::merge(increments) {
            sqlx::query("UPDATE products SET stock_quantity = stock_quantity + $2 WHERE id = $1")
                .bind(adjustment.product_id.as_uuid())
                .bind(i64::from(adjustment.quantity))
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(true)
    }
}
