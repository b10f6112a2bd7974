//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container and need a Docker daemon.
//! Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration -- --ignored --test-threads=1
//! ```

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use common::{Money, PageRequest, SortDirection};
use sqlx::PgPool;
use store::{
    Customer, CustomerQuery, CustomerSortColumn, CustomerStore, Order, OrderItem, OrderStore,
    PostgresStore, Product, ProductChanges, ProductQuery, ProductStore, StockAdjustment,
    StoreError, UniqueField,
};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            sqlx::raw_sql(include_str!("../../../migrations/001_create_tables.sql"))
                .execute(&temp_pool)
                .await
                .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresStore {
    let info = get_container_info().await;

    let store = PostgresStore::connect(&info.connection_string, 5)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE order_items, orders, products, customers")
        .execute(store.pool())
        .await
        .unwrap();

    store
}

fn customer(name: &str, email: &str, phone: &str) -> Customer {
    Customer::new(
        name,
        email,
        phone,
        NaiveDate::from_ymd_opt(1990, 3, 14).unwrap(),
    )
}

fn single_line_order(customer: &Customer, product: &Product, quantity: u32) -> Order {
    let mut order = Order::new(customer.id, Utc::now());
    order
        .add_item(OrderItem::new(
            product.id,
            product.name.clone(),
            quantity,
            product.price,
        ))
        .unwrap();
    order
}

fn adjustment(product: &Product, quantity: u32) -> StockAdjustment {
    StockAdjustment {
        product_id: product.id,
        quantity,
    }
}

#[tokio::test]
#[ignore = "requires docker"]
async fn customer_round_trip_and_unique_email() {
    let store = get_test_store().await;
    let alice = customer("Alice", "alice@example.com", "555-0100");
    store.insert_customer(&alice).await.unwrap();

    let found = store.find_customer(alice.id).await.unwrap().unwrap();
    assert_eq!(found, alice);

    let err = store
        .insert_customer(&customer("Other", "alice@example.com", "555-0199"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::UniqueViolation(UniqueField::CustomerEmail)
    ));
}

#[tokio::test]
#[ignore = "requires docker"]
async fn find_or_insert_returns_existing_customer() {
    let store = get_test_store().await;

    let (first, created) = store
        .find_or_insert_customer(customer("Alice", "alice@example.com", "555-0100"))
        .await
        .unwrap();
    assert!(created);

    let (second, created) = store
        .find_or_insert_customer(customer("Alias", "other@example.com", "555-0100"))
        .await
        .unwrap();
    assert!(!created);
    assert_eq!(second.id, first.id);
    assert_eq!(second.full_name, "Alice");
}

#[tokio::test]
#[ignore = "requires docker"]
async fn concurrent_find_or_insert_creates_one_customer() {
    let store = get_test_store().await;

    let mut handles = Vec::new();
    for i in 0..8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .find_or_insert_customer(customer(
                    &format!("Racer {i}"),
                    "race@example.com",
                    &format!("555-02{i:02}"),
                ))
                .await
                .unwrap()
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().0.id);
    }
    ids.dedup();
    assert_eq!(ids.len(), 1);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn product_price_keeps_two_decimals() {
    let store = get_test_store().await;
    let product = Product::new("Widget", Money::from_cents(1999), 4);
    store.insert_product(&product).await.unwrap();

    let found = store.find_product(product.id).await.unwrap().unwrap();
    assert_eq!(found.price, Money::from_cents(1999));
    assert_eq!(found.price.to_string(), "$19.99");
    assert_eq!(found.stock_quantity, 4);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn update_product_keeps_stock() {
    let store = get_test_store().await;
    let product = Product::new("Widget", Money::from_cents(1000), 7);
    store.insert_product(&product).await.unwrap();

    let updated = store
        .update_product(
            product.id,
            &ProductChanges {
                name: "Widget Pro".to_string(),
                price: Money::from_cents(1500),
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.name, "Widget Pro");
    assert_eq!(updated.price, Money::from_cents(1500));
    assert_eq!(updated.stock_quantity, 7);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn insert_order_decrements_stock_and_stores_items() {
    let store = get_test_store().await;
    let alice = customer("Alice", "alice@example.com", "555-0100");
    store.insert_customer(&alice).await.unwrap();
    let product = Product::new("Widget", Money::from_cents(1000), 5);
    store.insert_product(&product).await.unwrap();

    let order = single_line_order(&alice, &product, 3);
    store
        .insert_order(&order, &[adjustment(&product, 3)])
        .await
        .unwrap();

    let stock = store.find_product(product.id).await.unwrap().unwrap();
    assert_eq!(stock.stock_quantity, 2);

    let stored = store.find_order(order.id).await.unwrap().unwrap();
    assert_eq!(stored.total_amount, Money::from_cents(3000));
    assert_eq!(stored.items.len(), 1);
    assert_eq!(stored.items[0].product_name, "Widget");
    assert_eq!(stored.items[0].quantity, 3);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn insert_order_rolls_back_on_insufficient_stock() {
    let store = get_test_store().await;
    let alice = customer("Alice", "alice@example.com", "555-0100");
    store.insert_customer(&alice).await.unwrap();
    let plenty = Product::new("Plenty", Money::from_cents(100), 10);
    let scarce = Product::new("Scarce", Money::from_cents(100), 1);
    store.insert_product(&plenty).await.unwrap();
    store.insert_product(&scarce).await.unwrap();

    let order = single_line_order(&alice, &plenty, 5);
    let err = store
        .insert_order(
            &order,
            &[adjustment(&plenty, 5), adjustment(&scarce, 2)],
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        StoreError::InsufficientStock {
            available: 1,
            requested: 2,
            ..
        }
    ));
    let plenty_after = store.find_product(plenty.id).await.unwrap().unwrap();
    assert_eq!(plenty_after.stock_quantity, 10);
    assert!(store.find_order(order.id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires docker"]
async fn concurrent_orders_never_oversell() {
    let store = get_test_store().await;
    let alice = customer("Alice", "alice@example.com", "555-0100");
    store.insert_customer(&alice).await.unwrap();
    let product = Product::new("Limited", Money::from_cents(500), 3);
    store.insert_product(&product).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..6 {
        let store = store.clone();
        let order = single_line_order(&alice, &product, 1);
        let decrement = adjustment(&product, 1);
        handles.push(tokio::spawn(async move {
            store.insert_order(&order, &[decrement]).await
        }));
    }

    let mut placed = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            placed += 1;
        }
    }

    assert_eq!(placed, 3);
    let after = store.find_product(product.id).await.unwrap().unwrap();
    assert_eq!(after.stock_quantity, 0);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn delete_order_restores_stock_and_skips_deleted_products() {
    let store = get_test_store().await;
    let alice = customer("Alice", "alice@example.com", "555-0100");
    store.insert_customer(&alice).await.unwrap();
    let kept = Product::new("Kept", Money::from_cents(100), 5);
    let removed = Product::new("Removed", Money::from_cents(100), 5);
    store.insert_product(&kept).await.unwrap();
    store.insert_product(&removed).await.unwrap();

    let mut order = single_line_order(&alice, &kept, 2);
    order
        .add_item(OrderItem::new(removed.id, "Removed", 1, removed.price))
        .unwrap();
    let adjustments = [adjustment(&kept, 2), adjustment(&removed, 1)];
    store.insert_order(&order, &adjustments).await.unwrap();
    assert!(store.delete_product(removed.id).await.unwrap());

    assert!(store.delete_order(order.id, &adjustments).await.unwrap());
    assert!(!store.delete_order(order.id, &adjustments).await.unwrap());

    let kept_after = store.find_product(kept.id).await.unwrap().unwrap();
    assert_eq!(kept_after.stock_quantity, 5);
    assert!(store.find_product(removed.id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires docker"]
async fn customer_with_orders_cannot_be_deleted() {
    let store = get_test_store().await;
    let alice = customer("Alice", "alice@example.com", "555-0100");
    store.insert_customer(&alice).await.unwrap();
    let product = Product::new("Widget", Money::from_cents(100), 5);
    store.insert_product(&product).await.unwrap();
    store
        .insert_order(&single_line_order(&alice, &product, 1), &[])
        .await
        .unwrap();

    let err = store.delete_customer(alice.id).await.unwrap_err();
    assert!(matches!(err, StoreError::CustomerHasOrders(id) if id == alice.id));
}

#[tokio::test]
#[ignore = "requires docker"]
async fn list_customers_filters_sorts_and_pages() {
    let store = get_test_store().await;
    for (i, name) in ["Carol Adams", "alice Brown", "Bob Carter", "Alan Dale"]
        .iter()
        .enumerate()
    {
        store
            .insert_customer(&customer(
                name,
                &format!("c{i}@example.com"),
                &format!("555-03{i:02}"),
            ))
            .await
            .unwrap();
    }

    let query = CustomerQuery::new()
        .search("AL")
        .sort_by(CustomerSortColumn::Email, SortDirection::Desc)
        .page(PageRequest::new(1, 2))
        .draw(3);
    let page = store.list_customers(&query).await.unwrap();

    assert_eq!(page.draw, Some(3));
    assert_eq!(page.records_total, 4);
    assert_eq!(page.records_filtered, 2);
    let names: Vec<_> = page.data.iter().map(|c| c.full_name.as_str()).collect();
    assert_eq!(names, vec!["Alan Dale", "alice Brown"]);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn list_products_applies_price_bounds() {
    let store = get_test_store().await;
    for (name, cents) in [("Apple", 100), ("Banana", 250), ("Cherry", 500)] {
        store
            .insert_product(&Product::new(name, Money::from_cents(cents), 1))
            .await
            .unwrap();
    }

    let query = ProductQuery::new()
        .low_price(Money::from_cents(200))
        .high_price(Money::from_cents(500));
    let page = store.list_products(&query).await.unwrap();

    assert_eq!(page.records_filtered, 2);
    let names: Vec<_> = page.data.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Banana", "Cherry"]);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn list_orders_returns_newest_first() {
    let store = get_test_store().await;
    let alice = customer("Alice", "alice@example.com", "555-0100");
    store.insert_customer(&alice).await.unwrap();
    let product = Product::new("Widget", Money::from_cents(100), 10);
    store.insert_product(&product).await.unwrap();

    let mut older = single_line_order(&alice, &product, 1);
    older.order_date = Utc::now() - chrono::Duration::hours(1);
    let newer = single_line_order(&alice, &product, 2);
    store.insert_order(&older, &[]).await.unwrap();
    store.insert_order(&newer, &[]).await.unwrap();

    let orders = store.list_orders().await.unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].id, newer.id);
    assert_eq!(orders[0].items[0].quantity, 2);
    assert_eq!(orders[1].id, older.id);
}
