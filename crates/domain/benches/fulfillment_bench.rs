use chrono::NaiveDate;
use common::Money;
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{CustomerDetails, LineItem, OrderService, PlaceOrder};
use store::{InMemoryStore, Product, ProductStore};

type Service = OrderService<InMemoryStore, InMemoryStore, InMemoryStore>;

fn bench_customer() -> CustomerDetails {
    CustomerDetails {
        full_name: "Bench Customer".to_string(),
        email: "bench@example.com".to_string(),
        phone_number: "555-0000".to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
    }
}

fn setup(rt: &tokio::runtime::Runtime, lines: usize) -> (Service, Vec<LineItem>) {
    let store = InMemoryStore::new();
    let service = OrderService::new(store.clone(), store.clone(), store.clone());

    let items = rt.block_on(async {
        let mut items = Vec::with_capacity(lines);
        for i in 0..lines {
            let product = Product::new(
                format!("Product {i:03}"),
                Money::from_cents(100 + i as i64),
                u32::MAX,
            );
            store.insert_product(&product).await.unwrap();
            items.push(LineItem {
                product_id: product.id,
                quantity: 1,
            });
        }
        items
    });

    (service, items)
}

fn bench_place_single_line(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let (service, items) = setup(&rt, 1);

    c.bench_function("fulfillment/place_1_line", |b| {
        b.iter(|| {
            rt.block_on(async {
                service
                    .place_order(PlaceOrder::new(bench_customer(), items.clone()))
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_place_twenty_lines(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let (service, items) = setup(&rt, 20);

    c.bench_function("fulfillment/place_20_lines", |b| {
        b.iter(|| {
            rt.block_on(async {
                service
                    .place_order(PlaceOrder::new(bench_customer(), items.clone()))
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_place_and_cancel(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let (service, items) = setup(&rt, 5);

    c.bench_function("fulfillment/place_and_cancel_5_lines", |b| {
        b.iter(|| {
            rt.block_on(async {
                let order_id = service
                    .place_order(PlaceOrder::new(bench_customer(), items.clone()))
                    .await
                    .unwrap();
                service.cancel_order(order_id).await.unwrap();
            });
        });
    });
}

criterion_group!(
    benches,
    bench_place_single_line,
    bench_place_twenty_lines,
    bench_place_and_cancel
);
criterion_main!(benches);
