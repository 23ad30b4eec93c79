use std::sync::Arc;

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tokio::runtime::Runtime;

use pricewise_catalog::{Category, NewProduct};
use pricewise_core::{CustomerId, Money, ProductId};
use pricewise_infra::store::{CatalogStore, InMemoryStore, OrderStore};
use pricewise_infra::{CampaignEngine, InventoryLedger, OrderEngine};
use pricewise_inventory::{InventoryRecord, StockThresholds};
use pricewise_sales::{Customer, RequestedItem};

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("tokio runtime")
}

/// Store with `count` products, each stocked with `stock` units at 10.00, and one customer.
fn seeded_store(rt: &Runtime, count: usize, stock: i64) -> (Arc<InMemoryStore>, Vec<ProductId>, CustomerId) {
    rt.block_on(async {
        let store = Arc::new(InMemoryStore::new());
        let category = Category::new("Bench", None).expect("category");
        store.insert_category(&category).await.expect("insert category");

        let mut ids = Vec::with_capacity(count);
        for i in 0..count {
            let id = ProductId::new();
            let product = NewProduct::new(format!("Item {i}"), Money::from_major(10))
                .with_category(category.id)
                .into_product(id, Utc::now())
                .expect("product");
            let mut record = InventoryRecord::empty(id, StockThresholds::default(), Utc::now().date_naive());
            record.stock_quantity = stock;
            store.insert_product(&product, &record).await.expect("insert product");
            ids.push(id);
        }

        let customer = Customer::new("Bench Customer", "bench@example.com").expect("customer");
        store.insert_customer(&customer).await.expect("insert customer");
        (store, ids, customer.id)
    })
}

fn bench_place_order(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("place_order");

    for lines in [1usize, 5, 20] {
        group.throughput(Throughput::Elements(lines as u64));
        group.bench_with_input(BenchmarkId::new("lines", lines), &lines, |b, &lines| {
            let (store, ids, customer) = seeded_store(&rt, lines, i64::MAX / 2);
            let engine = OrderEngine::new(Arc::clone(&store));
            let items: Vec<RequestedItem> = ids.iter().map(|id| RequestedItem::new(*id, 1)).collect();
            b.iter(|| {
                let placed = rt
                    .block_on(engine.place_order(customer, "Bench Street 1", items.clone()))
                    .expect("order placed");
                black_box(placed);
            });
        });
    }
    group.finish();
}

fn bench_rejected_order(c: &mut Criterion) {
    let rt = runtime();
    let (store, ids, customer) = seeded_store(&rt, 1, 0);
    let engine = OrderEngine::new(store);
    let items = vec![RequestedItem::new(ids[0], 1)];

    c.bench_function("place_order_insufficient_stock", |b| {
        b.iter(|| {
            let result = rt.block_on(engine.place_order(customer, "Bench Street 1", items.clone()));
            black_box(result.is_err());
        });
    });
}

fn bench_reserve_restock(c: &mut Criterion) {
    let rt = runtime();
    let (store, ids, _) = seeded_store(&rt, 1, 1_000);
    let ledger = InventoryLedger::new(store);
    let id = ids[0];

    c.bench_function("reserve_then_restock", |b| {
        b.iter(|| {
            rt.block_on(async {
                ledger.reserve(id, 1).await.expect("reserve");
                ledger.restock(id, 1).await.expect("restock");
            });
        });
    });
}

fn bench_campaign(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("apply_campaign");
    group.sample_size(20);

    for size in [10usize, 100] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("products", size), &size, |b, &size| {
            let (store, ids, _) = seeded_store(&rt, size, 0);
            let category = rt
                .block_on(store.product(ids[0]))
                .expect("product")
                .and_then(|details| details.product.category_id)
                .expect("category");
            let engine = CampaignEngine::new(store);
            b.iter(|| {
                let outcome = rt.block_on(engine.apply_campaign(category, 1.0)).expect("campaign");
                black_box(outcome);
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_place_order,
    bench_rejected_order,
    bench_reserve_restock,
    bench_campaign
);
criterion_main!(benches);
