use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use stockledger_auth::{Actor, Role};
use stockledger_core::{Entity, TenantId};
use stockledger_infra::{InventoryEngine, LedgerConfig};
use stockledger_inventory::{
    AggregationMode, Product, ProductId, ProductType, StockProjection, StockTransactionDraft, TransactionType,
    Warehouse, WarehouseId,
};

struct Seeded {
    engine: InventoryEngine,
    admin: Actor,
    tenant: TenantId,
    product: ProductId,
    warehouse: WarehouseId,
}

impl Seeded {
    fn draft(&self, quantity: i64) -> StockTransactionDraft {
        StockTransactionDraft::new(
            self.tenant,
            self.product,
            self.warehouse,
            TransactionType::ManualAdjust,
            quantity,
        )
    }
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread().build().unwrap()
}

/// An engine whose single product already carries `history` ledger rows.
fn seed(rt: &tokio::runtime::Runtime, aggregation: AggregationMode, history: usize) -> Seeded {
    rt.block_on(async {
        let engine = InventoryEngine::in_memory(&LedgerConfig::default().with_aggregation(aggregation));
        let admin = Actor::unscoped([Role::ADMIN]);
        let tenant = TenantId::new();
        let warehouse = engine
            .catalog()
            .save_warehouse(&admin, Warehouse::new(tenant, "Main").as_default())
            .await
            .unwrap()
            .id();
        let product = engine
            .catalog()
            .save_product(&admin, Product::new(tenant, "Plank", ProductType::RawMaterial))
            .await
            .unwrap()
            .id();

        let seeded = Seeded {
            engine,
            admin,
            tenant,
            product,
            warehouse,
        };
        for i in 0..history {
            let quantity = if i % 4 == 0 { -1 } else { 2 };
            seeded
                .engine
                .ledger()
                .append_transaction(&seeded.admin, seeded.draft(quantity))
                .await
                .unwrap();
        }
        seeded
    })
}

fn modes() -> [(&'static str, AggregationMode); 2] {
    [
        ("full_rescan", AggregationMode::FullRescan),
        ("incremental", AggregationMode::IncrementalDelta { reconcile_every: 100 }),
    ]
}

fn bench_append_latency_by_history(c: &mut Criterion) {
    let mut group = c.benchmark_group("append_latency_by_history");
    group.throughput(Throughput::Elements(1));
    let rt = runtime();

    for history in [10usize, 100, 1000].iter() {
        for (name, mode) in modes() {
            let seeded = seed(&rt, mode, *history);
            group.bench_with_input(BenchmarkId::new(name, history), history, |b, _| {
                b.iter(|| {
                    rt.block_on(async {
                        let tx = seeded
                            .engine
                            .ledger()
                            .append_transaction(&seeded.admin, seeded.draft(black_box(1)))
                            .await
                            .unwrap();
                        black_box(tx)
                    })
                });
            });
        }
    }

    group.finish();
}

fn bench_reconcile_speed(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile_speed");
    let rt = runtime();

    for history in [100usize, 1000, 10000].iter() {
        let seeded = seed(&rt, AggregationMode::FullRescan, *history);
        group.throughput(Throughput::Elements(*history as u64));
        group.bench_with_input(BenchmarkId::new("reconcile", history), history, |b, _| {
            b.iter(|| {
                rt.block_on(async {
                    let projection = seeded
                        .engine
                        .ledger()
                        .reconcile(&seeded.admin, seeded.tenant, seeded.product)
                        .await
                        .unwrap();
                    black_box(projection)
                })
            });
        });
    }

    group.finish();
}

fn bench_projection_fold(c: &mut Criterion) {
    let mut group = c.benchmark_group("projection_fold");
    let rt = runtime();
    let seeded = seed(&rt, AggregationMode::FullRescan, 1000);
    let rows = rt.block_on(async {
        seeded
            .engine
            .ledger()
            .list_transactions(&seeded.admin, Default::default())
            .await
            .unwrap()
    });

    group.bench_function("from_transactions_1000", |b| {
        b.iter(|| black_box(StockProjection::from_transactions(black_box(&rows))))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_append_latency_by_history,
    bench_reconcile_speed,
    bench_projection_fold
);
criterion_main!(benches);
