use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use serde::{Deserialize, Serialize};
use std::hint::black_box;
use strata_database::{Database, Record, TxOptions};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Profile {
    name: String,
    email: String,
    active: bool,
}

impl Record for Profile {
    const TABLE: &'static str = "profiles";
}

fn profile(n: usize) -> Profile {
    Profile { name: format!("user-{n}"), email: format!("user-{n}@example.com"), active: true }
}

fn seeded(rows: usize) -> Database {
    let db = Database::builder().name("bench").table::<Profile>().build().unwrap();
    db.transaction(TxOptions::repeatable_read(), |tx| {
        for n in 0..rows {
            tx.insert(&profile(n))?;
        }
        Ok::<_, strata_database::DatabaseError>(())
    })
    .unwrap();
    db
}

// ============================================================================
// Benchmark: Point operations per isolation level
// ============================================================================

fn bench_point_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("point_operations");
    let db = seeded(1_000);

    group.bench_function("read_only_get", |b| {
        b.iter(|| {
            let row = db
                .transaction(TxOptions::read_only(), |tx| tx.fetch_optional::<Profile>(black_box(500)))
                .unwrap();
            black_box(row);
        });
    });

    group.bench_function("repeatable_read_insert", |b| {
        b.iter(|| {
            black_box(db.transaction(TxOptions::repeatable_read(), |tx| tx.insert(&profile(1))).unwrap());
        });
    });

    group.bench_function("serializable_read_modify_write", |b| {
        b.iter(|| {
            db.transaction(TxOptions::serializable(), |tx| {
                let mut row = tx.fetch_optional::<Profile>(7)?.unwrap();
                row.active = !row.active;
                tx.update(7, &row)
            })
            .unwrap();
        });
    });

    group.finish();
}

// ============================================================================
// Benchmark: Full table scans
// ============================================================================

fn bench_scans(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan");

    for rows in [100, 1_000, 10_000] {
        let db = seeded(rows);
        group.throughput(Throughput::Elements(u64::try_from(rows).unwrap_or(u64::MAX)));
        group.bench_with_input(BenchmarkId::new("fetch_all", rows), &db, |b, db| {
            b.iter(|| {
                black_box(db.transaction(TxOptions::read_only(), |tx| tx.fetch_all::<Profile>()).unwrap());
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_point_operations, bench_scans);
criterion_main!(benches);
