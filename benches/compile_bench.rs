//! Benchmarks for statement compilation
//!
//! Run with: cargo bench

use confluence::ast::{Expr, SelectStatement, StatementBuilder};
use confluence::compile;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

fn raw_projection(field_count: usize) -> SelectStatement {
    let mut builder = SelectStatement::from_measurement("cpu");
    for i in 0..field_count {
        builder = builder.field(Expr::var(format!("field_{}", i)));
    }
    builder.build()
}

fn aggregate_fanout(source_count: usize) -> SelectStatement {
    let mut builder = StatementBuilder::new();
    for i in 0..source_count {
        builder = builder.measurement(format!("cpu_{}", i));
    }
    builder
        .field(Expr::call("max", vec![Expr::var("usage")]))
        .build()
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");

    for size in [1, 10, 100] {
        let stmt = raw_projection(size);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_function(format!("raw_fields_{}", size), |b| {
            b.iter(|| compile(black_box(&stmt)).unwrap())
        });
    }

    for size in [1, 10, 100] {
        let stmt = aggregate_fanout(size);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_function(format!("aggregate_sources_{}", size), |b| {
            b.iter(|| compile(black_box(&stmt)).unwrap())
        });
    }

    group.finish();
}

fn bench_selector_with_fields(c: &mut Criterion) {
    let stmt = SelectStatement::from_measurement("cpu")
        .field(Expr::call("max", vec![Expr::var("usage")]))
        .field(Expr::var("host"))
        .field(Expr::var("region"))
        .build();

    c.bench_function("selector_with_aux_fields", |b| {
        b.iter(|| compile(black_box(&stmt)).unwrap())
    });
}

criterion_group!(benches, bench_compile, bench_selector_with_fields);
criterion_main!(benches);
