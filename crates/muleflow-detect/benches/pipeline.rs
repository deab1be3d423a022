//! Benchmark suite for the detection pipeline.
//!
//! Run with: `cargo bench --package muleflow-detect`

use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use muleflow_core::config::DetectionConfig;
use muleflow_core::model::Transaction;
use muleflow_detect::DetectionPipeline;

/// Synthetic batch: laundering rings layered over background transfers.
fn create_batch(tx_count: usize) -> Vec<Transaction> {
    let account_count = (tx_count / 4).max(8);
    let base = 1_700_000_000;
    let mut rows = Vec::with_capacity(tx_count);

    for i in 0..tx_count {
        let (sender, receiver, amount) = if i % 10 == 0 {
            // Close a small ring every tenth row.
            let ring = (i / 10) % (account_count / 4).max(1);
            let hop = i % 3;
            (
                format!("A{:04}", ring * 3 + hop),
                format!("A{:04}", ring * 3 + (hop + 1) % 3),
                4_000.0 + (i % 7) as f64 * 250.0,
            )
        } else {
            (
                format!("A{:04}", (i * 13 + 5) % account_count),
                format!("A{:04}", (i * 7 + 11) % account_count),
                50.0 + (i % 97) as f64 * 10.0,
            )
        };
        rows.push(Transaction::new(
            sender,
            receiver,
            amount,
            Utc.timestamp_opt(base + (i as i64 * 1_800) % (60 * 86_400), 0)
                .unwrap(),
        ));
    }
    rows
}

fn pipeline_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline/run");
    let pipeline = DetectionPipeline::new(DetectionConfig::default());

    for size in [100usize, 500, 2_000].iter() {
        let batch = create_batch(*size);
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("transactions", size), size, |b, _| {
            b.iter(|| pipeline.run(black_box(&batch)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, pipeline_benchmark);
criterion_main!(benches);
