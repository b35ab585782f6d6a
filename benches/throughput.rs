//! Throughput Benchmark for DriftKV
//!
//! Measures the storage engine under scalar, list, expiry and snapshot
//! workloads.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use driftkv::storage::StorageEngine;
use driftkv::PopMode;
use std::sync::Arc;
use std::time::Duration;

/// Benchmark SET operations
fn bench_set(c: &mut Criterion) {
    let engine = Arc::new(StorageEngine::new());

    let mut group = c.benchmark_group("set");
    group.throughput(Throughput::Elements(1));

    group.bench_function("set_integer", |b| {
        let mut i = 0u64;
        b.iter(|| {
            engine.set(&format!("int:{i}"), "123456", None).unwrap();
            i += 1;
        });
    });

    group.bench_function("set_string", |b| {
        let mut i = 0u64;
        let value = "x".repeat(1024);
        b.iter(|| {
            engine.set(&format!("str:{i}"), &value, None).unwrap();
            i += 1;
        });
    });

    group.bench_function("hset_batch_of_8", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let pairs: Vec<String> = (0..8)
                .flat_map(|n| [format!("batch:{i}:{n}"), n.to_string()])
                .collect();
            engine.hset(&pairs).unwrap();
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark GET operations
fn bench_get(c: &mut Criterion) {
    let engine = Arc::new(StorageEngine::new());

    for i in 0..100_000 {
        engine
            .set(&format!("key:{i}"), &format!("value:{i}"), None)
            .unwrap();
    }

    let mut group = c.benchmark_group("get");
    group.throughput(Throughput::Elements(1));

    group.bench_function("get_existing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let _ = black_box(engine.get(&format!("key:{}", i % 100_000)));
            i += 1;
        });
    });

    group.bench_function("get_missing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let _ = black_box(engine.get(&format!("missing:{i}")));
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark list operations
fn bench_lists(c: &mut Criterion) {
    let engine = Arc::new(StorageEngine::new());

    let mut group = c.benchmark_group("lists");
    group.throughput(Throughput::Elements(1));

    group.bench_function("rpush_then_lpop", |b| {
        b.iter(|| {
            engine.rpush("queue", &[1, 2, 3, 4]).unwrap();
            black_box(engine.lpop("queue", PopMode::Count(4)).unwrap());
        });
    });

    group.bench_function("raddtoset_1k", |b| {
        let mut i = 0i64;
        b.iter(|| {
            black_box(engine.raddtoset("set", &[i % 1000]).unwrap());
            i += 1;
        });
    });

    engine.rpush("wide", &(0..10_000).collect::<Vec<i64>>()).unwrap();
    group.bench_function("lget_wide", |b| {
        let mut i = 0usize;
        b.iter(|| {
            black_box(engine.lget("wide", i % 10_000).unwrap());
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark concurrent access
fn bench_concurrent(c: &mut Criterion) {
    use std::thread;

    let mut group = c.benchmark_group("concurrent");
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("4_threads_mixed", |b| {
        b.iter(|| {
            let engine = Arc::new(StorageEngine::new());
            let handles: Vec<_> = (0..4)
                .map(|t| {
                    let engine = Arc::clone(&engine);
                    thread::spawn(move || {
                        for i in 0..10_000 {
                            let key = format!("key:{t}:{i}");
                            engine.set(&key, "value", None).unwrap();
                            let _ = engine.get(&key);
                            engine.rpush(&format!("list:{t}"), &[i]).unwrap();
                        }
                    })
                })
                .collect();

            for handle in handles {
                handle.join().unwrap();
            }

            black_box(engine.len());
        });
    });

    group.finish();
}

/// Benchmark expiry operations
fn bench_expiry(c: &mut Criterion) {
    let engine = Arc::new(StorageEngine::new());

    let mut group = c.benchmark_group("expiry");
    group.throughput(Throughput::Elements(1));

    group.bench_function("set_with_ttl", |b| {
        let mut i = 0u64;
        b.iter(|| {
            engine.set(&format!("ttl:{i}"), "value", Some(3600)).unwrap();
            i += 1;
        });
    });

    for i in 0..10_000 {
        engine.set(&format!("expire:{i}"), "value", None).unwrap();
    }
    group.bench_function("expire_existing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            engine.expire(&format!("expire:{}", i % 10_000), 3600).unwrap();
            i += 1;
        });
    });

    group.bench_function("sweep_pass", |b| {
        b.iter(|| black_box(engine.sweep()));
    });

    group.finish();
}

/// Benchmark snapshot encoding
fn bench_snapshot(c: &mut Criterion) {
    let engine = Arc::new(StorageEngine::new());

    for i in 0..10_000 {
        engine.set(&format!("user:{i}"), &i.to_string(), None).unwrap();
        engine
            .set(&format!("session:{i}"), "session_data", Some(3600))
            .unwrap();
    }
    for i in 0..100 {
        engine
            .rpush(&format!("list:{i}"), &(0..100).collect::<Vec<i64>>())
            .unwrap();
    }

    let mut group = c.benchmark_group("snapshot");

    group.bench_function("encode_20k_keys", |b| {
        b.iter(|| black_box(engine.encode_snapshot().unwrap()));
    });

    let payload = engine.encode_snapshot().unwrap();
    group.bench_function("restore_20k_keys", |b| {
        b.iter(|| {
            let restored = StorageEngine::new();
            restored.restore_snapshot(&payload).unwrap();
            black_box(restored.len());
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_set,
    bench_get,
    bench_lists,
    bench_concurrent,
    bench_expiry,
    bench_snapshot,
);

criterion_main!(benches);
