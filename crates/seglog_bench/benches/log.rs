//! Log benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;
use seglog_bench::{filled_log, large_segments, random_data, temp_log};
use seglog_core::{Config, Record};
use std::io::Read;

/// Benchmark appends with and without frequent rotation.
fn bench_log_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("log_append");
    group.throughput(Throughput::Elements(1));

    let configs = [
        ("large_segments", large_segments()),
        ("rotating", Config::new().max_store_bytes(64 * 1024).max_index_bytes(12 * 256)),
    ];

    for (name, config) in configs {
        group.bench_with_input(BenchmarkId::from_parameter(name), &config, |b, &config| {
            let (_dir, log) = temp_log(config);
            let data = random_data(256);

            b.iter(|| {
                let offset = log.append(Record::new(black_box(data.clone()))).unwrap();
                black_box(offset);
            });
        });
    }

    group.finish();
}

/// Benchmark random reads across many segments.
fn bench_log_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("log_read");
    let count = 10_000u64;
    let config = Config::new().max_store_bytes(256 * 1024).max_index_bytes(12 * 1000);
    let (_dir, log) = filled_log(config, count, 256);

    group.throughput(Throughput::Elements(1));
    group.bench_function("random", |b| {
        let mut rng = rand::thread_rng();
        b.iter(|| {
            let offset = rng.gen_range(0..count);
            black_box(log.read(offset).unwrap());
        });
    });

    group.finish();
}

/// Benchmark streaming the whole log through the raw reader.
fn bench_log_reader(c: &mut Criterion) {
    let mut group = c.benchmark_group("log_reader");
    let (_dir, log) = filled_log(large_segments(), 10_000, 1024);
    let total: u64 = log.segments().iter().map(|s| s.store_size).sum();

    group.throughput(Throughput::Bytes(total));
    group.bench_function("read_to_end", |b| {
        b.iter(|| {
            let mut bytes = Vec::with_capacity(total as usize);
            log.reader().unwrap().read_to_end(&mut bytes).unwrap();
            black_box(bytes);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_log_append, bench_log_read, bench_log_reader);
criterion_main!(benches);
