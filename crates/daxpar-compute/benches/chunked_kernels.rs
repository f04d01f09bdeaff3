use std::cell::RefCell;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use daxpar_compute::{ComputeBackend, CpuBackend, SerialBackend};

const INPUT_SIZES: &[(&str, usize)] = &[
    ("10k", 10_000),
    ("1m", 1_000_000),
    ("16m", 16 * 1024 * 1024),
];

const CHUNK_SIZES: &[usize] = &[8, 4096, 65_536];

fn bench_axpy(c: &mut Criterion) {
    let serial = SerialBackend;
    let cpu = CpuBackend::new();
    let mut group = c.benchmark_group("axpy_chunked");
    for &(label, len) in INPUT_SIZES {
        group.throughput(Throughput::Elements(len as u64));
        let x = vec![0.1_f64; len];
        let y = RefCell::new(vec![7.1_f64; len]);

        for &chunk in CHUNK_SIZES.iter().filter(|&&c| c <= len) {
            let id = format!("{label}/chunk_{chunk}");
            group.bench_function(BenchmarkId::new("serial", &id), |b| {
                b.iter(|| serial.axpy_chunked(black_box(3.0), &x, &mut y.borrow_mut(), chunk))
            });
            group.bench_function(BenchmarkId::new("rayon", &id), |b| {
                b.iter(|| cpu.axpy_chunked(black_box(3.0), &x, &mut y.borrow_mut(), chunk))
            });
        }
    }
    group.finish();
}

fn bench_sum(c: &mut Criterion) {
    let serial = SerialBackend;
    let cpu = CpuBackend::new();
    let mut group = c.benchmark_group("sum_chunked");
    for &(label, len) in INPUT_SIZES {
        group.throughput(Throughput::Elements(len as u64));
        let y = vec![7.4_f64; len];

        for &chunk in CHUNK_SIZES.iter().filter(|&&c| c <= len) {
            let id = format!("{label}/chunk_{chunk}");
            group.bench_function(BenchmarkId::new("serial", &id), |b| {
                b.iter(|| serial.sum_chunked(black_box(&y), chunk))
            });
            group.bench_function(BenchmarkId::new("rayon", &id), |b| {
                b.iter(|| cpu.sum_chunked(black_box(&y), chunk))
            });
        }
        group.bench_function(BenchmarkId::new("rayon_unchunked", label), |b| {
            b.iter(|| cpu.sum_parallel(black_box(&y)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_axpy, bench_sum);
criterion_main!(benches);
