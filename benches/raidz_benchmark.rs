use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use raidzrs::abd::Abd;
use raidzrs::harness::forced_targets;
use raidzrs::map::RaidzMap;
use raidzrs::math::{RecVariant, GEN_NAMES};
use raidzrs::registry::ImplRegistry;
use std::hint::black_box;

const DCOLS: usize = 8;
const ASHIFT: u32 = 12;
const SIZES: [usize; 3] = [1 << 12, 1 << 17, 1 << 20];

fn data(size: usize) -> Abd {
    Abd::from_vec((0..size).map(|i| (i as u32).wrapping_mul(2654435761) as u8).collect())
}

/// Parity generation for every backend and arity
fn bench_generate(c: &mut Criterion) {
    let registry = ImplRegistry::detect();
    for (i, method) in GEN_NAMES.iter().enumerate() {
        let nparity = i + 1;
        let mut group = c.benchmark_group(*method);
        for size in SIZES {
            group.throughput(Throughput::Bytes(size as u64));
            for ops in registry.backends() {
                let mut abd = data(size);
                let mut map =
                    RaidzMap::build_single_row(&mut abd, 0, size, ASHIFT, DCOLS + nparity, nparity)
                        .unwrap();
                group.bench_with_input(BenchmarkId::new(ops.name(), size), &size, |b, _| {
                    b.iter(|| ops.generate(black_box(&mut map)).unwrap());
                });
            }
        }
        group.finish();
    }
}

/// Each reconstruction method, forced on a triple-parity map
fn bench_reconstruct(c: &mut Criterion) {
    let registry = ImplRegistry::detect();
    let size = 1 << 17;
    for variant in RecVariant::ALL {
        let mut group = c.benchmark_group(variant.name());
        group.throughput(Throughput::Bytes(size as u64));
        let lost: Vec<usize> = (0..3 - variant.parity_targets().len()).collect();
        let targets = forced_targets(variant, &lost);
        for ops in registry.backends() {
            let mut abd = data(size);
            let mut map = RaidzMap::build_single_row(&mut abd, 0, size, ASHIFT, DCOLS + 3, 3).unwrap();
            ops.generate(&mut map).unwrap();
            group.bench_function(ops.name(), |b| {
                b.iter(|| ops.reconstruct(black_box(&mut map), &targets).unwrap());
            });
        }
        group.finish();
    }
}

/// Multi-row layout construction
fn bench_map_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("map_build");
    for size in SIZES {
        let mut abd = data(size);
        group.bench_with_input(BenchmarkId::new("expanded", size), &size, |b, &size| {
            b.iter(|| {
                let map = RaidzMap::build(&mut abd, 0, size, 9, DCOLS + 4, DCOLS + 3, 3, Some(1 << 16))
                    .unwrap();
                black_box(map.nrows())
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_generate, bench_reconstruct, bench_map_build);
criterion_main!(benches);
