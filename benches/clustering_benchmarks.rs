use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use geocluster::{ClusterConfig, Clusterer, ClusteringStrategy, IndexKind, TreeCut, Viewport};

/// Deterministic points scattered around a handful of cities.
fn scatter(n: usize) -> Vec<(f64, f64)> {
    let centres = [
        (-73.98, 40.75),
        (-0.12, 51.50),
        (139.69, 35.68),
        (18.42, -33.92),
        (-46.63, -23.55),
    ];
    let mut state = 0x2545_f491_4f6c_dd1du64;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        (state >> 11) as f64 / (1u64 << 53) as f64
    };
    (0..n)
        .map(|i| {
            let (lng, lat) = centres[i % centres.len()];
            (lng + (next() - 0.5) * 6.0, lat + (next() - 0.5) * 6.0)
        })
        .collect()
}

fn benchmark_single_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_load");
    group.sample_size(20);

    for &size in &[1_000usize, 10_000] {
        let points = scatter(size);
        for strategy in ClusteringStrategy::ALL {
            group.bench_with_input(BenchmarkId::new(strategy.to_string(), size), &points, |b, points| {
                b.iter(|| {
                    let config = ClusterConfig::new(0, 16).with_strategy(strategy);
                    let mut clusterer = Clusterer::new(config).unwrap();
                    clusterer.load_coords(black_box(points)).unwrap();
                    clusterer
                })
            });
        }
    }

    group.finish();
}

fn benchmark_incremental_batches(c: &mut Criterion) {
    let mut group = c.benchmark_group("incremental_batches");
    group.sample_size(10);

    let points = scatter(10_000);
    for strategy in ClusteringStrategy::ALL {
        group.bench_function(strategy.to_string(), |b| {
            b.iter(|| {
                let config = ClusterConfig::new(0, 16).with_strategy(strategy);
                let mut clusterer = Clusterer::new(config).unwrap();
                for chunk in points.chunks(500) {
                    clusterer.load_coords(black_box(chunk)).unwrap();
                }
                clusterer
            })
        });
    }

    group.finish();
}

fn benchmark_index_kinds(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_kinds");
    group.sample_size(20);

    let points = scatter(5_000);
    for kind in IndexKind::ALL {
        group.bench_function(kind.to_string(), |b| {
            b.iter(|| {
                let config = ClusterConfig::new(0, 16).with_index(kind);
                let mut clusterer = Clusterer::new(config).unwrap();
                clusterer.load_coords(black_box(&points)).unwrap();
                clusterer
            })
        });
    }

    group.finish();
}

fn benchmark_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("queries");

    let mut clusterer = Clusterer::new(ClusterConfig::new(0, 16)).unwrap();
    clusterer.load_coords(&scatter(20_000)).unwrap();
    let europe = Viewport::new(-10.0, 35.0, 30.0, 60.0);
    let pacific = Viewport::new(120.0, -50.0, -120.0, 50.0);

    group.bench_function("viewport_world_z2", |b| {
        b.iter(|| clusterer.clusters(black_box(&Viewport::world()), 2))
    });

    group.bench_function("viewport_europe_z8", |b| {
        b.iter(|| clusterer.clusters(black_box(&europe), 8))
    });

    group.bench_function("viewport_antimeridian_z4", |b| {
        b.iter(|| clusterer.clusters(black_box(&pacific), 4))
    });

    let cut = TreeCut::default();
    group.bench_function("tree_cut_world_z3", |b| {
        b.iter(|| clusterer.clusters_tree_cut(black_box(&Viewport::world()), 3, &cut))
    });

    group.bench_function("labels_z10", |b| b.iter(|| clusterer.clustering_labels(black_box(10))));

    group.finish();
}

criterion_group!(
    benches,
    benchmark_single_load,
    benchmark_incremental_batches,
    benchmark_index_kinds,
    benchmark_queries
);
criterion_main!(benches);
