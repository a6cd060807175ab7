//! Criterion benchmarks for dispatch overhead.
//! Compares a direct call against exact and widened (capability DAG) dispatch,
//! and polygon joins for vertex counts n in {4, 16, 64}.
//! Results: by default under target/criterion; to store under data/bench, run:
//!   CARGO_TARGET_DIR=data/bench cargo bench -p geokit

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use geokit::dispatch::{OperationKind, ShapeType};
use geokit::geom2::{join_rect_rect, Polygon, Rect, Sim2d};
use geokit::geomnd::Dlt;
use geokit::{builtin_registry, Dispatcher};
use nalgebra::{dvector, vector, Vector2};
use rand::{rngs::StdRng, Rng, SeedableRng};

fn random_convex(n: usize, seed: u64) -> Polygon {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut angles: Vec<f64> = (0..n)
        .map(|_| rng.gen::<f64>() * std::f64::consts::TAU)
        .collect();
    angles.sort_by(|a, b| a.total_cmp(b));
    let c = Vector2::new(rng.gen_range(-0.5..0.5), rng.gen_range(-0.5..0.5));
    Polygon::new(
        angles
            .iter()
            .map(|t| c + Vector2::new(t.cos(), t.sin()))
            .collect(),
    )
}

fn bench_dispatch(c: &mut Criterion) {
    let reg = builtin_registry().unwrap();
    let d = Dispatcher::new(&reg);
    let a = Rect::new(0.0, 0.0, 10.0, 5.0);
    let b = Rect::new(5.0, 0.0, 15.0, 5.0);

    let mut group = c.benchmark_group("dispatch");
    group.bench_function("join_rect_rect_direct", |bch| {
        bch.iter(|| join_rect_rect(black_box(&a), black_box(&b)))
    });
    group.bench_function("join_rect_rect_dispatch", |bch| {
        bch.iter(|| d.join_volume(black_box(&a), black_box(&b)).unwrap())
    });
    group.bench_function("lookup_exact", |bch| {
        let (from, to) = (ShapeType::of::<Rect>(), ShapeType::of::<Rect>());
        bch.iter(|| reg.lookup(OperationKind::JoinVolume, black_box(from), black_box(to)))
    });
    group.bench_function("transform_widened_source", |bch| {
        let s = Sim2d::new(vector![1.0, 2.0], 2.0, 0.3, false);
        bch.iter(|| d.transform(black_box(&s), black_box(&a)).unwrap())
    });
    group.bench_function("transform_widened_target", |bch| {
        let dlt = Dlt::new(dvector![1.0, 1.0], dvector![2.0, 3.0]).unwrap();
        bch.iter(|| d.transform(black_box(&dlt), black_box(&a)).unwrap())
    });
    group.finish();

    let mut group = c.benchmark_group("join_polygon");
    for &n in &[4usize, 16, 64] {
        let p = random_convex(n, 41);
        let q = random_convex(n, 42);
        group.bench_with_input(BenchmarkId::new("dispatch", n), &n, |bch, _| {
            bch.iter(|| d.join_volume(black_box(&p), black_box(&q)).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_dispatch);
criterion_main!(benches);
