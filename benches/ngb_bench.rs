use colar::prelude::*;
use criterion::{criterion_group, criterion_main, Criterion};
use rand::{Rng, SeedableRng};

fn random_gas(n: usize, side: f64) -> Particles {
    let mut rng = rand::rngs::StdRng::seed_from_u64(42);
    let positions = (0..n)
        .map(|_| {
            Pos::new(
                rng.gen::<f64>() * side,
                rng.gen::<f64>() * side,
                rng.gen::<f64>() * side,
            )
        })
        .collect();
    let mut parts = Particles::from_positions(positions, 0.5);
    parts.make_index();
    parts
}

fn ngb_list_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("ngb_list");
    for n in [1_000usize, 10_000] {
        // density about one particle per unit volume
        let side = (n as f64).powf(1.0 / 3.0);
        group.bench_function(format!("{}_particles", n), |b| {
            let mut parts = random_gas(n, side);
            b.iter(|| parts.make_ngb_list(1.3));
        });
    }
    group.finish();
}

fn boo_bench(c: &mut Criterion) {
    let side = (10_000f64).powf(1.0 / 3.0);
    let mut parts = random_gas(10_000, side);
    parts.make_ngb_list(1.3);
    c.bench_function("boos_10k", |b| b.iter(|| parts.boos_all()));
}

criterion_group!(benches, ngb_list_bench, boo_bench);
criterion_main!(benches);
