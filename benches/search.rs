//! Search benchmarks for performance profiling.
//!
//! Run with: `cargo bench`
//!
//! These benchmarks measure:
//! - Group enumeration on a full board
//! - Random rollouts to a cleared board
//! - Tree search with varying iteration counts

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use former::grid::Grid;
use former::playout::{rollout, RolloutPolicy};
use former::{SearchTree, SolverConfig};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

fn full_board(seed: u64) -> Grid {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    Grid::random(7, 9, &mut rng)
}

fn bench_legal_moves(c: &mut Criterion) {
    let grid = full_board(1);
    c.bench_function("legal_moves_7x9", |b| b.iter(|| black_box(&grid).legal_moves()));
}

fn bench_rollout(c: &mut Criterion) {
    let mut group = c.benchmark_group("rollout_7x9");
    let grid = full_board(2);
    for (name, policy) in [
        ("uniform", RolloutPolicy::Uniform),
        ("size_weighted", RolloutPolicy::SizeWeighted),
    ] {
        group.bench_function(name, |b| {
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
            b.iter(|| rollout(black_box(&grid), policy, usize::MAX, &mut rng).unwrap())
        });
    }
    group.finish();
}

fn bench_search_iterations(c: &mut Criterion) {
    let mut group = c.benchmark_group("search_iterations");
    let grid = full_board(4);
    let config = SolverConfig::default();

    for iterations in [100u64, 400, 1600] {
        group.throughput(Throughput::Elements(iterations));
        group.bench_with_input(
            BenchmarkId::new("7x9", iterations),
            &iterations,
            |b, &iterations| {
                let mut rng = Xoshiro256PlusPlus::seed_from_u64(5);
                b.iter(|| {
                    let mut tree = SearchTree::new(grid.clone(), 0, &config).unwrap();
                    tree.search(&mut rng, |p| p.iterations >= iterations).unwrap()
                })
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_legal_moves,
    bench_rollout,
    bench_search_iterations
);
criterion_main!(benches);
