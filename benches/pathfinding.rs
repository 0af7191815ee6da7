//! A* benchmarks on open and cluttered grids.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use stage_engine::core::Point;
use stage_engine::engine::WalkGrid;

const SIZE: i32 = 64;

fn cluttered_grid(seed: u64) -> WalkGrid {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut grid = WalkGrid::new(SIZE, SIZE, true);
    for y in 0..SIZE {
        for x in 0..SIZE {
            if rng.gen_bool(0.25) {
                grid.set_walkable(Point::new(x, y), false);
            }
        }
    }
    // Keep both corners open
    grid.set_walkable(Point::new(0, 0), true);
    grid.set_walkable(Point::new(SIZE - 1, SIZE - 1), true);
    grid
}

fn bench_open_grid(c: &mut Criterion) {
    let grid = WalkGrid::new(SIZE, SIZE, true);
    let goal = Point::new(SIZE - 1, SIZE - 1);

    c.bench_function("astar_open_diagonal", |b| {
        b.iter(|| grid.find_path(black_box(Point::ZERO), black_box(goal), true))
    });
    c.bench_function("astar_open_orthogonal", |b| {
        b.iter(|| grid.find_path(black_box(Point::ZERO), black_box(goal), false))
    });
}

fn bench_cluttered_grid(c: &mut Criterion) {
    let grid = cluttered_grid(0x5eed);
    let goal = Point::new(SIZE - 1, SIZE - 1);

    c.bench_function("astar_cluttered_diagonal", |b| {
        b.iter(|| grid.find_path(black_box(Point::ZERO), black_box(goal), true))
    });
}

criterion_group!(benches, bench_open_grid, bench_cluttered_grid);
criterion_main!(benches);
